mod encryption;
mod fetch;
pub mod fix;
mod stream;

pub use fetch::{MAX_DEPTH, fetch_playlist, resolve_playlist};
pub(crate) use stream::part_path;

use crate::{
    client::Fetch,
    error::{Error, Result},
    merger,
    playlist::{KeyScope, Playlist},
    progress::Progress,
};
use encryption::KeyCache;
use log::info;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use stream::Context;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Downloads a HLS playlist and merges its segments into a single file.
///
/// ```no_run
/// use m3u8_dl::{ClientOptions, Downloader, HttpClient};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> m3u8_dl::Result<()> {
/// let client = HttpClient::new(&ClientOptions::default())?;
/// let output = Downloader::new(Arc::new(client), "https://example.com/index.m3u8".parse().unwrap())
///     .name("video.ts")
///     .threads(8)
///     .execute(CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Downloader {
    fetcher: Arc<dyn Fetch>,
    url: Url,
    directory: PathBuf,
    name: String,
    threads: usize,
    retries: u8,
    key_scope: KeyScope,
    progress: bool,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetch>, url: Url) -> Self {
        Self {
            fetcher,
            url,
            directory: PathBuf::from("downloads"),
            name: "output.ts".to_owned(),
            threads: default_threads(),
            retries: 3,
            key_scope: KeyScope::default(),
            progress: false,
        }
    }

    /// Directory holding the segment artifacts and the merged output.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// File name of the merged output, also used as prefix of segment artifacts.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Maximum number of attempts to fetch an individual segment.
    pub fn retries(mut self, retries: u8) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn key_scope(mut self, key_scope: KeyScope) -> Self {
        self.key_scope = key_scope;
        self
    }

    /// Draw a progress line on stderr while downloading.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch the playlist and descend into variant streams until a playlist
    /// with segments is reached.
    pub async fn resolve(&self) -> Result<Playlist> {
        resolve_playlist(self.fetcher.as_ref(), &self.url, self.key_scope).await
    }

    /// Download, decrypt and merge every segment. Returns the path of the
    /// merged output.
    ///
    /// Segment artifacts are always removed afterwards, the output is removed
    /// too if anything failed.
    pub async fn execute(self, cancel: CancellationToken) -> Result<PathBuf> {
        if self.name.is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "output name is empty",
            )));
        }

        info!("Resolving {}", self.url);

        let mut playlist = tokio::select! {
            playlist = self.resolve() => playlist?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        playlist.validate()?;

        fs::create_dir_all(&self.directory).await?;

        for segment in &mut playlist.segments {
            segment.path = Some(
                self.directory
                    .join(format!("{}_{:05}.ts", self.name, segment.index)),
            );
        }

        let output = self.directory.join(&self.name);
        let result = self.download(&playlist, &output, &cancel).await;

        info!("Cleaning up segment files");
        merger::clean(&playlist.segments).await;

        match result {
            Ok(bytes) => {
                info!("Saved {} bytes to {}", bytes, output.display());
                Ok(output)
            }
            Err(e) => {
                merger::remove_file(&output).await;
                Err(e)
            }
        }
    }

    async fn download(
        &self,
        playlist: &Playlist,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let total = playlist.segments.len();
        let threads = self.threads.min(total);

        info!("Downloading {} segments using {} threads", total, threads);

        let ctx = Arc::new(Context {
            fetcher: self.fetcher.clone(),
            keys: KeyCache::default(),
            progress: Progress::new(total, self.progress),
            retries: self.retries,
        });

        stream::download_segments(ctx, &playlist.segments, threads, cancel).await?;

        info!("Merging segments into {}", output.display());
        merger::merge(&playlist.segments, output).await
    }
}

/// Five workers per available processing unit.
pub fn default_threads() -> usize {
    (num_cpus::get() * 5).max(1)
}
