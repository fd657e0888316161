use crate::{
    client::{ClientOptions, DEFAULT_USER_AGENT, HttpClient},
    downloader::{Downloader, default_threads},
    playlist::KeyScope,
};
use anyhow::{Context, Result, bail};
use clap::{ColorChoice, Parser};
use log::{LevelFilter, error, warn};
use std::{
    io::{IsTerminal, stderr},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Download HLS (.m3u8) playlists and merge their segments into a single file.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Args {
    /// Url of a master or media playlist.
    #[arg(short, long)]
    pub url: String,

    /// Directory for the merged file and temporarily downloaded segments.
    #[arg(short, long, default_value = "./downloads")]
    pub output_path: PathBuf,

    /// File name of the merged output (eg. video.ts).
    /// Required unless --parse is used.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Resolve the playlist and print it in json format without downloading it.
    #[arg(long)]
    pub parse: bool,

    /// Maximum number of segments downloaded in parallel.
    #[arg(short, long, help_heading = "Download Options", default_value_t = default_threads())]
    pub threads: usize,

    /// Maximum number of attempts to download an individual segment.
    #[arg(long, help_heading = "Download Options", default_value_t = 3)]
    pub retry_count: u8,

    /// Apply a #EXT-X-KEY tag to every following segment until the next one,
    /// instead of only to the segment right after it.
    #[arg(long, help_heading = "Download Options")]
    pub sticky_keys: bool,

    /// Check and validate site certificates.
    /// They are not checked by default since many media hosts use self-signed ones.
    #[arg(long, help_heading = "Client Options")]
    pub certificate_checks: bool,

    /// Timeout of a single request in seconds.
    #[arg(long, help_heading = "Client Options", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Update and set user agent header for requests.
    #[arg(long, help_heading = "Client Options", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// When to output colored text.
    #[arg(long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Show debug logs.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    pub fn colored(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Auto => stderr().is_terminal(),
            ColorChoice::Never => false,
        }
    }

    pub async fn execute(self) -> Result<()> {
        let url = self.url.trim();

        if url.is_empty() {
            bail!("playlist url is empty.");
        }

        let name = self.name.as_deref().map(str::trim).unwrap_or_default();

        if !self.parse && name.is_empty() {
            bail!("output name is empty, set it using --name flag.");
        }

        let url = url
            .parse::<Url>()
            .with_context(|| format!("{} is not a valid url.", url))?;

        let client = HttpClient::new(&ClientOptions {
            certificate_checks: self.certificate_checks,
            timeout: self.timeout.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        })?;

        let downloader = Downloader::new(Arc::new(client), url)
            .directory(&self.output_path)
            .name(name)
            .threads(self.threads)
            .retries(self.retry_count)
            .key_scope(if self.sticky_keys {
                KeyScope::UntilReplaced
            } else {
                KeyScope::NextSegment
            })
            .progress(!self.quiet && stderr().is_terminal());

        if self.parse {
            let playlist = downloader.resolve().await?;
            println!("{}", serde_json::to_string_pretty(&playlist)?);
            return Ok(());
        }

        let cancel = CancellationToken::new();
        tokio::spawn(interrupt(cancel.clone()));
        downloader.execute(cancel).await?;
        Ok(())
    }
}

async fn interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() && !cancel.is_cancelled() {
        warn!("Ctrl+C received, stopping gracefully.");
        cancel.cancel();
    }

    if tokio::signal::ctrl_c().await.is_ok() {
        error!("Ctrl+C received, force exiting.");
        std::process::exit(1);
    }
}
