use super::{encryption::KeyCache, fix};
use crate::{
    client::Fetch,
    error::{Error, Result},
    playlist::{Key, Segment},
    progress::Progress,
};
use bytes::Bytes;
use kanal::AsyncReceiver;
use log::{debug, error};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio::{fs, task::JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared state of one download run.
pub(crate) struct Context {
    pub(crate) fetcher: Arc<dyn Fetch>,
    pub(crate) keys: KeyCache,
    pub(crate) progress: Progress,
    pub(crate) retries: u8,
}

struct Job {
    index: usize,
    url: Url,
    key: Option<Key>,
    path: PathBuf,
}

impl Job {
    fn new(segment: &Segment) -> Result<Self> {
        Ok(Self {
            index: segment.index,
            url: segment.url.clone(),
            key: segment.key.clone(),
            path: segment.path.clone().ok_or_else(|| {
                Error::Merge(format!("segment {} has no destination path", segment.index))
            })?,
        })
    }
}

/// Temporary name used while a segment is being written.
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

/// Download every segment to its destination path using `threads` workers.
///
/// The first failing worker stops the others from taking new segments and its
/// error is returned. Cancelling `cancel` stops the workers the same way.
pub(crate) async fn download_segments(
    ctx: Arc<Context>,
    segments: &[Segment],
    threads: usize,
    cancel: &CancellationToken,
) -> Result<()> {
    let (tx, rx) = kanal::unbounded_async();

    for segment in segments {
        tx.send(Job::new(segment)?)
            .await
            .map_err(|_| Error::Cancelled)?;
    }

    drop(tx);

    let stop = cancel.child_token();
    let failure = Arc::new(Mutex::new(None));
    let threads = threads.clamp(1, segments.len().max(1));
    let mut set = JoinSet::new();

    for id in 0..threads {
        set.spawn(worker(
            id,
            ctx.clone(),
            rx.clone(),
            stop.clone(),
            failure.clone(),
        ));
    }

    drop(rx);

    let mut finished = 0;

    while let Some(result) = set.join_next().await {
        finished += 1;

        if let Err(e) = result {
            error!("Worker crashed: {}", e);
            record_failure(&failure, Error::Io(std::io::Error::other(e.to_string())));
            stop.cancel();
        }
    }

    debug!("{}/{} workers finished", finished, threads);

    if let Some(e) = failure.lock().unwrap_or_else(|x| x.into_inner()).take() {
        return Err(e);
    }

    if stop.is_cancelled() {
        return Err(Error::Cancelled);
    }

    Ok(())
}

async fn worker(
    id: usize,
    ctx: Arc<Context>,
    rx: AsyncReceiver<Job>,
    stop: CancellationToken,
    failure: Arc<Mutex<Option<Error>>>,
) {
    while !stop.is_cancelled() {
        // Every job is queued before the workers start, so this only waits
        // when the queue is drained and closed.
        let Ok(job) = rx.recv().await else {
            break;
        };

        if let Err(e) = ctx.execute(&job).await {
            debug!("Worker {} failed on segment {}: {}", id, job.index, e);
            record_failure(&failure, e);
            stop.cancel();
            break;
        }
    }

    debug!("Worker {} stopped", id);
}

fn record_failure(failure: &Mutex<Option<Error>>, error: Error) {
    let mut failure = failure.lock().unwrap_or_else(|x| x.into_inner());

    if failure.is_none() {
        *failure = Some(error);
    }
}

impl Context {
    async fn execute(&self, job: &Job) -> Result<()> {
        let data = self.segment(&job.url).await?;
        let data = self
            .keys
            .decrypt(self.fetcher.as_ref(), job.key.as_ref(), data)
            .await?;
        let data = fix::align_sync_byte(&data);

        let part = part_path(&job.path);
        fs::write(&part, data).await?;
        fs::rename(&part, &job.path).await?;

        self.progress.update(data.len());
        Ok(())
    }

    async fn segment(&self, url: &Url) -> Result<Bytes> {
        let retries = self.retries.max(1);
        let mut attempt = 1;

        loop {
            match self.fetcher.get(url).await {
                Ok(data) => return Ok(data),
                Err(e) if attempt < retries => {
                    debug!("Attempt {}/{} failed: {}", attempt, retries, e);
                    attempt += 1;
                }
                Err(e) => {
                    debug!("Attempt {}/{} failed: {}", attempt, retries, e);
                    return Err(e);
                }
            }
        }
    }
}
