use crate::{
    downloader::part_path,
    error::{Error, Result},
    playlist::Segment,
};
use log::{debug, warn};
use std::{io::ErrorKind, path::Path};
use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt, BufWriter},
};

const FLUSH_EVERY: usize = 10;

/// Concatenate the downloaded segments into `output` in playlist order.
///
/// Returns the number of bytes written.
pub async fn merge(segments: &[Segment], output: &Path) -> Result<u64> {
    let mut order = segments.iter().collect::<Vec<_>>();
    order.sort_by_key(|x| x.index);

    let mut writer = BufWriter::new(File::create(output).await?);
    let mut written = 0;

    for (i, segment) in order.into_iter().enumerate() {
        let path = segment.path.as_ref().ok_or_else(|| {
            Error::Merge(format!("segment {} was never downloaded", segment.index))
        })?;

        let mut file = File::open(path).await.map_err(|x| {
            Error::Merge(format!("couldn't open {} ({})", path.display(), x))
        })?;

        written += io::copy(&mut file, &mut writer).await.map_err(|x| {
            Error::Merge(format!("couldn't read {} ({})", path.display(), x))
        })?;

        if (i + 1) % FLUSH_EVERY == 0 {
            writer.flush().await?;
        }
    }

    writer.flush().await?;
    debug!("Merged {} bytes into {}", written, output.display());
    Ok(written)
}

/// Delete every segment artifact, including unfinished ones.
pub async fn clean(segments: &[Segment]) {
    for path in segments.iter().filter_map(|x| x.path.as_ref()) {
        remove_file(path).await;
        remove_file(&part_path(path)).await;
    }
}

pub(crate) async fn remove_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => (),
        Err(e) if e.kind() == ErrorKind::NotFound => (),
        Err(e) => warn!("Couldn't remove {} ({})", path.display(), e),
    }
}
