use crate::{
    client::Fetch,
    error::{Error, Result},
    hls,
    playlist::{KeyScope, Playlist},
    selector,
};
use log::{debug, info};
use url::Url;

/// Deepest chain of master playlists followed before giving up.
pub const MAX_DEPTH: usize = 8;

/// Fetch and parse a single playlist. Playlist fetches are never retried.
pub async fn fetch_playlist(
    fetcher: &dyn Fetch,
    url: &Url,
    key_scope: KeyScope,
) -> Result<Playlist> {
    debug!("Fetching playlist {}", url);
    let body = fetcher.get(url).await?;
    hls::parse(url, &String::from_utf8_lossy(&body), key_scope)
}

/// Fetch `url` and follow the highest bandwidth variant of every master
/// playlist until a playlist with segments is reached.
pub async fn resolve_playlist(
    fetcher: &dyn Fetch,
    url: &Url,
    key_scope: KeyScope,
) -> Result<Playlist> {
    let mut playlist = fetch_playlist(fetcher, url, key_scope).await?;

    for _ in 0..MAX_DEPTH {
        if !playlist.is_master() {
            return Ok(playlist);
        }

        let variant = selector::highest_bandwidth(&playlist.variants).ok_or_else(|| {
            Error::manifest(format!("{} doesn't list any variant streams", playlist.url))
        })?;

        info!("Selected variant {}", variant.display_stream());
        let url = variant.playlist.url.clone();
        playlist = fetch_playlist(fetcher, &url, key_scope).await?;
    }

    if playlist.is_master() {
        return Err(Error::manifest(format!(
            "variant streams are nested deeper than {} levels",
            MAX_DEPTH
        )));
    }

    Ok(playlist)
}
