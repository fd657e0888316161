use crate::{
    client::Fetch,
    error::{Error, Result},
    playlist::Key,
};
use bytes::Bytes;
use log::debug;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::OnceCell;
use url::Url;

/// Key material shared between workers, fetched at most once per url.
///
/// Each url owns its own cell so fetches of different keys run in parallel,
/// while workers waiting on the same key share a single request.
#[derive(Default)]
pub(crate) struct KeyCache {
    keys: Mutex<HashMap<Url, Arc<OnceCell<Bytes>>>>,
}

impl KeyCache {
    /// Key fetches are never retried.
    async fn fetch(&self, fetcher: &dyn Fetch, url: &Url) -> Result<Bytes> {
        let cell = self
            .keys
            .lock()
            .unwrap_or_else(|x| x.into_inner())
            .entry(url.clone())
            .or_default()
            .clone();

        cell.get_or_try_init(|| async {
            debug!("Fetching key {}", url);
            fetcher.get(url).await
        })
        .await
        .cloned()
    }

    /// Decrypt `data` if `key` requires it, otherwise return it untouched.
    pub(crate) async fn decrypt(
        &self,
        fetcher: &dyn Fetch,
        key: Option<&Key>,
        data: Bytes,
    ) -> Result<Bytes> {
        let Some(key) = key.filter(|x| x.is_encrypted()) else {
            return Ok(data);
        };

        let url = key
            .uri
            .as_ref()
            .ok_or_else(|| Error::manifest(format!("{} key has no uri", key.method)))?;
        let key_bytes = self.fetch(fetcher, url).await?;
        let plaintext = hlsdecrypt::decrypt(&data, &key_bytes, &key.iv()?)?;
        Ok(Bytes::from(plaintext))
    }
}
