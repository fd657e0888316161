#![allow(dead_code)]

use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use async_trait::async_trait;
use bytes::Bytes;
use m3u8_dl::{Error, Fetch, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

pub const BASE: &str = "https://media.example.com";

pub fn url(path: &str) -> Url {
    format!("{}{}", BASE, path).parse().unwrap()
}

struct Response {
    body: Bytes,
    delay: Duration,
    /// Number of requests answered with an error before `body` is served.
    failures: usize,
}

/// In-memory [`Fetch`] serving registered urls and counting requests.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<Url, Response>>>,
    calls: Arc<Mutex<HashMap<Url, usize>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, body: impl Into<Bytes>) -> Self {
        self.insert(path, body.into(), Duration::ZERO, 0)
    }

    pub fn with_delay(self, path: &str, body: impl Into<Bytes>, delay: Duration) -> Self {
        self.insert(path, body.into(), delay, 0)
    }

    /// Fail the first `failures` requests of `path`.
    pub fn flaky(self, path: &str, body: impl Into<Bytes>, failures: usize) -> Self {
        self.insert(path, body.into(), Duration::ZERO, failures)
    }

    pub fn failing(self, path: &str) -> Self {
        self.insert(path, Bytes::new(), Duration::ZERO, usize::MAX)
    }

    fn insert(self, path: &str, body: Bytes, delay: Duration, failures: usize) -> Self {
        self.responses.lock().unwrap().insert(
            url(path),
            Response {
                body,
                delay,
                failures,
            },
        );
        self
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&url(path))
            .copied()
            .unwrap_or_default()
    }

    pub fn into_fetcher(self) -> Arc<dyn Fetch> {
        Arc::new(self)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn get(&self, url: &Url) -> Result<Bytes> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.clone()).or_default();
            *count += 1;
            *count
        };

        let (body, delay, failures) = match self.responses.lock().unwrap().get(url) {
            Some(x) => (x.body.clone(), x.delay, x.failures),
            None => {
                return Err(Error::Fetch {
                    url: url.to_string(),
                    reason: "HTTP 404 Not Found".to_owned(),
                });
            }
        };

        tokio::time::sleep(delay).await;

        if attempt <= failures {
            return Err(Error::Fetch {
                url: url.to_string(),
                reason: "connection error".to_owned(),
            });
        }

        Ok(body)
    }
}

/// Transport stream looking payload, starting with a sync byte.
pub fn ts_payload(index: u8, len: usize) -> Vec<u8> {
    let mut data = vec![index; len];
    data[0] = 0x47;
    data
}

pub fn encrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    let len = buf.len();
    buf.resize(len + 16 - len % 16, 0);

    cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
        .unwrap()
        .encrypt_padded_mut::<Pkcs7>(&mut buf, len)
        .unwrap()
        .to_vec()
}

/// Names of every file left in `dir`.
pub fn files(dir: &std::path::Path) -> Vec<String> {
    let mut names = std::fs::read_dir(dir)
        .unwrap()
        .map(|x| x.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}
