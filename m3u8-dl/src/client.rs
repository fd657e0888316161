use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

/// Source of playlists, segments and keys.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the whole body of `url`.
    async fn get(&self, url: &Url) -> Result<Bytes>;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Validate site certificates. Off by default so that media hosts with
    /// self-signed or mismatched certificates keep working.
    pub certificate_checks: bool,
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            certificate_checks: false,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// [`Fetch`] implementation backed by a reqwest client.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(!options.certificate_checks)
            .user_agent(&options.user_agent);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get(&self, url: &Url) -> Result<Bytes> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|x| Error::fetch(url, describe_error(&x)))?;

        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            return Err(Error::fetch(url, describe_status(status)));
        }

        response
            .bytes()
            .await
            .map_err(|x| Error::fetch(url, describe_error(&x)))
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        "connection error".to_owned()
    } else if error.is_timeout() {
        "timeout".to_owned()
    } else if let Some(status) = error.status() {
        describe_status(status)
    } else if error.is_body() || error.is_decode() {
        "incomplete response body".to_owned()
    } else {
        error.to_string()
    }
}

fn describe_status(status: StatusCode) -> String {
    match status {
        StatusCode::GATEWAY_TIMEOUT => "gateway timeout".to_owned(),
        StatusCode::REQUEST_TIMEOUT => "timeout".to_owned(),
        StatusCode::SERVICE_UNAVAILABLE => "service unavailable".to_owned(),
        StatusCode::TOO_MANY_REQUESTS => "too many requests".to_owned(),
        x => format!("HTTP {}", x),
    }
}
