use thiserror::Error;

/// The error type returned while resolving, downloading and merging a playlist.
#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't parse playlist: {0}")]
    Manifest(String),

    #[error("couldn't fetch {url} ({reason})")]
    Fetch { url: String, reason: String },

    #[error("couldn't decrypt segment: {0}")]
    Crypto(#[from] hlsdecrypt::Error),

    #[error("couldn't merge segments: {0}")]
    Merge(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("couldn't build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn manifest<T: Into<String>>(reason: T) -> Self {
        Self::Manifest(reason.into())
    }

    pub(crate) fn fetch<T: Into<String>>(url: &url::Url, reason: T) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error was raised while fetching a resource.
    pub fn is_fetch_err(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// A `Result` alias where the `Err` case is `m3u8_dl::Error`.
pub type Result<T> = std::result::Result<T, Error>;
