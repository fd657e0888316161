use crate::error::{Error, Result};
use serde::Serialize;
use std::{fmt::Display, path::PathBuf, str::FromStr};
use url::Url;

/// A parsed m3u8 document, either a master or a media playlist.
#[derive(Clone, Debug, Serialize)]
pub struct Playlist {
    /// Set when the `#EXTM3U` marker was seen.
    pub is_m3u8: bool,
    pub url: Url,
    /// Scheme and host of [`Playlist::url`], used for root-relative references.
    pub base_url: Url,
    pub version: Option<u64>,
    pub target_duration: Option<u64>,
    pub media_sequence: Option<u64>,
    pub segments: Vec<Segment>,
    pub variants: Vec<VariantStream>,
}

impl Playlist {
    pub fn new(url: Url) -> Self {
        let mut base_url = url.clone();
        base_url.set_path("/");
        base_url.set_query(None);
        base_url.set_fragment(None);

        Self {
            is_m3u8: false,
            url,
            base_url,
            version: None,
            target_duration: None,
            media_sequence: None,
            segments: vec![],
            variants: vec![],
        }
    }

    pub fn is_master(&self) -> bool {
        self.segments.is_empty() && !self.variants.is_empty()
    }

    /// Resolve a reference found inside this playlist to an absolute url.
    ///
    /// Absolute references are kept as is, root-relative references are joined
    /// with [`Playlist::base_url`] and everything else replaces the last path
    /// component of [`Playlist::url`].
    pub fn resolve(&self, reference: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(reference) {
            if !url.cannot_be_a_base() {
                return Ok(url);
            }
        }

        let base = if reference.starts_with('/') {
            &self.base_url
        } else {
            &self.url
        };

        base.join(reference)
            .map_err(|x| Error::manifest(format!("couldn't resolve {} ({})", reference, x)))
    }

    /// Check that this playlist can be downloaded.
    pub fn validate(&self) -> Result<()> {
        if !self.is_m3u8 {
            return Err(Error::manifest(format!(
                "{} is not a m3u8 playlist (#EXTM3U is missing)",
                self.url
            )));
        }

        if self.segments.is_empty() {
            return Err(Error::manifest(format!(
                "{} doesn't contain any segments",
                self.url
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Segment {
    /// Position inside the playlist, the only sort key used while merging.
    pub index: usize,
    pub url: Url,
    /// Where the downloaded segment is stored, assigned right before downloading.
    pub path: Option<PathBuf>,
    pub key: Option<Key>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VariantStream {
    pub bandwidth: u64,
    pub program_id: Option<u64>,
    pub codecs: Option<String>,
    pub resolution: Option<String>,
    /// Unparsed playlist of this variant, only its urls are set.
    pub playlist: Playlist,
}

impl VariantStream {
    pub fn display_stream(&self) -> String {
        let mut extra = format!("bandwidth: {}", self.bandwidth);

        if let Some(resolution) = &self.resolution {
            extra += &format!(", resolution: {}", resolution);
        }

        if let Some(codecs) = &self.codecs {
            extra += &format!(", codecs: {}", codecs);
        }

        format!("{} ({})", self.playlist.url, extra)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum KeyMethod {
    Aes128,
    None,
}

impl FromStr for KeyMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AES-128" => Ok(Self::Aes128),
            "NONE" => Ok(Self::None),
            x => Err(Error::manifest(format!(
                "unsupported key method {:?} (supported: NONE, AES-128)",
                x
            ))),
        }
    }
}

impl Display for KeyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Aes128 => "AES-128",
                Self::None => "NONE",
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Key {
    pub method: KeyMethod,
    pub uri: Option<Url>,
    /// Hex encoded initialization vector, optionally prefixed with `0x`.
    pub iv: Option<String>,
}

impl Key {
    /// Decoded initialization vector, empty when the playlist didn't specify one.
    pub fn iv(&self) -> Result<Vec<u8>> {
        Ok(if let Some(actual_iv) = self.iv.as_ref() {
            let iv = actual_iv
                .strip_prefix("0x")
                .or_else(|| actual_iv.strip_prefix("0X"))
                .unwrap_or(actual_iv);
            u128::from_str_radix(iv, 16)
                .map_err(|_| Error::manifest(format!("invalid iv {}", actual_iv)))?
                .to_be_bytes()
                .to_vec()
        } else {
            vec![]
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.method != KeyMethod::None
    }
}

/// Which segments a `#EXT-X-KEY` directive applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum KeyScope {
    /// Only the segment right after the directive.
    #[default]
    NextSegment,
    /// Every following segment until another directive replaces it.
    UntilReplaced,
}
