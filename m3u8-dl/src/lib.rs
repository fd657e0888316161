//! Download HLS (.m3u8) playlists.
//!
//! A playlist is fetched and parsed, master playlists are followed through
//! their highest bandwidth variant, then every transport stream segment is
//! downloaded by a pool of workers, decrypted when needed and merged in
//! playlist order into a single file.

mod args;
mod client;
mod downloader;
mod error;
mod hls;
mod logger;
mod merger;
mod playlist;
mod progress;

pub mod selector;

#[doc(hidden)]
pub use args::Args;
pub use client::{ClientOptions, DEFAULT_USER_AGENT, Fetch, HttpClient};
pub use downloader::{
    Downloader, MAX_DEPTH, default_threads, fetch_playlist, fix, resolve_playlist,
};
pub use error::{Error, Result};
pub use hls::parse;
#[doc(hidden)]
pub use logger::Logger;
pub use merger::{clean, merge};
pub use playlist::{Key, KeyMethod, KeyScope, Playlist, Segment, VariantStream};
pub use progress::Progress;
