//! This crate decrypts media segments of HLS playlists which are encrypted
//! with `#EXT-X-KEY:METHOD=AES-128`.
//!
//! Segments are decrypted with AES in CBC mode and the trailing padding is stripped
//! using the length stored in the last byte. The key size selects the AES variant
//! (128, 192 or 256 bits). When no initialization vector is given the key itself
//! is used as one, which is what many HLS packagers expect when a key directive
//! has no `IV` attribute.
//!
//! ```
//! let key = [7_u8; 16];
//! let data = [0_u8; 16];
//!
//! match hlsdecrypt::decrypt(&data, &key, &[]) {
//!     Ok(plaintext) => println!("{} bytes", plaintext.len()),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

mod error;

pub use error::Error;

use aes::{
    Aes128, Aes192, Aes256,
    cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding},
};

/// A `Result` alias where the `Err` case is `hlsdecrypt::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Block size of AES in bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Decrypt an AES-CBC encrypted segment and strip its padding.
///
/// # Arguments
///
/// * `data` - Encrypted segment, a non-empty multiple of [BLOCK_SIZE] bytes.
/// * `key` - 16, 24 or 32 bytes of key material.
/// * `iv` - Initialization vector. Only the first [BLOCK_SIZE] bytes are used.
///   If empty, the key bytes are used instead.
pub fn decrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    if !matches!(key.len(), 16 | 24 | 32) {
        return Err(Error::InvalidKeySize(key.len()));
    }

    let iv = if iv.is_empty() { key } else { iv };

    if iv.len() < BLOCK_SIZE {
        return Err(Error::InvalidIvSize(iv.len()));
    }

    let iv = &iv[..BLOCK_SIZE];

    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(Error::InvalidDataSize(data.len()));
    }

    let mut buf = data.to_vec();

    match key.len() {
        16 => decrypt_blocks::<Aes128CbcDec>(key, iv, &mut buf)?,
        24 => decrypt_blocks::<Aes192CbcDec>(key, iv, &mut buf)?,
        _ => decrypt_blocks::<Aes256CbcDec>(key, iv, &mut buf)?,
    }

    unpad(&mut buf)?;
    Ok(buf)
}

/// Strip padding whose length is encoded in the last byte.
///
/// The padding bytes themselves are not validated, only that the
/// encoded length fits inside the buffer.
pub fn unpad(data: &mut Vec<u8>) -> Result<()> {
    let len = data.len();
    let padding = match data.last() {
        Some(x) => *x as usize,
        None => return Err(Error::InvalidPadding { padding: 0, len }),
    };

    if padding > len {
        return Err(Error::InvalidPadding { padding, len });
    }

    data.truncate(len - padding);
    Ok(())
}

fn decrypt_blocks<D: KeyIvInit + BlockDecryptMut>(
    key: &[u8],
    iv: &[u8],
    buf: &mut [u8],
) -> Result<()> {
    let len = buf.len();
    D::new_from_slices(key, iv)
        .map_err(|_| Error::InvalidKeySize(key.len()))?
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| Error::InvalidDataSize(len))?;
    Ok(())
}
