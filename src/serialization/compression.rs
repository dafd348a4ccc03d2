use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder};

use crate::error::Result;

/// A reversible transform applied to the canonical bytes of a model.
///
/// The model layout never depends on it, any transform can wrap any layout version.
pub trait Compression {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>>;

    /// Reverts `compress`.
    ///
    /// # Returns
    /// The original bytes or an `Io` error if `bytes` weren't produced by this transform.
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>>;
}

/// Leaves the bytes as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Compression for Identity {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Zlib framed deflate.
#[derive(Debug, Clone, Copy)]
pub struct Deflate {
    level: flate2::Compression,
}

impl Deflate {
    /// Creates a new `Deflate` transform.
    ///
    /// # Arguments
    /// * `level` - The compression level, from 0 (none) to 9 (best).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
        }
    }

    pub fn fast() -> Self {
        Self {
            level: flate2::Compression::fast(),
        }
    }

    pub fn best() -> Self {
        Self {
            level: flate2::Compression::best(),
        }
    }
}

impl Default for Deflate {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
        }
    }
}

impl Compression for Deflate {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 2), self.level);
        encoder.write_all(bytes)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(bytes);
        let mut out = Vec::with_capacity(bytes.len() * 2);
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FfmErr;

    #[test]
    fn deflate_shrinks_repetitive_input() {
        let bytes = vec![7u8; 4096];
        let deflate = Deflate::best();

        let compressed = deflate.compress(&bytes).unwrap();
        assert!(compressed.len() < bytes.len());
        assert_eq!(deflate.decompress(&compressed).unwrap(), bytes);
    }

    #[test]
    fn deflate_rejects_garbage() {
        let res = Deflate::fast().decompress(b"not zlib at all");
        assert!(matches!(res, Err(FfmErr::Io(_))));
    }

    #[test]
    fn identity_keeps_bytes() {
        let bytes = b"FFMS".to_vec();
        assert_eq!(Identity.compress(&bytes).unwrap(), bytes);
        assert_eq!(Identity.decompress(&bytes).unwrap(), bytes);
    }
}
