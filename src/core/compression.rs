//! Compression support for UEFormat payloads.
//!
//! A container may compress everything after its header with one of two
//! codecs, named by a string in the header: `GZIP` or `ZSTD`.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::util::{Error, Result};

/// Header name of the gzip codec.
pub const GZIP_NAME: &str = "GZIP";

/// Header name of the zstd codec.
pub const ZSTD_NAME: &str = "ZSTD";

/// Payload compression codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionAlgorithm {
    Gzip,
    Zstd,
}

impl CompressionAlgorithm {
    /// Look up a codec by its header name.
    ///
    /// Names are matched exactly. `ZSTD` is only recognized when the crate is
    /// built with the `zstd` feature.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            GZIP_NAME => Ok(Self::Gzip),
            #[cfg(feature = "zstd")]
            ZSTD_NAME => Ok(Self::Zstd),
            other => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }

    /// Name written into container headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => GZIP_NAME,
            Self::Zstd => ZSTD_NAME,
        }
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inflate `data` with the given codec.
///
/// `size_hint` only sizes the output buffer; the result is whatever the codec
/// produces.
pub fn decompress(algorithm: CompressionAlgorithm, data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let wrap = |source: std::io::Error| Error::Decompression {
        algorithm: algorithm.as_str().to_string(),
        source,
    };

    // Declared sizes come from untrusted input; don't let them drive a huge allocation.
    let capacity = size_hint.min(data.len().saturating_mul(16));

    match algorithm {
        CompressionAlgorithm::Gzip => {
            // Concatenated gzip members inflate to the concatenation of their contents.
            let mut decoder = MultiGzDecoder::new(data);
            let mut out = Vec::with_capacity(capacity);
            decoder.read_to_end(&mut out).map_err(wrap)?;
            Ok(out)
        }
        CompressionAlgorithm::Zstd => zstd_decompress(data, capacity).map_err(wrap),
    }
}

/// Deflate `data` with the given codec.
///
/// `level` follows each codec's own scale; out-of-range values are clamped.
pub fn compress(algorithm: CompressionAlgorithm, data: &[u8], level: i32) -> Result<Vec<u8>> {
    match algorithm {
        CompressionAlgorithm::Gzip => {
            let level = Compression::new(level.clamp(0, 9) as u32);
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionAlgorithm::Zstd => Ok(zstd_compress(data, level)?),
    }
}

#[cfg(feature = "zstd")]
fn zstd_decompress(data: &[u8], capacity: usize) -> std::io::Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::new(data)?;
    let mut out = Vec::with_capacity(capacity);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(not(feature = "zstd"))]
fn zstd_decompress(_data: &[u8], _capacity: usize) -> std::io::Result<Vec<u8>> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "built without the zstd feature",
    ))
}

#[cfg(feature = "zstd")]
fn zstd_compress(data: &[u8], level: i32) -> std::io::Result<Vec<u8>> {
    zstd::stream::encode_all(data, level.clamp(1, 22))
}

#[cfg(not(feature = "zstd"))]
fn zstd_compress(_data: &[u8], _level: i32) -> std::io::Result<Vec<u8>> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "built without the zstd feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_compress_decompress() {
        let original = b"VERTICES VERTICES VERTICES ".repeat(100);

        let compressed = compress(CompressionAlgorithm::Gzip, &original, 6).unwrap();
        assert!(compressed.len() < original.len());

        let decompressed = decompress(CompressionAlgorithm::Gzip, &compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_zstd_compress_decompress() {
        let original = b"BONES MORPHTARGETS SOCKETS ".repeat(64);

        let compressed = compress(CompressionAlgorithm::Zstd, &original, 3).unwrap();
        let decompressed = decompress(CompressionAlgorithm::Zstd, &compressed, 0).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_size_hint_is_advisory() {
        let original = b"short".to_vec();
        let compressed = compress(CompressionAlgorithm::Gzip, &original, 6).unwrap();

        // A wildly wrong declared size must not change the result.
        let decompressed = decompress(CompressionAlgorithm::Gzip, &compressed, 1 << 30).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_gzip_multiple_members() {
        let first = b"VERTICES".repeat(8);
        let second = b"INDICES".repeat(8);
        let mut stream = compress(CompressionAlgorithm::Gzip, &first, 6).unwrap();
        stream.extend(compress(CompressionAlgorithm::Gzip, &second, 1).unwrap());

        let decompressed = decompress(CompressionAlgorithm::Gzip, &stream, 0).unwrap();
        assert_eq!(decompressed, [first, second].concat());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = CompressionAlgorithm::from_name("LZMA").unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(name) if name == "LZMA"));

        // Matching is exact.
        assert!(CompressionAlgorithm::from_name("gzip").is_err());
    }

    #[test]
    fn test_corrupt_gzip_reports_codec() {
        let err = decompress(CompressionAlgorithm::Gzip, b"definitely not gzip", 0).unwrap_err();
        assert!(matches!(err, Error::Decompression { ref algorithm, .. } if algorithm == "GZIP"));
    }
}
