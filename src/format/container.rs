//! Container envelope parsing.
//!
//! ```text
//! +----------------------+
//! | Magic: "UEFORMAT"    |  8 bytes
//! +----------------------+
//! | Kind identifier      |  fstring ("UEMODEL" | "UEANIM" | "UEWORLD")
//! +----------------------+
//! | Version              |  u8
//! +----------------------+
//! | Object name          |  fstring
//! +----------------------+
//! | Compressed flag      |  bool
//! +----------------------+
//! | [Algorithm]          |  fstring, only when compressed
//! | [Uncompressed size]  |  u32
//! | [Compressed size]    |  u32
//! +----------------------+
//! | Payload              |  sections (possibly compressed)
//! +----------------------+
//! ```

use std::borrow::Cow;

use super::constants::{ContainerKind, MAGIC};
use super::reader::ByteReader;
use crate::core::{decompress, CompressionAlgorithm};
use crate::util::{Error, Result};

/// Compression block of a container header.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CompressionInfo {
    /// Codec name as stored in the header.
    pub algorithm: String,
    /// Declared inflated size. Advisory only.
    pub uncompressed_size: u32,
    /// Declared deflated size. Advisory only.
    pub compressed_size: u32,
}

/// Parsed container header.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContainerHeader {
    pub kind: ContainerKind,
    /// Format version byte; carried but not interpreted.
    pub version: u8,
    pub object_name: String,
    pub compression: Option<CompressionInfo>,
}

impl ContainerHeader {
    /// Check if the payload was stored compressed.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Read the header fields, leaving `reader` at the first payload byte.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        if reader.remaining() < MAGIC.len() {
            return Err(Error::envelope(format!(
                "buffer of {} bytes is too short for the magic",
                reader.remaining()
            )));
        }
        let magic = reader.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(Error::envelope(format!(
                "expected magic {:?}, found {:?}",
                String::from_utf8_lossy(MAGIC),
                String::from_utf8_lossy(magic)
            )));
        }

        let identifier = reader.read_fstring()?;
        let kind = ContainerKind::from_identifier(&identifier)
            .ok_or_else(|| Error::envelope(format!("unknown container kind {identifier:?}")))?;
        let version = reader.read_u8()?;
        let object_name = reader.read_fstring()?;

        let compression = if reader.read_bool()? {
            Some(CompressionInfo {
                algorithm: reader.read_fstring()?,
                uncompressed_size: reader.read_u32()?,
                compressed_size: reader.read_u32()?,
            })
        } else {
            None
        };

        Ok(Self { kind, version, object_name, compression })
    }
}

/// A parsed container: header plus the (inflated) section payload.
#[derive(Clone, Debug)]
pub struct Container<'a> {
    header: ContainerHeader,
    payload: Cow<'a, [u8]>,
}

impl<'a> Container<'a> {
    /// Parse the envelope and inflate the payload if needed.
    ///
    /// Uncompressed payloads borrow from `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let header = ContainerHeader::read(&mut reader)?;

        let payload = match &header.compression {
            None => Cow::Borrowed(reader.read_to_end()),
            Some(info) => {
                let algorithm = CompressionAlgorithm::from_name(&info.algorithm)?;
                let compressed = reader.read_to_end();
                if compressed.len() != info.compressed_size as usize {
                    tracing::debug!(
                        object = %header.object_name,
                        declared = info.compressed_size,
                        actual = compressed.len(),
                        "compressed size differs from header"
                    );
                }

                let inflated = decompress(algorithm, compressed, info.uncompressed_size as usize)?;
                if inflated.len() != info.uncompressed_size as usize {
                    tracing::debug!(
                        object = %header.object_name,
                        declared = info.uncompressed_size,
                        actual = inflated.len(),
                        "uncompressed size differs from header"
                    );
                }
                Cow::Owned(inflated)
            }
        };

        tracing::debug!(
            kind = %header.kind,
            object = %header.object_name,
            version = header.version,
            compressed = header.is_compressed(),
            payload_len = payload.len(),
            "parsed container"
        );

        Ok(Self { header, payload })
    }

    /// Container header.
    #[inline]
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Container kind.
    #[inline]
    pub fn kind(&self) -> ContainerKind {
        self.header.kind
    }

    /// Object name stored in the header.
    #[inline]
    pub fn object_name(&self) -> &str {
        &self.header.object_name
    }

    /// Decompressed payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Reader positioned at the start of the payload.
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.payload)
    }
}
