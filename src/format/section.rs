//! Named, length-prefixed sections inside a container payload.
//!
//! ```text
//! +----------------------+
//! | Name                 |  fstring
//! | Element count        |  i32
//! | Byte size            |  i32 (size of the body that follows)
//! +----------------------+
//! | Body                 |  byte size bytes
//! +----------------------+
//! ```
//!
//! Recognized sections are decoded record by record, driven by the element
//! count, and must end exactly where the byte size says. Unrecognized
//! sections are skipped by byte size.

use super::constants::*;
use super::reader::ByteReader;
use crate::util::{Error, Result};

/// Header of one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: String,
    pub element_count: usize,
    pub byte_size: usize,
    /// Offset of the section header within the payload.
    pub offset: usize,
    /// Offset of the first body byte.
    pub body_start: usize,
}

impl SectionHeader {
    /// Read a section header at the reader's cursor.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let offset = reader.pos();
        let name = reader.read_fstring()?;
        let element_count = reader.read_len()?;
        let byte_size = reader.read_len()?;
        Ok(Self {
            name,
            element_count,
            byte_size,
            offset,
            body_start: reader.pos(),
        })
    }

    /// Offset one past the last body byte.
    #[inline]
    pub fn end(&self) -> usize {
        self.body_start + self.byte_size
    }
}

/// Outcome of handing a section to a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler decoded the body.
    Consumed,
    /// The handler does not know this section; skip it by byte size.
    Skipped,
}

/// Iterates the sections of one payload.
pub struct SectionStream<'r, 'a> {
    reader: &'r mut ByteReader<'a>,
    kind: ContainerKind,
}

impl<'r, 'a> SectionStream<'r, 'a> {
    /// Stream sections from the reader's cursor to the end of its buffer.
    pub fn new(reader: &'r mut ByteReader<'a>, kind: ContainerKind) -> Self {
        Self { reader, kind }
    }

    /// Run `handler` on every section until end of payload.
    ///
    /// Returns the number of sections visited. Errors raised while a section
    /// is being decoded carry the container kind, section name and offset.
    pub fn for_each<F>(self, mut handler: F) -> Result<usize>
    where
        F: FnMut(&mut ByteReader<'a>, &SectionHeader) -> Result<Dispatch>,
    {
        let Self { reader, kind } = self;
        let mut visited = 0;

        while !reader.eof() {
            let header = SectionHeader::read(reader)?;
            let result = match handler(reader, &header) {
                Ok(Dispatch::Consumed) => {
                    if reader.pos() == header.end() {
                        Ok(())
                    } else {
                        Err(Error::SectionSkipMismatch {
                            section: header.name.clone(),
                            expected: header.end(),
                            actual: reader.pos(),
                        })
                    }
                }
                Ok(Dispatch::Skipped) => {
                    tracing::debug!(
                        kind = %kind,
                        section = %header.name,
                        bytes = header.byte_size,
                        "skipping unknown section"
                    );
                    reader.skip(header.byte_size)
                }
                Err(e) => Err(e),
            };

            result.map_err(|source| Error::Section {
                kind: kind.identifier().to_string(),
                section: header.name.clone(),
                offset: header.offset,
                source: Box::new(source),
            })?;
            visited += 1;
        }

        Ok(visited)
    }
}

/// Sections understood by the model decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSection {
    Vertices,
    Indices,
    Normals,
    Tangents,
    VertexColors,
    TexCoords,
    Materials,
    Weights,
    Bones,
    MorphTargets,
    Sockets,
    Unknown(String),
}

impl ModelSection {
    pub fn from_name(name: &str) -> Self {
        match name {
            SECTION_VERTICES => Self::Vertices,
            SECTION_INDICES => Self::Indices,
            SECTION_NORMALS => Self::Normals,
            SECTION_TANGENTS => Self::Tangents,
            SECTION_VERTEX_COLORS => Self::VertexColors,
            SECTION_TEXCOORDS => Self::TexCoords,
            SECTION_MATERIALS => Self::Materials,
            SECTION_WEIGHTS => Self::Weights,
            SECTION_BONES => Self::Bones,
            SECTION_MORPH_TARGETS => Self::MorphTargets,
            SECTION_SOCKETS => Self::Sockets,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Sections understood by the animation decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnimSection {
    Tracks,
    Curves,
    Unknown(String),
}

impl AnimSection {
    pub fn from_name(name: &str) -> Self {
        match name {
            SECTION_TRACKS => Self::Tracks,
            SECTION_CURVES => Self::Curves,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Sections understood by the world decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldSection {
    Meshes,
    Actors,
    Unknown(String),
}

impl WorldSection {
    pub fn from_name(name: &str) -> Self {
        match name {
            SECTION_MESHES => Self::Meshes,
            SECTION_ACTORS => Self::Actors,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::writer::ByteWriter;

    fn payload() -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.section("COUNTS", 2, |w| {
            w.write_u32(7)?;
            w.write_u32(9)
        })
        .unwrap();
        w.raw_section("FUTURE", 3, &[0xAA; 13]).unwrap();
        w.section("COUNTS", 1, |w| w.write_u32(11)).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_unknown_sections_skipped_by_byte_size() {
        let bytes = payload();
        let mut reader = ByteReader::new(&bytes);
        let mut values = Vec::new();
        let mut skipped_end = None;

        let visited = SectionStream::new(&mut reader, ContainerKind::Model)
            .for_each(|r, header| match header.name.as_str() {
                "COUNTS" => {
                    values.extend(r.read_array(header.element_count, |r| r.read_u32())?);
                    Ok(Dispatch::Consumed)
                }
                _ => {
                    skipped_end = Some(header.end());
                    Ok(Dispatch::Skipped)
                }
            })
            .unwrap();

        assert_eq!(visited, 3);
        assert_eq!(values, vec![7, 9, 11]);
        // The skipped body is exactly its declared size.
        let end = skipped_end.unwrap();
        assert_eq!(&bytes[end - 13..end], &[0xAA; 13]);
        assert!(reader.eof());
    }

    #[test]
    fn test_short_handler_is_mismatch() {
        let bytes = payload();
        let mut reader = ByteReader::new(&bytes);

        let err = SectionStream::new(&mut reader, ContainerKind::Model)
            .for_each(|r, _header| {
                // Only read one element although two are declared.
                r.read_u32()?;
                Ok(Dispatch::Consumed)
            })
            .unwrap_err();

        assert_eq!(err.section(), Some("COUNTS"));
        assert!(matches!(err.root(), Error::SectionSkipMismatch { .. }));
    }

    #[test]
    fn test_eof_inside_section_has_context() {
        let mut bytes = payload();
        bytes.truncate(bytes.len() - 2);
        let mut reader = ByteReader::new(&bytes);

        let err = SectionStream::new(&mut reader, ContainerKind::Anim)
            .for_each(|r, header| {
                if header.name == "COUNTS" {
                    r.read_array(header.element_count, |r| r.read_u32())?;
                    Ok(Dispatch::Consumed)
                } else {
                    Ok(Dispatch::Skipped)
                }
            })
            .unwrap_err();

        match &err {
            Error::Section { kind, section, .. } => {
                assert_eq!(kind, "UEANIM");
                assert_eq!(section, "COUNTS");
            }
            other => panic!("expected section context, got {other:?}"),
        }
        assert!(matches!(err.root(), Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_section_enums() {
        assert_eq!(ModelSection::from_name("TEXCOORDS"), ModelSection::TexCoords);
        assert_eq!(ModelSection::from_name("LODS"), ModelSection::Unknown("LODS".into()));
        assert_eq!(AnimSection::from_name("CURVES"), AnimSection::Curves);
        assert_eq!(WorldSection::from_name("ACTORS"), WorldSection::Actors);
    }
}
