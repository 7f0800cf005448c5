//! Error types for the UEFormat library.

use thiserror::Error;

/// Main error type for decoding and encoding UEFormat containers.
///
/// Every variant is terminal for the decode call that produced it. Soft
/// problems (unresolved socket parents, weights pointing at missing bones)
/// never surface here; they are logged and the affected entity is dropped.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad magic bytes or unknown container kind
    #[error("Malformed container envelope: {0}")]
    MalformedEnvelope(String),

    /// Compression algorithm named in the header is not supported
    #[error("Unsupported compression algorithm: {0:?}")]
    UnsupportedCompression(String),

    /// Read past the end of the buffer
    #[error("Unexpected end of data at offset {offset}: need {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A recognized section did not end where its header said it would
    #[error("Section {section} ended at offset {actual}, header implies {expected}")]
    SectionSkipMismatch {
        section: String,
        expected: usize,
        actual: usize,
    },

    /// Bone parent index is a forward reference, a self reference or out of range
    #[error("Malformed bone hierarchy: bone {index} ({bone:?}) has parent index {parent}")]
    MalformedHierarchy {
        bone: String,
        index: usize,
        parent: i32,
    },

    /// World actor references a mesh hash that no embedded mesh carries
    #[error("Actor {actor:?} references unknown mesh hash {hash:#010x}")]
    DanglingMeshReference { actor: String, hash: u32 },

    /// Invalid data structure inside a section
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Codec failed to inflate the payload
    #[error("{algorithm} decompression failed: {source}")]
    Decompression {
        algorithm: String,
        #[source]
        source: std::io::Error,
    },

    /// Error raised while decoding a particular section
    #[error("{kind} section {section} at offset {offset}: {source}")]
    Section {
        kind: String,
        section: String,
        offset: usize,
        #[source]
        source: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a malformed envelope error.
    pub fn envelope(msg: impl Into<String>) -> Self {
        Self::MalformedEnvelope(msg.into())
    }

    /// Strip section context and return the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Self::Section { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the innermost section this error was raised in, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Section { section, source, .. } => {
                source.section().or(Some(section.as_str()))
            }
            _ => None,
        }
    }
}

/// Result type alias for UEFormat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::envelope("expected magic UEFORMAT, found BADMAGIC");
        assert!(e.to_string().contains("BADMAGIC"));

        let e = Error::DanglingMeshReference { actor: "Rock".into(), hash: 0xBEEF };
        assert!(e.to_string().contains("Rock"));
        assert!(e.to_string().contains("0x0000beef"));
    }

    #[test]
    fn test_error_root_unwraps_nested_context() {
        let inner = Error::UnexpectedEof { offset: 10, needed: 4, available: 2 };
        let wrapped = Error::Section {
            kind: "UEWORLD".into(),
            section: "MESHES".into(),
            offset: 0,
            source: Box::new(Error::Section {
                kind: "UEMODEL".into(),
                section: "VERTICES".into(),
                offset: 4,
                source: Box::new(inner),
            }),
        };

        assert!(matches!(wrapped.root(), Error::UnexpectedEof { offset: 10, .. }));
        assert_eq!(wrapped.section(), Some("VERTICES"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
