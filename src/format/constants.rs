//! UEFormat constants: envelope magic, container kinds and section names.

/// Magic bytes at the start of every container.
pub const MAGIC: &[u8; 8] = b"UEFORMAT";

/// Kind identifier of model containers.
pub const MODEL_IDENTIFIER: &str = "UEMODEL";

/// Kind identifier of animation containers.
pub const ANIM_IDENTIFIER: &str = "UEANIM";

/// Kind identifier of world containers.
pub const WORLD_IDENTIFIER: &str = "UEWORLD";

/// Format version written by the encoder.
pub const CURRENT_VERSION: u8 = 1;

// Model sections
pub const SECTION_VERTICES: &str = "VERTICES";
pub const SECTION_INDICES: &str = "INDICES";
pub const SECTION_NORMALS: &str = "NORMALS";
pub const SECTION_TANGENTS: &str = "TANGENTS";
pub const SECTION_VERTEX_COLORS: &str = "VERTEXCOLORS";
pub const SECTION_TEXCOORDS: &str = "TEXCOORDS";
pub const SECTION_MATERIALS: &str = "MATERIALS";
pub const SECTION_WEIGHTS: &str = "WEIGHTS";
pub const SECTION_BONES: &str = "BONES";
pub const SECTION_MORPH_TARGETS: &str = "MORPHTARGETS";
pub const SECTION_SOCKETS: &str = "SOCKETS";

// Animation sections
pub const SECTION_TRACKS: &str = "TRACKS";
pub const SECTION_CURVES: &str = "CURVES";

// World sections
pub const SECTION_MESHES: &str = "MESHES";
pub const SECTION_ACTORS: &str = "ACTORS";

/// The three payload kinds sharing the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerKind {
    Model,
    Anim,
    World,
}

impl ContainerKind {
    /// Parse the kind identifier stored in the header.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            MODEL_IDENTIFIER => Some(Self::Model),
            ANIM_IDENTIFIER => Some(Self::Anim),
            WORLD_IDENTIFIER => Some(Self::World),
            _ => None,
        }
    }

    /// Identifier written into the header.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Model => MODEL_IDENTIFIER,
            Self::Anim => ANIM_IDENTIFIER,
            Self::World => WORLD_IDENTIFIER,
        }
    }

    /// Conventional file extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Model => "uemodel",
            Self::Anim => "ueanim",
            Self::World => "ueworld",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_identifiers() {
        for kind in [ContainerKind::Model, ContainerKind::Anim, ContainerKind::World] {
            assert_eq!(ContainerKind::from_identifier(kind.identifier()), Some(kind));
        }
        assert_eq!(ContainerKind::from_identifier("UEMESH"), None);
        assert_eq!(ContainerKind::from_identifier("uemodel"), None);
    }
}
