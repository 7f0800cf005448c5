//! `UEWORLD` decoding with per-call mesh deduplication.

use std::collections::HashMap;
use std::sync::Arc;

use super::model::ModelDecoder;
use crate::core::{DecodeOptions, MeshInstancing};
use crate::format::{ByteReader, Container, ContainerKind, Dispatch, SectionStream, WorldSection};
use crate::scene::{HashedMesh, ModelScene, PlacedActor, WorldActor, WorldData, WorldScene};
use crate::util::{Error, Result};

/// Decodes the model container embedded in a world's `MESHES` section.
pub trait MeshDecoder {
    fn decode_mesh(&self, bytes: &[u8], options: &DecodeOptions) -> Result<ModelScene>;
}

/// Decodes embedded meshes with [`ModelDecoder`].
///
/// The envelope kind is checked before any payload is read, so a world
/// embedded in a world is rejected without decoding it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContainerDecoder;

impl MeshDecoder for ContainerDecoder {
    fn decode_mesh(&self, bytes: &[u8], options: &DecodeOptions) -> Result<ModelScene> {
        let container = Container::parse(bytes)?;
        if container.kind() != ContainerKind::Model {
            return Err(Error::envelope(format!(
                "embedded mesh is a {} container",
                container.kind()
            )));
        }
        ModelDecoder::new(options).decode(&container)
    }
}

/// Decoder for world payloads.
#[derive(Clone, Copy, Debug)]
pub struct WorldDecoder<'o, D = ContainerDecoder> {
    options: &'o DecodeOptions,
    meshes: D,
}

impl<'o> WorldDecoder<'o> {
    pub fn new(options: &'o DecodeOptions) -> Self {
        Self { options, meshes: ContainerDecoder }
    }
}

impl<'o, D: MeshDecoder> WorldDecoder<'o, D> {
    /// Use a custom decoder for embedded meshes.
    pub fn with_mesh_decoder(options: &'o DecodeOptions, meshes: D) -> Self {
        Self { options, meshes }
    }

    /// Decode a parsed world container.
    pub fn decode(&self, container: &Container<'_>) -> Result<WorldScene> {
        if container.kind() != ContainerKind::World {
            return Err(Error::envelope(format!(
                "expected {} container, found {}",
                ContainerKind::World,
                container.kind()
            )));
        }
        let mut reader = container.reader();
        let data = self.read_data(&mut reader)?;
        self.assemble(container.object_name().to_string(), data)
    }

    /// Read every section of a world payload.
    pub fn read_data(&self, reader: &mut ByteReader<'_>) -> Result<WorldData> {
        let scale = self.options.scale;
        let mut data = WorldData::default();

        let sections = SectionStream::new(reader, ContainerKind::World).for_each(|r, header| {
            match WorldSection::from_name(&header.name) {
                WorldSection::Meshes => {
                    data.meshes = r.read_array(header.element_count, |r| {
                        let hash = r.read_u32()?;
                        let size = r.read_len()?;
                        Ok(HashedMesh { hash, data: r.read_bytes(size)?.to_vec() })
                    })?;
                }
                WorldSection::Actors => {
                    data.actors = r.read_array(header.element_count, |r| {
                        Ok(WorldActor {
                            mesh_hash: r.read_u32()?,
                            name: r.read_fstring()?,
                            position: r.read_vec3()? * scale,
                            rotation: r.read_vec3()?,
                            scale: r.read_vec3()?,
                        })
                    })?;
                }
                WorldSection::Unknown(_) => return Ok(Dispatch::Skipped),
            }
            Ok(Dispatch::Consumed)
        })?;

        tracing::debug!(
            sections,
            meshes = data.meshes.len(),
            actors = data.actors.len(),
            "read world sections"
        );
        Ok(data)
    }

    /// Decode each distinct mesh once and bind actors to them.
    pub fn assemble(&self, name: String, data: WorldData) -> Result<WorldScene> {
        let instancing = self.options.instancing();
        let mut meshes: HashMap<u32, Arc<ModelScene>> = HashMap::with_capacity(data.meshes.len());

        for mesh in &data.meshes {
            if meshes.contains_key(&mesh.hash) {
                tracing::warn!(hash = mesh.hash, "duplicate mesh hash; keeping the first");
                continue;
            }
            let scene = self.meshes.decode_mesh(&mesh.data, self.options)?;
            tracing::trace!(hash = mesh.hash, mesh = %scene.name, "decoded embedded mesh");
            meshes.insert(mesh.hash, Arc::new(scene));
        }

        let actors = data
            .actors
            .into_iter()
            .map(|actor| -> Result<PlacedActor> {
                let shared = meshes.get(&actor.mesh_hash).ok_or_else(|| {
                    Error::DanglingMeshReference { actor: actor.name.clone(), hash: actor.mesh_hash }
                })?;
                let mesh = match instancing {
                    MeshInstancing::Shared => Arc::clone(shared),
                    MeshInstancing::Copy => Arc::new(ModelScene::clone(shared)),
                };
                Ok(PlacedActor { actor, mesh })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            world = %name,
            meshes = meshes.len(),
            actors = actors.len(),
            ?instancing,
            "assembled world"
        );
        Ok(WorldScene { name, meshes, actors, instancing })
    }
}
