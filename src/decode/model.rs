//! `UEMODEL` decoding and reconstruction.
//!
//! Decoding is split in two passes. [`ModelDecoder::read_data`] walks the
//! section stream and fills a [`ModelData`] with scaled raw arrays.
//! [`ModelDecoder::reconstruct`] then derives everything else, strictly in
//! this order:
//!
//! 1. geometry (index validation)
//! 2. skeleton (parent-chain world matrices)
//! 3. vertex groups from weights
//! 4. absolute morph shapes
//! 5. sockets
//! 6. per-face material indices

use std::collections::HashMap;

use crate::core::DecodeOptions;
use crate::format::{ByteReader, Container, ContainerKind, Dispatch, ModelSection, SectionStream};
use crate::scene::{
    Bone, MaterialRange, ModelData, ModelScene, MorphDelta, MorphShape, MorphTarget,
    ResolvedSocket, Skeleton, Socket, VertexGroup, VertexWeight, BASIS_SHAPE_NAME,
};
use crate::util::{translation_rotation, Error, Result, Vec3};

/// Decoder for model payloads.
#[derive(Clone, Copy, Debug)]
pub struct ModelDecoder<'o> {
    options: &'o DecodeOptions,
}

impl<'o> ModelDecoder<'o> {
    pub fn new(options: &'o DecodeOptions) -> Self {
        Self { options }
    }

    /// Decode a parsed model container.
    pub fn decode(&self, container: &Container<'_>) -> Result<ModelScene> {
        if container.kind() != ContainerKind::Model {
            return Err(Error::envelope(format!(
                "expected {} container, found {}",
                ContainerKind::Model,
                container.kind()
            )));
        }
        let mut reader = container.reader();
        let data = self.read_data(&mut reader)?;
        self.reconstruct(container.object_name().to_string(), data)
    }

    /// Read every section of a model payload.
    pub fn read_data(&self, reader: &mut ByteReader<'_>) -> Result<ModelData> {
        let scale = self.options.scale;
        let mut data = ModelData::default();

        let sections = SectionStream::new(reader, ContainerKind::Model).for_each(|r, header| {
            let count = header.element_count;
            match ModelSection::from_name(&header.name) {
                ModelSection::Vertices => {
                    data.vertices = r.read_array(count, |r| Ok(r.read_vec3()? * scale))?;
                }
                ModelSection::Indices => {
                    if count % 3 != 0 {
                        return Err(Error::invalid(format!(
                            "index count {count} is not a multiple of 3"
                        )));
                    }
                    data.indices = r.read_array(count / 3, |r| r.read_u32s::<3>())?;
                }
                ModelSection::Normals => {
                    data.normals = r.read_array(count, |r| r.read_vec3())?;
                }
                ModelSection::Tangents => {
                    data.tangents = r.read_array(count, |r| r.read_vec3())?;
                }
                ModelSection::VertexColors => {
                    data.colors = r.read_array(count, |r| r.read_u8s::<4>())?;
                }
                ModelSection::TexCoords => {
                    data.uvs = r.read_array(count, |r| r.read_bulk_array(|r| r.read_vec2()))?;
                }
                ModelSection::Materials => {
                    data.materials = r.read_array(count, read_material)?;
                }
                ModelSection::Weights => {
                    data.weights = r.read_array(count, read_weight)?;
                }
                ModelSection::Bones => {
                    data.bones = r.read_array(count, |r| {
                        let name = r.read_fstring()?;
                        let parent_index = r.read_i32()?;
                        let position = r.read_vec3()? * scale;
                        let rotation = r.read_quat()?;
                        Ok(Bone { name, parent_index, position, rotation })
                    })?;
                }
                ModelSection::MorphTargets => {
                    data.morph_targets = r.read_array(count, |r| {
                        let name = r.read_fstring()?;
                        let deltas = r.read_bulk_array(|r| {
                            Ok(MorphDelta {
                                position: r.read_vec3()? * scale,
                                normal: r.read_vec3()?,
                                vertex_index: r.read_u32()?,
                            })
                        })?;
                        Ok(MorphTarget { name, deltas })
                    })?;
                }
                ModelSection::Sockets => {
                    data.sockets = r.read_array(count, |r| {
                        Ok(Socket {
                            name: r.read_fstring()?,
                            parent_name: r.read_fstring()?,
                            position: r.read_vec3()? * scale,
                            rotation: r.read_quat()?,
                            scale: r.read_vec3()?,
                        })
                    })?;
                }
                ModelSection::Unknown(_) => return Ok(Dispatch::Skipped),
            }
            Ok(Dispatch::Consumed)
        })?;

        tracing::debug!(
            sections,
            vertices = data.vertices.len(),
            faces = data.indices.len(),
            bones = data.bones.len(),
            morphs = data.morph_targets.len(),
            "read model sections"
        );
        Ok(data)
    }

    /// Build the model scene from raw arrays.
    pub fn reconstruct(&self, name: String, data: ModelData) -> Result<ModelScene> {
        validate_geometry(&data)?;
        tracing::trace!(object = %name, "geometry built");

        let skeleton = if data.bones.is_empty() {
            None
        } else {
            let skeleton = Skeleton::resolve(data.bones.clone())?;
            tracing::trace!(object = %name, bones = skeleton.len(), "skeleton built");
            Some(skeleton)
        };

        let vertex_groups = match &skeleton {
            Some(skeleton) => build_vertex_groups(&data, skeleton),
            None => {
                if !data.weights.is_empty() {
                    tracing::warn!(
                        object = %name,
                        weights = data.weights.len(),
                        "model has weights but no bones; ignoring weights"
                    );
                }
                Vec::new()
            }
        };
        let shapes = build_morph_shapes(&data);
        let sockets = resolve_sockets(&data.sockets, skeleton.as_ref());
        tracing::trace!(
            object = %name,
            groups = vertex_groups.len(),
            shapes = shapes.len(),
            sockets = sockets.len(),
            "skinning and attachments built"
        );
        let face_materials = assign_face_materials(&data.materials, data.num_faces());

        Ok(ModelScene {
            name,
            data,
            skeleton,
            vertex_groups,
            shapes,
            sockets,
            face_materials,
            bone_length: self.options.scaled_bone_length(),
        })
    }
}

fn read_material(r: &mut ByteReader<'_>) -> Result<MaterialRange> {
    let name = r.read_fstring()?;
    let first_index = u32::try_from(r.read_i32()?)
        .map_err(|_| Error::invalid(format!("material {name:?} has a negative first index")))?;
    let face_count = u32::try_from(r.read_i32()?)
        .map_err(|_| Error::invalid(format!("material {name:?} has a negative face count")))?;
    Ok(MaterialRange { name, first_index, face_count })
}

fn read_weight(r: &mut ByteReader<'_>) -> Result<VertexWeight> {
    // Stored as i16; a negative index reads back out of range and is dropped later.
    let bone_index = r.read_u16()?;
    let vertex_index = r.read_u32()?;
    let weight = r.read_f32()?;
    Ok(VertexWeight { bone_index, vertex_index, weight })
}

fn validate_geometry(data: &ModelData) -> Result<()> {
    let num_vertices = data.num_vertices();
    for (face, tri) in data.indices.iter().enumerate() {
        if let Some(&bad) = tri.iter().find(|&&i| i as usize >= num_vertices) {
            return Err(Error::invalid(format!(
                "face {face} references vertex {bad}, model has {num_vertices}"
            )));
        }
    }

    let per_vertex = [
        ("normals", data.normals.len()),
        ("tangents", data.tangents.len()),
        ("colors", data.colors.len()),
    ];
    let uv_channels = data.uvs.iter().map(|channel| ("uvs", channel.len()));
    for (attribute, len) in per_vertex.into_iter().chain(uv_channels) {
        if len != 0 && len != num_vertices {
            tracing::warn!(attribute, len, num_vertices, "attribute length differs from vertex count");
        }
    }
    Ok(())
}

/// Group weights by bone name, summing repeated (vertex, bone) pairs.
fn build_vertex_groups(data: &ModelData, skeleton: &Skeleton) -> Vec<VertexGroup> {
    let mut groups: Vec<VertexGroup> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();
    let num_vertices = data.num_vertices();

    for w in &data.weights {
        let Some(bone) = skeleton.bone(w.bone_index as usize) else {
            tracing::warn!(bone = w.bone_index, vertex = w.vertex_index, "weight references missing bone; dropped");
            continue;
        };
        if w.vertex_index as usize >= num_vertices {
            tracing::warn!(bone = %bone.name, vertex = w.vertex_index, "weight references missing vertex; dropped");
            continue;
        }

        let group = *by_name.entry(bone.name.as_str()).or_insert_with(|| {
            groups.push(VertexGroup {
                name: bone.name.clone(),
                bone_index: w.bone_index as usize,
                weights: Default::default(),
            });
            groups.len() - 1
        });
        *groups[group].weights.entry(w.vertex_index).or_insert(0.0) += w.weight;
    }
    groups
}

/// One absolute shape per morph target, each from the untouched base.
fn build_morph_shapes(data: &ModelData) -> Vec<MorphShape> {
    if data.morph_targets.is_empty() {
        return Vec::new();
    }

    let mut shapes = Vec::with_capacity(data.morph_targets.len() + 1);
    shapes.push(MorphShape { name: BASIS_SHAPE_NAME.to_string(), positions: data.vertices.clone() });

    for target in &data.morph_targets {
        let mut positions = data.vertices.clone();
        for delta in &target.deltas {
            match positions.get_mut(delta.vertex_index as usize) {
                Some(p) => *p += delta.position,
                None => tracing::warn!(
                    morph = %target.name,
                    vertex = delta.vertex_index,
                    "morph delta references missing vertex; dropped"
                ),
            }
        }
        shapes.push(MorphShape { name: target.name.clone(), positions });
    }
    shapes
}

fn resolve_sockets(sockets: &[Socket], skeleton: Option<&Skeleton>) -> Vec<ResolvedSocket> {
    sockets
        .iter()
        .filter_map(|socket| {
            let resolved = skeleton.and_then(|s| {
                let parent = s.find(&socket.parent_name)?;
                Some((parent, *s.world_matrix(parent)?))
            });
            let Some((parent_index, parent_world)) = resolved else {
                tracing::warn!(
                    socket = %socket.name,
                    parent = %socket.parent_name,
                    "socket parent bone not found; dropped"
                );
                return None;
            };
            Some(ResolvedSocket {
                socket: socket.clone(),
                parent_index,
                world: parent_world * translation_rotation(socket.position, socket.rotation),
            })
        })
        .collect()
}

/// Material index per face; later ranges overwrite earlier ones.
fn assign_face_materials(materials: &[MaterialRange], num_faces: usize) -> Vec<u32> {
    if materials.is_empty() {
        return Vec::new();
    }

    let mut face_materials = vec![0u32; num_faces];
    for (index, range) in materials.iter().enumerate() {
        let start = range.first_face().min(num_faces);
        let end = range.end_face();
        if end > num_faces {
            tracing::warn!(
                material = %range.name,
                end_face = end,
                num_faces,
                "material range exceeds face count; clamped"
            );
        }
        face_materials[start..end.min(num_faces)].fill(index as u32);
    }
    face_materials
}

/// Positions of `shape` relative to the base mesh.
pub fn shape_offsets(base: &[Vec3], shape: &MorphShape) -> Vec<Vec3> {
    shape.positions.iter().zip(base).map(|(p, b)| *p - *b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::encode_model;
    use crate::util::{Mat4, Quat};

    const EPS: f32 = 1e-5;

    fn decode(data: &ModelData) -> Result<ModelScene> {
        let bytes = encode_model("Test", data, None)?;
        let container = Container::parse(&bytes)?;
        ModelDecoder::new(&DecodeOptions::unscaled()).decode(&container)
    }

    fn triangle() -> ModelData {
        ModelData {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    fn two_bones() -> Vec<Bone> {
        vec![
            Bone::new("Root", -1, Vec3::ZERO, Quat::IDENTITY),
            Bone::new("Hand", 0, Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_z(1.0)),
        ]
    }

    #[test]
    fn test_scale_applies_to_positions_only() {
        let data = ModelData {
            normals: vec![Vec3::Z; 3],
            bones: vec![Bone::new("Root", -1, Vec3::splat(100.0), Quat::IDENTITY)],
            ..triangle()
        };
        let bytes = encode_model("Scaled", &data, None).unwrap();
        let container = Container::parse(&bytes).unwrap();
        let scene = ModelDecoder::new(&DecodeOptions::new()).decode(&container).unwrap();

        assert_eq!(scene.data.vertices[1], Vec3::new(0.01, 0.0, 0.0));
        assert_eq!(scene.data.normals[0], Vec3::Z);
        assert!((scene.data.bones[0].position - Vec3::ONE).length() < EPS);
        assert!((scene.bone_length - 0.05).abs() < EPS);
    }

    #[test]
    fn test_out_of_range_index_is_error() {
        let data = ModelData { indices: vec![[0, 1, 3]], ..triangle() };
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(msg) if msg.contains("vertex 3")));
    }

    #[test]
    fn test_forward_parent_is_malformed_hierarchy() {
        let data = ModelData {
            bones: vec![
                Bone::new("A", 1, Vec3::ZERO, Quat::IDENTITY),
                Bone::new("B", -1, Vec3::ZERO, Quat::IDENTITY),
            ],
            ..triangle()
        };
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::MalformedHierarchy { index: 0, parent: 1, .. }));
    }

    #[test]
    fn test_vertex_groups_by_name_and_additive() {
        let data = ModelData {
            bones: two_bones(),
            weights: vec![
                VertexWeight { bone_index: 1, vertex_index: 0, weight: 0.25 },
                VertexWeight { bone_index: 0, vertex_index: 1, weight: 1.0 },
                VertexWeight { bone_index: 1, vertex_index: 0, weight: 0.5 },
                VertexWeight { bone_index: 7, vertex_index: 2, weight: 1.0 },
            ],
            ..triangle()
        };
        let scene = decode(&data).unwrap();

        let names: Vec<_> = scene.vertex_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Hand", "Root"]);
        let hand = scene.vertex_group("Hand").unwrap();
        assert_eq!(hand.bone_index, 1);
        assert!((hand.weight(0) - 0.75).abs() < EPS);
        assert_eq!(hand.weight(2), 0.0);
        assert_eq!(scene.non_deforming_bones(), Vec::<usize>::new());
    }

    #[test]
    fn test_weights_without_bones_ignored() {
        let data = ModelData {
            weights: vec![VertexWeight { bone_index: 0, vertex_index: 0, weight: 1.0 }],
            ..triangle()
        };
        let scene = decode(&data).unwrap();
        assert!(scene.skeleton.is_none());
        assert!(scene.vertex_groups.is_empty());
    }

    #[test]
    fn test_morph_shapes_and_basis() {
        let data = ModelData {
            morph_targets: vec![MorphTarget {
                name: "Smile".into(),
                deltas: vec![
                    MorphDelta { position: Vec3::Z, normal: Vec3::ZERO, vertex_index: 2 },
                    MorphDelta { position: Vec3::Z, normal: Vec3::ZERO, vertex_index: 9 },
                ],
            }],
            ..triangle()
        };
        let scene = decode(&data).unwrap();

        assert_eq!(scene.shapes.len(), 2);
        assert_eq!(scene.shapes[0].name, BASIS_SHAPE_NAME);
        assert_eq!(scene.shapes[0].positions, scene.data.vertices);
        let smile = scene.morph_shape("Smile").unwrap();
        assert_eq!(smile.positions[2], Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(smile.positions[0], Vec3::ZERO);
        assert_eq!(
            shape_offsets(&scene.data.vertices, smile),
            vec![Vec3::ZERO, Vec3::ZERO, Vec3::Z]
        );
    }

    #[test]
    fn test_socket_world_matrix() {
        let socket = Socket {
            name: "Weapon".into(),
            parent_name: "HAND".into(),
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_x(0.5),
            scale: Vec3::splat(3.0),
        };
        let orphan = Socket { name: "Lost".into(), parent_name: "Tail".into(), ..socket.clone() };
        let data = ModelData { bones: two_bones(), sockets: vec![socket, orphan], ..triangle() };
        let scene = decode(&data).unwrap();

        assert_eq!(scene.sockets.len(), 1);
        let resolved = &scene.sockets[0];
        assert_eq!(resolved.parent_index, 1);

        let skeleton = scene.skeleton.as_ref().unwrap();
        let expected = *skeleton.world_matrix(1).unwrap()
            * Mat4::from_translation(Vec3::X)
            * Mat4::from_quat(Quat::from_rotation_x(0.5));
        assert!(resolved.world.abs_diff_eq(expected, EPS));
        // Hand is not deformed by any weight, Root neither.
        assert_eq!(scene.non_deforming_bones(), vec![0, 1]);
    }

    #[test]
    fn test_sockets_without_bones_dropped() {
        let data = ModelData {
            sockets: vec![Socket {
                name: "Muzzle".into(),
                parent_name: "Root".into(),
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            }],
            ..triangle()
        };
        let scene = decode(&data).unwrap();
        assert!(scene.data.has_skeleton());
        assert!(scene.sockets.is_empty());
    }

    #[test]
    fn test_face_materials_last_wins_and_clamped() {
        let materials = vec![
            MaterialRange { name: "A".into(), first_index: 0, face_count: 3 },
            MaterialRange { name: "B".into(), first_index: 3, face_count: 1 },
            MaterialRange { name: "C".into(), first_index: 6, face_count: 10 },
        ];
        assert_eq!(assign_face_materials(&materials, 4), vec![0, 1, 2, 2]);
        assert!(assign_face_materials(&[], 4).is_empty());
    }

    #[test]
    fn test_negative_material_count_rejected() {
        let mut w = crate::format::ByteWriter::new();
        w.section("MATERIALS", 1, |w| {
            w.write_fstring("M")?;
            w.write_i32(0)?;
            w.write_i32(-2)
        })
        .unwrap();
        let payload = w.into_inner();
        let mut reader = ByteReader::new(&payload);

        let err = ModelDecoder::new(&DecodeOptions::new()).read_data(&mut reader).unwrap_err();
        assert_eq!(err.section(), Some("MATERIALS"));
        assert!(matches!(err.root(), Error::InvalidStructure(_)));
    }
}
