//! Integration tests for decoding world containers with embedded meshes.

use std::sync::Arc;

use glam::{Quat, Vec3};
use ueformat::decode::WorldDecoder;
use ueformat::format::Container;
use ueformat::prelude::*;

fn mesh_bytes(name: &str, size: f32, compression: Option<CompressionAlgorithm>) -> Vec<u8> {
    let data = ModelData {
        vertices: vec![Vec3::ZERO, Vec3::new(size, 0.0, 0.0), Vec3::new(0.0, size, 0.0)],
        indices: vec![[0, 1, 2]],
        ..Default::default()
    };
    encode_model(name, &data, compression).unwrap()
}

fn actor(name: &str, hash: u32, position: Vec3, rotation: Vec3) -> WorldActor {
    WorldActor { mesh_hash: hash, name: name.into(), position, rotation, scale: Vec3::ONE }
}

fn city() -> WorldData {
    WorldData {
        meshes: vec![
            HashedMesh { hash: 0x1111, data: mesh_bytes("SM_Lamp", 100.0, None) },
            HashedMesh {
                hash: 0x2222,
                data: mesh_bytes("SM_Bench", 200.0, Some(CompressionAlgorithm::Gzip)),
            },
        ],
        actors: vec![
            actor("Lamp_1", 0x1111, Vec3::new(500.0, 0.0, 0.0), Vec3::ZERO),
            actor("Lamp_2", 0x1111, Vec3::new(-500.0, 0.0, 0.0), Vec3::new(0.0, 90.0, 0.0)),
            actor("Bench", 0x2222, Vec3::ZERO, Vec3::ZERO),
        ],
    }
}

#[test]
fn test_world_decode_shares_meshes() {
    let bytes = encode_world("City", &city(), None).unwrap();
    let world = decode_world(&bytes, &DecodeOptions::default()).unwrap();

    assert_eq!(world.name, "City");
    assert_eq!(world.meshes.len(), 2);
    assert_eq!(world.actors.len(), 3);
    assert_eq!(world.instancing, MeshInstancing::Shared);

    let lamps: Vec<_> = world.actors_using(0x1111).collect();
    assert_eq!(lamps.len(), 2);
    assert!(Arc::ptr_eq(&lamps[0].mesh, &lamps[1].mesh));
    assert!(Arc::ptr_eq(&lamps[0].mesh, world.mesh(0x1111).unwrap()));
    assert_eq!(lamps[0].mesh.name, "SM_Lamp");

    // Embedded meshes use the same scale as the world.
    let bench = world.mesh(0x2222).unwrap();
    assert!((bench.positions()[1].x - 2.0).abs() < 1e-6);
    assert!((world.actors[0].actor.position.x - 5.0).abs() < 1e-6);
}

#[test]
fn test_world_copy_instancing() {
    let bytes = encode_world("City", &city(), Some(CompressionAlgorithm::Gzip)).unwrap();
    let options = DecodeOptions::default().with_instance_meshes(false);
    let world = decode_world(&bytes, &options).unwrap();

    assert_eq!(world.instancing, MeshInstancing::Copy);
    let lamps: Vec<_> = world.actors_using(0x1111).collect();
    assert!(!Arc::ptr_eq(&lamps[0].mesh, &lamps[1].mesh));
    assert_eq!(*lamps[0].mesh, *lamps[1].mesh);
}

#[test]
fn test_actor_transform() {
    let bytes = encode_world("City", &city(), None).unwrap();
    let world = decode_world(&bytes, &DecodeOptions::default()).unwrap();

    // Stored yaw of 90 degrees becomes a Z rotation.
    let lamp = &world.actors[1].actor;
    let e = lamp.euler_radians();
    assert!((e.z - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert!(lamp.rotation_quat().dot(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)).abs() > 1.0 - 1e-5);

    let p = lamp.transform().transform_point3(Vec3::X);
    assert!((p - Vec3::new(-5.0, 1.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_dangling_reference_fails_whole_decode() {
    let mut data = city();
    data.actors.push(actor("Ghost", 0xBEEF, Vec3::ZERO, Vec3::ZERO));
    let bytes = encode_world("City", &data, None).unwrap();

    let err = decode(&bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DanglingMeshReference { hash: 0xBEEF, .. }), "got {err:?}");
}

#[test]
fn test_embedded_world_rejected() {
    let inner = encode_world("Inner", &WorldData::default(), None).unwrap();
    let data = WorldData { meshes: vec![HashedMesh { hash: 1, data: inner }], actors: Vec::new() };
    let bytes = encode_world("Outer", &data, None).unwrap();

    let err = decode_world(&bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedEnvelope(_)), "got {err:?}");
}

#[test]
fn test_world_decoder_two_passes() {
    let bytes = encode_world("City", &city(), None).unwrap();
    let container = Container::parse(&bytes).unwrap();
    let options = DecodeOptions::default();
    let decoder = WorldDecoder::new(&options);

    let mut reader = container.reader();
    let raw = decoder.read_data(&mut reader).unwrap();
    assert_eq!(raw.meshes.len(), 2);
    assert_eq!(raw.actors[2].name, "Bench");

    let world = decoder.assemble("City".into(), raw).unwrap();
    assert_eq!(world, decoder.decode(&container).unwrap());
}
