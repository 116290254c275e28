use odyssey::formats::mdl::read_mdl_with_options;
use odyssey::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::tempdir;

fn textured_model() -> Model {
    let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let mut face = Face::new([0, 1, 2], 0);
    face.normal = face.compute_normal(&vertices);
    face.distance = 0.0;

    let mesh = Mesh {
        normals: vec![[0.0, 0.0, 1.0]; 3],
        uvs: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]],
        faces: vec![face],
        vertices,
        diffuse_texture: Some("plc_crate".to_string()),
        ..Mesh::default()
    };
    let mut model = Model::new("plc_crate");
    model.classification = Classification::Placeable;
    model.root.children.push(ModelNode {
        node_number: 1,
        ..ModelNode::new("box", NodeKind::Trimesh(mesh))
    });
    model
}

#[test]
fn test_mdl_files_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plc_crate.mdl");
    let model = textured_model();

    write_mdl(&model, &path, &MdlWriteOptions::default()).unwrap();
    assert!(dir.path().join("plc_crate.mdx").is_file());

    assert_eq!(read_mdl(&path).unwrap(), model);
}

#[test]
fn test_mdl_uppercase_companion() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("PLC_CRATE.MDL");
    let options = MdlWriteOptions {
        edition: Edition::Tsl,
        platform: Platform::Xbox,
        ..Default::default()
    };

    write_mdl(&textured_model(), &path, &options).unwrap();
    assert!(dir.path().join("PLC_CRATE.MDX").is_file());

    let decoded = read_mdl_with_options(&path, &MdlReadOptions::default()).unwrap();
    assert_eq!(decoded.classification, Classification::Placeable);
}

#[test]
fn test_missing_mdx_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lonely.mdl");
    let bytes = serialize_mdl(&Model::new("lonely"), &MdlWriteOptions::default()).unwrap();
    std::fs::write(&path, &bytes.mdl).unwrap();

    let err = read_mdl(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(matches!(err, Error::MdxNotFound { path } if path == dir.path().join("lonely.mdx")));
}

#[test]
fn test_minimal_model_survives_two_passes() {
    let first = serialize_mdl(&Model::new("root"), &MdlWriteOptions::default()).unwrap();
    let decoded = parse_mdl_bytes(&first.mdl, &first.mdx).unwrap();
    let second = serialize_mdl(&decoded, &MdlWriteOptions::default()).unwrap();
    let again = parse_mdl_bytes(&second.mdl, &second.mdx).unwrap();

    assert_eq!(first, second);
    assert_eq!(again.root.name, "root");
    assert!(again.root.children.is_empty());
    assert!(again.animations.is_empty());
    assert_eq!(again.classification, Classification::Other);
}

#[test]
fn test_room_walkmesh_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m01aa_01a.wok");
    let walkmesh = Walkmesh {
        kind: WalkmeshKind::Room,
        vertices: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [3.0, 0.0, 1.0],
            [4.0, 0.0, 1.0],
            [3.0, 2.0, 1.0],
        ],
        faces: vec![Face::new([3, 4, 5], 2), Face::new([0, 1, 2], 4)],
        ..Default::default()
    };

    write_bwm(&walkmesh, &path).unwrap();
    let decoded = read_bwm(&path).unwrap();

    assert_eq!(decoded.faces[0].material, 4);
    assert_eq!(decoded.aabb_tree.len(), 3);
    assert_eq!(decoded.aabb_tree[0].bbox_max, [4.0, 2.0, 1.0]);
}

#[test]
fn test_gff_file_keeps_list_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.gff");
    let root = GffStruct::root().with("X", GffValue::Float(1.5)).with(
        "Y",
        GffValue::List(vec![
            GffStruct::new(0).with("A", GffValue::Dword(1)),
            GffStruct::new(0).with("A", GffValue::Dword(2)),
        ]),
    );
    let doc = GffDocument::new("GFF ", root);

    write_gff(&doc, &path).unwrap();
    let decoded = read_gff(&path).unwrap();

    assert_eq!(decoded, doc);
    let list = decoded.root.get_list("Y").unwrap();
    assert_eq!(list[1].get_u32("A"), Some(2));
}

#[test]
fn test_pth_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m01aa.pth");
    let graph = PathGraph {
        points: vec![
            PathPoint { x: 1.0, y: 2.0, connections: vec![1] },
            PathPoint { x: 3.0, y: 4.0, connections: vec![0] },
        ],
    };

    write_pth(&graph, &path).unwrap();
    assert_eq!(read_pth(&path).unwrap(), graph);
}

#[test]
fn test_model_json_export() {
    let json = converter::to_json(&textured_model()).unwrap();
    let back: Model = serde_json::from_str(&json).unwrap();
    assert_eq!(back, textured_model());
}

#[test]
fn test_tpc_directory_to_png() {
    let source = tempdir().unwrap();
    let dest = tempdir().unwrap();

    // 128-byte header: DXT1 4x4, one mip, then one all-red block
    let mut tpc = Vec::new();
    tpc.extend_from_slice(&8u32.to_le_bytes());
    tpc.extend_from_slice(&0.0f32.to_le_bytes());
    tpc.extend_from_slice(&4u16.to_le_bytes());
    tpc.extend_from_slice(&4u16.to_le_bytes());
    tpc.push(2);
    tpc.push(1);
    tpc.extend_from_slice(&[0u8; 114]);
    tpc.extend_from_slice(&[0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0]);
    std::fs::write(source.path().join("red.tpc"), &tpc).unwrap();

    let info = read_tpc(source.path().join("red.tpc")).unwrap().info();
    assert_eq!((info.width, info.height, info.mip_count), (4, 4, 1));

    let files = converter::find_tpc_files(source.path());
    let result = converter::batch_tpc_to_png(&files, source.path(), dest.path(), |_, _, _| {});
    assert_eq!(result.success_count, 1);

    let png: PathBuf = dest.path().join("red.png");
    let image = image::open(&png).unwrap().to_rgba8();
    assert_eq!(image.get_pixel(3, 3).0, [255, 0, 0, 255]);
}
