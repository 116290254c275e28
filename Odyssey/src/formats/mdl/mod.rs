//! MDL/MDX model format module
//!
//! Binary models come in pairs: the `.mdl` file holds the node tree, controllers
//! and animations, the `.mdx` file holds interleaved per-vertex records. Four
//! builds exist (two editions on two platforms), told apart by the function
//! pointers at the start of the geometry header.

pub mod constants;
pub mod controllers;
mod options;
mod reader;
pub mod saber;
mod types;
mod writer;

pub use options::{Edition, MdlReadOptions, MdlWriteOptions, Platform, Target};
pub use reader::{parse_mdl_bytes, parse_mdl_bytes_with_options, read_mdl, read_mdl_with_options};
pub use types::{
    Animation, AnimationEvent, AnimationNode, BoneWeight, Classification, Dangly, Emitter,
    EmitterFlags, Flare, Light, Mesh, Model, ModelNode, NodeKind, Reference, Skin, UvAnimation,
};
pub use writer::{MdlBytes, serialize_mdl, write_mdl};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::formats::common::{Face, build_aabb_tree, faces_from_mesh, plane_distance};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    const QUARTER_TURN: [f32; 4] = [0.0, 0.0, std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2];

    fn faces(vertices: &[[f32; 3]], corners: &[[u32; 3]], material: u32) -> Vec<Face> {
        corners
            .iter()
            .map(|&corners| {
                let mut face = Face::new(corners, material);
                face.normal = face.compute_normal(vertices);
                face.distance = plane_distance(face.normal, vertices[corners[0] as usize]);
                face
            })
            .collect()
    }

    fn quad_mesh() -> Mesh {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        Mesh {
            faces: faces(&vertices, &[[0, 1, 2], [0, 2, 3]], 4),
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                vec![[0.5, 0.5]; 4],
            ],
            vertices,
            diffuse_texture: Some("lda_wall01".to_string()),
            lightmap_texture: Some("m01aa_lm0".to_string()),
            has_lightmap: true,
            alpha: 0.75,
            self_illum_color: [0.1, 0.2, 0.3],
            uv_animation: Some(UvAnimation {
                direction: [0.5, 0.0],
                jitter: 0.25,
                jitter_speed: 2.0,
            }),
            ..Mesh::default()
        }
    }

    fn triangle_mesh() -> Mesh {
        let vertices = vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        Mesh {
            faces: faces(&vertices, &[[0, 1, 2]], 0),
            normals: vec![[1.0, 0.0, 0.0]; 3],
            uvs: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]],
            vertices,
            ..Mesh::default()
        }
    }

    fn blade_mesh() -> Mesh {
        let vertices: Vec<[f32; 3]> = (0..16)
            .map(|i| [(i % 4) as f32, 0.0, (i / 4) as f32])
            .collect();
        Mesh {
            faces: saber::saber_faces(&vertices),
            normals: vec![[0.0, -1.0, 0.0]; 16],
            uvs: vec![(0..16).map(|i| [i as f32 / 16.0, 0.5]).collect()],
            vertices,
            diffuse_texture: Some("fx_blade_red".to_string()),
            ..Mesh::default()
        }
    }

    fn number(node: &mut ModelNode, next: &mut u16) {
        node.node_number = *next;
        *next += 1;
        for child in &mut node.children {
            number(child, next);
        }
    }

    fn sample_model() -> Model {
        let walk = quad_mesh();
        let tree = build_aabb_tree(&faces_from_mesh(&walk.vertices, &walk.faces).unwrap()).unwrap();

        let mut emitter_controllers = IndexMap::new();
        emitter_controllers.insert("birthrate".to_string(), vec![10.0]);
        emitter_controllers.insert("colorStart".to_string(), vec![1.0, 0.5, 0.0]);

        let mut mesh = ModelNode::new("mesh", NodeKind::Trimesh(quad_mesh()));
        mesh.position = [1.0, 2.0, 3.0];
        mesh.orientation = QUARTER_TURN;
        mesh.scale = 2.0;

        let mut bone = ModelNode::new("bone", NodeKind::Dummy);
        bone.position = [0.0, 0.0, 1.0];

        let light = Light {
            color: [0.5, 0.25, 1.0],
            negative: true,
            shadow_radius: Some(4.0),
            flare: true,
            flare_radius: 2.0,
            flares: vec![Flare {
                texture: "fxpa_flare".to_string(),
                size: 1.0,
                position: 0.5,
                color_shift: [1.0, 0.5, 0.0],
            }],
            ..Light::default()
        };

        let mut root = ModelNode::new("test", NodeKind::Dummy)
            .with_child(mesh.with_child(ModelNode::new("light", NodeKind::Light(light))))
            .with_child(bone)
            .with_child(ModelNode::new(
                "skin",
                NodeKind::Skin {
                    mesh: triangle_mesh(),
                    skin: Skin {
                        weights: vec![
                            vec![BoneWeight { bone: "bone".to_string(), weight: 1.0 }],
                            vec![
                                BoneWeight { bone: "bone".to_string(), weight: 0.5 },
                                BoneWeight { bone: "test".to_string(), weight: 0.5 },
                            ],
                            vec![BoneWeight { bone: "test".to_string(), weight: 1.0 }],
                        ],
                    },
                },
            ))
            .with_child(ModelNode::new(
                "dangly",
                NodeKind::Danglymesh {
                    mesh: triangle_mesh(),
                    dangly: Dangly {
                        constraints: vec![0.0, 128.0, 255.0],
                        displacement: 0.5,
                        tightness: 1.5,
                        period: 3.0,
                    },
                },
            ))
            .with_child(ModelNode::new("walk", NodeKind::Aabb { mesh: walk, tree }))
            .with_child(ModelNode::new(
                "fx",
                NodeKind::Emitter(Emitter {
                    update: "Fountain".to_string(),
                    render: "Normal".to_string(),
                    blend: "Lighten".to_string(),
                    texture: "fxpa_smoke".to_string(),
                    x_grid: 4,
                    y_grid: 4,
                    looping: true,
                    flags: EmitterFlags { bounce: true, other_bits: 0x4000, ..Default::default() },
                    controllers: emitter_controllers,
                    ..Emitter::default()
                }),
            ))
            .with_child(ModelNode::new(
                "ref",
                NodeKind::Reference(Reference { model: "w_blaster_01".to_string(), reattachable: true }),
            ))
            .with_child(ModelNode::new("blade", NodeKind::Lightsaber(blade_mesh())));
        number(&mut root, &mut 0);

        let mut keyframes = IndexMap::new();
        keyframes.insert("position".to_string(), vec![vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 1.0, 2.0, 4.0]]);
        keyframes.insert(
            "orientation".to_string(),
            vec![vec![0.0, 0.0, 0.0, 0.0, 1.0], [vec![1.0], QUARTER_TURN.to_vec()].concat()],
        );
        keyframes.insert("alpha".to_string(), vec![vec![0.0, 1.0, 0.1, 0.2], vec![1.0, 0.5, 0.0, 0.0]]);
        let mut animated_mesh = AnimationNode::new("mesh");
        animated_mesh.node_number = 1;
        animated_mesh.keyframes = keyframes;

        let mut animated_light = AnimationNode::new("light");
        animated_light.node_number = 2;
        animated_light.keyframes.insert("color".to_string(), vec![vec![0.0, 1.0, 1.0, 1.0]]);
        animated_mesh.children.push(animated_light);

        let mut animation_root = AnimationNode::new("test");
        animation_root.children.push(animated_mesh);

        Model {
            supermodel: Some("s_female01".to_string()),
            classification: Classification::Character,
            subclassification: 3,
            affected_by_fog: false,
            animation_root: Some("test".to_string()),
            bounding_box: [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0],
            radius: 2.0,
            animation_scale: 0.9,
            root,
            animations: vec![Animation {
                name: "pause1".to_string(),
                length: 1.0,
                transition: 0.25,
                animation_root: "test".to_string(),
                events: vec![AnimationEvent { time: 0.5, name: "snd_footstep".to_string() }],
                root: animation_root,
            }],
            ..Model::new("test")
        }
    }

    fn round_trip(model: &Model, options: &MdlWriteOptions) -> Model {
        let bytes = serialize_mdl(model, options).unwrap();
        parse_mdl_bytes(&bytes.mdl, &bytes.mdx).unwrap()
    }

    fn strip_normals(node: &mut ModelNode, out: &mut Vec<[f32; 3]>) {
        if let Some(mesh) = node.kind.mesh_mut() {
            out.append(&mut mesh.normals);
        }
        for child in &mut node.children {
            strip_normals(child, out);
        }
    }

    fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= tolerance, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_minimal_round_trip() {
        let model = Model::new("root");
        let bytes = serialize_mdl(&model, &MdlWriteOptions::default()).unwrap();

        assert_eq!(&bytes.mdl[0..4], &[0, 0, 0, 0]);
        let body_len = u32::from_le_bytes(bytes.mdl[4..8].try_into().unwrap());
        assert_eq!(body_len as usize, bytes.mdl.len() - 12);
        assert!(bytes.mdx.is_empty());

        let decoded = parse_mdl_bytes(&bytes.mdl, &bytes.mdx).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_full_round_trip() {
        let model = sample_model();
        assert_eq!(round_trip(&model, &MdlWriteOptions::default()), model);
    }

    #[test]
    fn test_tsl_round_trip_keeps_dirt_fields() {
        let mut model = sample_model();
        if let Some(mesh) = model.root.children[0].kind.mesh_mut() {
            mesh.dirt_enabled = true;
            mesh.dirt_texture = 3;
            mesh.dirt_coord_space = 2;
            mesh.hide_in_holograms = true;
        }
        let options = MdlWriteOptions { edition: Edition::Tsl, ..Default::default() };
        assert_eq!(round_trip(&model, &options), model);
    }

    #[test]
    fn test_xbox_round_trip_packs_normals() {
        let mut expected = sample_model();
        let options = MdlWriteOptions { platform: Platform::Xbox, ..Default::default() };
        let mut decoded = round_trip(&expected, &options);

        let (mut decoded_normals, mut expected_normals) = (Vec::new(), Vec::new());
        strip_normals(&mut decoded.root, &mut decoded_normals);
        strip_normals(&mut expected.root, &mut expected_normals);
        assert_eq!(decoded, expected);
        assert_close(
            decoded_normals.as_flattened(),
            expected_normals.as_flattened(),
            2e-3,
        );
    }

    #[test]
    fn test_compressed_orientation_keys() {
        let model = sample_model();
        let options = MdlWriteOptions { compress_quaternions: true, ..Default::default() };
        let mut decoded = round_trip(&model, &options);

        let rows = decoded.animations[0].root.children[0]
            .keyframes
            .shift_remove("orientation")
            .unwrap();
        let mut expected = model.clone();
        let expected_rows = expected.animations[0].root.children[0]
            .keyframes
            .shift_remove("orientation")
            .unwrap();
        for (row, expected_row) in rows.iter().zip(&expected_rows) {
            assert_close(row, expected_row, 2e-3);
        }

        // Static orientation is never packed.
        assert_eq!(decoded.root.children[0].orientation, QUARTER_TURN);
        expected.animations[0].root.children[0].keyframes.shift_remove("orientation");
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_animation_only_node_gets_a_name_slot() {
        let mut model = Model::new("root");
        let mut ghost = AnimationNode::new("ghost");
        ghost.node_number = 1;
        ghost.keyframes.insert("position".to_string(), vec![vec![0.0, 1.0, 1.0, 1.0]]);
        let mut root = AnimationNode::new("root");
        root.children.push(ghost);
        model.animations.push(Animation {
            name: "a".to_string(),
            length: 1.0,
            transition: 0.0,
            animation_root: "root".to_string(),
            events: Vec::new(),
            root,
        });

        assert_eq!(round_trip(&model, &MdlWriteOptions::default()), model);
    }

    #[test]
    fn test_zero_tangent_rows_keep_bezier_width() {
        let mut model = Model::new("root");
        let mut root = AnimationNode::new("root");
        root.keyframes.insert(
            "position".to_string(),
            vec![vec![0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
        );
        model.animations.push(Animation {
            name: "idle".to_string(),
            length: 1.0,
            transition: 0.25,
            animation_root: "root".to_string(),
            events: Vec::new(),
            root,
        });

        let decoded = round_trip(&model, &MdlWriteOptions::default());
        assert_eq!(decoded.animations[0].root.keyframes["position"][0].len(), 10);
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_encode_renumbers_nodes_in_pre_order() {
        let mut b = ModelNode::new("b", NodeKind::Dummy);
        b.node_number = 3;
        let mut a = ModelNode::new("a", NodeKind::Dummy).with_child(b);
        a.node_number = 7;
        let mut model = model_with(vec![a]);

        let mut track = AnimationNode::new("b");
        track.node_number = 42;
        track.keyframes.insert("position".to_string(), vec![vec![0.0, 1.0, 2.0, 3.0]]);
        let mut root = AnimationNode::new("root");
        root.children.push(track);
        model.animations.push(Animation {
            name: "walk".to_string(),
            length: 1.0,
            transition: 0.0,
            animation_root: "root".to_string(),
            events: Vec::new(),
            root,
        });

        let decoded = round_trip(&model, &MdlWriteOptions::default());
        assert_eq!(decoded.find_node("a").unwrap().node_number, 1);
        assert_eq!(decoded.find_node("b").unwrap().node_number, 2);
        let track = &decoded.animations[0].root.children[0];
        assert_eq!((track.name.as_str(), track.node_number), ("b", 2));
    }

    #[test]
    fn test_name_table_overflow_is_invalid_input() {
        let mut root = AnimationNode::new("root");
        root.children = (0..=u16::MAX).map(|i| AnimationNode::new(format!("n{i}"))).collect();
        let mut model = Model::new("root");
        model.animations.push(Animation {
            name: "crowd".to_string(),
            length: 0.0,
            transition: 0.0,
            animation_root: "root".to_string(),
            events: Vec::new(),
            root,
        });

        let err = serialize_mdl(&model, &MdlWriteOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    // ==================== Decode errors ====================

    fn model_with(children: Vec<ModelNode>) -> Model {
        let mut model = Model::new("root");
        model.root.children = children;
        model
    }

    fn minimal_bytes() -> MdlBytes {
        let model = model_with(vec![
            ModelNode::new("a", NodeKind::Dummy).with_child(ModelNode::new("b", NodeKind::Dummy)),
        ]);
        serialize_mdl(&model, &MdlWriteOptions::default()).unwrap()
    }

    fn word(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn root_offset(bytes: &[u8]) -> usize {
        12 + word(bytes, 12 + 40) as usize
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut bytes = minimal_bytes();
        bytes.mdl[0] = 1;
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::InvalidMdlSignature(1))
        ));
    }

    #[test]
    fn test_rejects_mdx_size_mismatch() {
        let bytes = minimal_bytes();
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &[0u8; 4]),
            Err(Error::MdxSizeMismatch { declared: 0, actual: 4 })
        ));
    }

    #[test]
    fn test_rejects_unknown_function_pointers() {
        let mut bytes = minimal_bytes();
        bytes.mdl[12..20].fill(0);
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::UnknownModelVersion { fn_ptr1: 0, fn_ptr2: 0 })
        ));
    }

    #[test]
    fn test_rejects_unknown_classification() {
        let mut bytes = minimal_bytes();
        bytes.mdl[12 + 80] = 0x03;
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::UnknownClassification(0x03))
        ));
    }

    #[test]
    fn test_rejects_array_count_mismatch() {
        let mut bytes = minimal_bytes();
        // Repeated count of the name array.
        bytes.mdl[12 + 80 + 112..12 + 80 + 116].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::ArrayCountMismatch { count: 3, repeated: 99 })
        ));
    }

    #[test]
    fn test_rejects_unknown_node_flags() {
        let mut bytes = minimal_bytes();
        let root = root_offset(&bytes.mdl);
        bytes.mdl[root..root + 2].copy_from_slice(&0x0003u16.to_le_bytes());
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::UnsupportedNodeType(0x0003))
        ));
    }

    #[test]
    fn test_rejects_unsupported_controller_columns() {
        let mut bytes = minimal_bytes();
        let root = root_offset(&bytes.mdl);
        let keys = 12 + word(&bytes.mdl, root + 56) as usize;
        bytes.mdl[keys + 12] = 0x20;
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::UnsupportedControllerColumns { controller: 8, columns: 0x20 })
        ));
    }

    #[test]
    fn test_rejects_child_cycle() {
        let mut bytes = minimal_bytes();
        let root = root_offset(&bytes.mdl);
        let children = 12 + word(&bytes.mdl, root + 44) as usize;
        let root_body_offset = (root - 12) as u32;
        bytes.mdl[children..children + 4].copy_from_slice(&root_body_offset.to_le_bytes());
        assert!(matches!(
            parse_mdl_bytes(&bytes.mdl, &bytes.mdx),
            Err(Error::MalformedTree { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let bytes = minimal_bytes();
        let shallow = MdlReadOptions { max_depth: 1 };
        assert!(matches!(
            parse_mdl_bytes_with_options(&bytes.mdl, &bytes.mdx, &shallow),
            Err(Error::MalformedTree { .. })
        ));
        let enough = MdlReadOptions { max_depth: 2 };
        assert!(parse_mdl_bytes_with_options(&bytes.mdl, &bytes.mdx, &enough).is_ok());
    }

    // ==================== Encode errors ====================

    fn assert_invalid(model: &Model) {
        assert!(matches!(
            serialize_mdl(model, &MdlWriteOptions::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_mesh_root() {
        let mut model = Model::new("root");
        model.root.kind = NodeKind::Trimesh(triangle_mesh());
        assert_invalid(&model);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let model = model_with(vec![
            ModelNode::new("a", NodeKind::Dummy),
            ModelNode::new("a", NodeKind::Dummy),
        ]);
        assert_invalid(&model);
    }

    #[test]
    fn test_rejects_face_past_vertices() {
        let mut mesh = triangle_mesh();
        mesh.faces.push(Face::new([0, 1, 7], 0));
        let model = model_with(vec![ModelNode::new("m", NodeKind::Trimesh(mesh))]);
        assert_invalid(&model);
    }

    #[test]
    fn test_rejects_unknown_bone() {
        let skin = Skin {
            weights: vec![vec![BoneWeight { bone: "nobody".to_string(), weight: 1.0 }]; 3],
        };
        let model = model_with(vec![ModelNode::new(
            "s",
            NodeKind::Skin { mesh: triangle_mesh(), skin },
        )]);
        assert_invalid(&model);
    }

    #[test]
    fn test_rejects_unknown_animation_root() {
        let mut model = Model::new("root");
        model.animation_root = Some("missing".to_string());
        assert_invalid(&model);
    }

    #[test]
    fn test_rejects_short_blade() {
        let mut blade = blade_mesh();
        blade.vertices.truncate(8);
        blade.normals.clear();
        blade.uvs.clear();
        blade.faces.clear();
        let model = model_with(vec![ModelNode::new("b", NodeKind::Lightsaber(blade))]);
        assert_invalid(&model);
    }
}
