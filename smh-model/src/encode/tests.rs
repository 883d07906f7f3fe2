//! Encoder tests

use super::*;
use crate::decode::decode_bytes;
use crate::error::Section;
use crate::model::NodePart;

/// Flat grid of `size` × `size` quads with shared normals and a repeating UV
/// pattern
fn grid(size: u16) -> Model {
    let mut points = Vec::new();
    let mut tex_coords = Vec::new();
    for y in 0..=size {
        for x in 0..=size {
            points.push([x as f32, 0.0, y as f32]);
            tex_coords.push([(x % 2) as f32, (y % 2) as f32]);
        }
    }

    let stride = size + 1;
    let mut part = Vec::new();
    for y in 0..size {
        for x in 0..size {
            let i = y * stride + x;
            part.extend_from_slice(&[i, i + 1, i + stride, i + 1, i + stride + 1, i + stride]);
        }
    }

    Model {
        normals: vec![[0.0, 1.0, 0.0]; points.len()],
        points,
        tex_coords,
        parts: vec![part],
        materials: vec![Material::default()],
        nodes: vec![Node {
            node_parts: vec![NodePart::new(0, 0)],
            ..Node::new("grid")
        }],
        ..Model::default()
    }
}

#[test]
fn test_empty_model_bytes() {
    let bytes = encode_to_vec(&Model::default(), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0u8; 16]);
}

#[test]
fn test_literal_layout() {
    let model = Model {
        points: vec![[1.0, 2.0, 3.0]],
        ..Model::default()
    };
    let bytes = encode_to_vec(&model, &EncodeOptions::literal()).unwrap();

    assert_eq!(bytes.len(), 28);
    // Empty properties and lookup tables, then one point
    assert_eq!(&bytes[..9], &[0, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(&bytes[9..13], &1.0f32.to_be_bytes());
    assert_eq!(&bytes[17..21], &3.0f32.to_be_bytes());
}

#[test]
fn test_optimized_is_smaller() {
    let model = grid(8);
    let literal = encode_to_vec(&model, &EncodeOptions::literal()).unwrap();
    let optimized = encode_to_vec(&model, &EncodeOptions::all()).unwrap();

    assert!(optimized.len() < literal.len());
    assert_eq!(decode_bytes(&literal).unwrap(), model);
    assert_eq!(decode_bytes(&optimized).unwrap(), model);
}

#[test]
fn test_stats() {
    let model = grid(4);
    let mut buf = Vec::new();
    let stats = encode(&model, &mut buf, &EncodeOptions::all()).unwrap();

    assert_eq!(stats.bytes, buf.len());
    // Each of the four UV corners appears at least four times
    assert_eq!(stats.tex_coords_keys, 4);
    assert_eq!(stats.tex_coords_scalars, model.tex_coords.len());
    // One literal normal followed by a single run
    assert_eq!(stats.normals_indices, 0);
    assert_eq!(stats.normals_scalars, 4);
    assert_eq!(stats.points_keys, 0);
}

#[test]
fn test_invalid_model_writes_nothing() {
    let mut model = grid(2);
    model.parts[0].push(0);

    let mut buf = Vec::new();
    let err = encode(&model, &mut buf, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, EncodeError::IncompleteTriangle { part: 0, .. }));
    assert!(buf.is_empty());
}

#[test]
fn test_ambiguous_index_writes_nothing() {
    // -2 at position 1 fits a run of two in a three-index part
    let model = Model {
        points: vec![[0.0; 3]; 65535],
        parts: vec![vec![5, 65534, 0]],
        ..Model::default()
    };

    let mut buf = Vec::new();
    let err = encode(&model, &mut buf, &EncodeOptions::literal()).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::AmbiguousIndex {
            part: 0,
            position: 1,
            index: 65534,
        }
    ));
    assert!(buf.is_empty());
}

#[test]
fn test_blank_textures_normalized() {
    let model = Model {
        materials: vec![Material {
            diffuse_texture: " ".to_string(),
            specular_texture: "spec.png".to_string(),
            ..Material::default()
        }],
        ..Model::default()
    };

    let decoded = decode_bytes(&encode_to_vec(&model, &EncodeOptions::default()).unwrap()).unwrap();
    assert_eq!(decoded.materials[0].diffuse_texture, "");
    assert_eq!(decoded.materials[0].specular_texture, "spec.png");
}

#[test]
fn test_non_encodable_normal() {
    let model = Model {
        normals: vec![[0.0, 2.0, 0.0]],
        ..Model::default()
    };
    assert!(matches!(
        encode_to_vec(&model, &EncodeOptions::default()),
        Err(EncodeError::NonEncodableValue {
            section: Section::Normals,
            position: 1,
            ..
        })
    ));
}

#[test]
fn test_options_deserialize_defaults() {
    let options: EncodeOptions = serde_json::from_str(r#"{ "index_points": false }"#).unwrap();
    assert!(!options.index_points);
    assert!(options.optimize_points);
    assert!(EncodeOptions::literal().is_literal());
    assert!(!EncodeOptions::default().is_literal());
}
