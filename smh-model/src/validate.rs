//! Encoder pre-flight checks
//!
//! Everything the wire format cannot represent is rejected here, before a
//! single byte is written.

use crate::error::{EncodeError, Section};
use crate::model::{Model, Node, NodePart};
use crate::{FACE_SIZE, MAX_STRING_LEN, MAX_U16_COUNT, MAX_U8_COUNT};

/// Check that a model can be written to the binary format
pub(crate) fn validate(model: &Model) -> Result<(), EncodeError> {
    check_u8_count("global properties", model.global_properties.len())?;
    check_strings(&model.global_properties)?;

    check_u16_count("points", model.points.len())?;
    check_u16_count("normals", model.normals.len())?;
    check_u16_count("tex coords", model.tex_coords.len())?;

    check_finite_stream(Section::Points, model.points.as_flattened())?;
    check_finite_stream(Section::TexCoords, model.tex_coords.as_flattened())?;
    check_normals(model.normals.as_flattened())?;

    check_u8_count("parts", model.parts.len())?;
    for (part, indices) in model.parts.iter().enumerate() {
        check_part(part, indices, model.points.len())?;
    }

    check_u8_count("materials", model.materials.len())?;
    for material in &model.materials {
        check_string(&material.diffuse_texture)?;
        check_string(&material.specular_texture)?;
    }

    check_u8_count("root nodes", model.nodes.len())?;
    let mut stack: Vec<&Node> = model.nodes.iter().collect();
    while let Some(node) = stack.pop() {
        check_node(node, model)?;
        stack.extend(node.children.iter());
    }

    Ok(())
}

fn check_u8_count(what: &'static str, count: usize) -> Result<(), EncodeError> {
    if count > MAX_U8_COUNT {
        return Err(EncodeError::TooMany {
            what,
            count,
            max: MAX_U8_COUNT,
        });
    }
    Ok(())
}

fn check_u16_count(what: &'static str, count: usize) -> Result<(), EncodeError> {
    if count > MAX_U16_COUNT {
        return Err(EncodeError::TooMany {
            what,
            count,
            max: MAX_U16_COUNT,
        });
    }
    Ok(())
}

fn check_string(value: &str) -> Result<(), EncodeError> {
    if value.len() > MAX_STRING_LEN {
        return Err(EncodeError::StringTooLong { len: value.len() });
    }
    Ok(())
}

fn check_strings(values: &[String]) -> Result<(), EncodeError> {
    values.iter().try_for_each(|value| check_string(value))
}

/// NaN is the repeat sentinel in points and tex coords streams
fn check_finite_stream(section: Section, values: &[f32]) -> Result<(), EncodeError> {
    match values.iter().position(|v| v.is_nan()) {
        Some(position) => Err(EncodeError::NonEncodableValue {
            section,
            position,
            value: values[position],
        }),
        None => Ok(()),
    }
}

/// Normal components outside [-1, 1] would be read as sentinels
fn check_normals(values: &[f32]) -> Result<(), EncodeError> {
    match values.iter().position(|v| v.is_nan() || v.abs() > 1.0) {
        Some(position) => Err(EncodeError::NonEncodableValue {
            section: Section::Normals,
            position,
            value: values[position],
        }),
        None => Ok(()),
    }
}

fn check_part(part: usize, indices: &[u16], points: usize) -> Result<(), EncodeError> {
    check_u16_count("part indices", indices.len())?;

    if indices.len() % FACE_SIZE != 0 {
        return Err(EncodeError::IncompleteTriangle {
            part,
            len: indices.len(),
        });
    }

    if let Some(position) = indices.iter().position(|&i| i as usize >= points) {
        return Err(EncodeError::FaceIndexOutOfRange {
            part,
            position,
            index: indices[position],
            points,
        });
    }

    Ok(())
}

fn check_node(node: &Node, model: &Model) -> Result<(), EncodeError> {
    check_string(&node.id)?;
    check_u8_count("node properties", node.properties.len())?;
    check_strings(&node.properties)?;
    check_u8_count("node parts", node.node_parts.len())?;
    check_u8_count("children", node.children.len())?;

    for &NodePart {
        part_index,
        material_index,
    } in &node.node_parts
    {
        if part_index as usize >= model.parts.len()
            || material_index as usize >= model.materials.len()
        {
            return Err(EncodeError::NodePartOutOfRange {
                part_index,
                material_index,
                parts: model.parts.len(),
                materials: model.materials.len(),
            });
        }
    }

    Ok(())
}
