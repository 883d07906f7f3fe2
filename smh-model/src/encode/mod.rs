//! Binary stream encoder
//!
//! Encoding runs in three phases: validate the model, build every compressed
//! stream in memory, then write. Only I/O errors can occur once the first byte
//! has been written.

mod optimize;

#[cfg(test)]
mod tests;

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EncodeError;
use crate::io::ModelWriter;
use crate::model::{Material, Model, Node};
use crate::validate::validate;
use crate::NORMAL_SIZE;

use optimize::{face_stream, keyed_stream, normal_stream};

/// Compression passes applied by the encoder
///
/// Every pass is optional; with all of them disabled the encoder writes plain
/// literals and empty lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Write a point equal to its predecessor as a repeat sentinel
    pub optimize_points: bool,
    /// Replace frequent points with key table references
    pub index_points: bool,
    /// Collapse runs of equal normals into a count
    pub optimize_normals: bool,
    /// Replace frequent normals with normals index references
    pub index_normals: bool,
    /// Write a UV pair equal to its predecessor as a repeat sentinel
    pub optimize_tex_coords: bool,
    /// Replace frequent UV pairs with key table references
    pub index_tex_coords: bool,
    /// Collapse ascending index runs in parts
    pub optimize_parts: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl EncodeOptions {
    /// Every compression pass enabled
    pub const fn all() -> Self {
        Self {
            optimize_points: true,
            index_points: true,
            optimize_normals: true,
            index_normals: true,
            optimize_tex_coords: true,
            index_tex_coords: true,
            optimize_parts: true,
        }
    }

    /// No compression: literals only
    pub const fn literal() -> Self {
        Self {
            optimize_points: false,
            index_points: false,
            optimize_normals: false,
            index_normals: false,
            optimize_tex_coords: false,
            index_tex_coords: false,
            optimize_parts: false,
        }
    }

    /// Whether every pass is disabled
    pub fn is_literal(&self) -> bool {
        *self == Self::literal()
    }
}

/// Sizes of the streams produced by one encode call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Total bytes written
    pub bytes: usize,
    /// Entries in the points key table
    pub points_keys: usize,
    /// Entries in the normals index table
    pub normals_indices: usize,
    /// Entries in the tex coords key table
    pub tex_coords_keys: usize,
    /// Scalars in the points stream
    pub points_scalars: usize,
    /// Scalars in the normals stream
    pub normals_scalars: usize,
    /// Scalars in the tex coords stream
    pub tex_coords_scalars: usize,
    /// Values across all part streams
    pub part_values: usize,
}

/// Encode a model into the binary format
///
/// The model is validated first; any [`EncodeError`] other than `Io` is
/// returned before anything is written to `output`.
pub fn encode<W: Write>(
    model: &Model,
    output: W,
    options: &EncodeOptions,
) -> Result<EncodeStats, EncodeError> {
    validate(model)?;

    let points = keyed_stream(&model.points, options.optimize_points, options.index_points);
    let normals = normal_stream(
        &model.normals,
        options.optimize_normals,
        options.index_normals,
    );
    let tex_coords = keyed_stream(
        &model.tex_coords,
        options.optimize_tex_coords,
        options.index_tex_coords,
    );
    let parts = model
        .parts
        .iter()
        .enumerate()
        .map(|(part, indices)| face_stream(part, indices, options.optimize_parts))
        .collect::<Result<Vec<_>, _>>()?;

    let mut writer = ModelWriter::new(output);

    writer.write_properties(&model.global_properties)?;

    // Lookup tables
    writer.write_u16_count(points.keys.len())?;
    writer.write_f32_slice(&points.keys)?;
    writer.write_f32_slice(&points.indices)?;

    writer.write_u16_count(normals.indices.len() / NORMAL_SIZE)?;
    writer.write_f32_slice(&normals.indices)?;

    writer.write_u16_count(tex_coords.keys.len())?;
    writer.write_f32_slice(&tex_coords.keys)?;
    writer.write_f32_slice(&tex_coords.indices)?;

    // Vertex data
    writer.write_u16_count(model.points.len())?;
    writer.write_f32_slice(&points.stream)?;
    writer.write_u16_count(model.normals.len())?;
    writer.write_f32_slice(&normals.stream)?;
    writer.write_u16_count(model.tex_coords.len())?;
    writer.write_f32_slice(&tex_coords.stream)?;

    writer.write_u8_count(parts.len())?;
    for (indices, stream) in model.parts.iter().zip(&parts) {
        writer.write_u16_count(indices.len())?;
        for &value in stream {
            writer.write_i16(value)?;
        }
    }

    writer.write_u8_count(model.materials.len())?;
    for material in &model.materials {
        write_material(&mut writer, material)?;
    }

    write_nodes(&mut writer, &model.nodes)?;
    writer.flush()?;

    let stats = EncodeStats {
        bytes: writer.written(),
        points_keys: points.keys.len(),
        normals_indices: normals.indices.len() / NORMAL_SIZE,
        tex_coords_keys: tex_coords.keys.len(),
        points_scalars: points.stream.len(),
        normals_scalars: normals.stream.len(),
        tex_coords_scalars: tex_coords.stream.len(),
        part_values: parts.iter().map(Vec::len).sum(),
    };

    debug!(
        bytes = stats.bytes,
        points_keys = stats.points_keys,
        normals_indices = stats.normals_indices,
        tex_coords_keys = stats.tex_coords_keys,
        "Encoded model"
    );

    Ok(stats)
}

/// Encode a model into a new buffer
pub fn encode_to_vec(model: &Model, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    encode(model, &mut buf, options)?;
    Ok(buf)
}

fn texture_path(path: &str) -> &str {
    if path.trim().is_empty() { "" } else { path }
}

fn write_material<W: Write>(
    writer: &mut ModelWriter<W>,
    material: &Material,
) -> Result<(), EncodeError> {
    for color in [&material.ambient, &material.diffuse, &material.specular] {
        for &channel in color {
            writer.write_u8(channel)?;
        }
    }
    writer.write_u8(material.opacity)?;
    writer.write_f32(material.shininess)?;
    writer.write_string(texture_path(&material.diffuse_texture))?;
    writer.write_string(texture_path(&material.specular_texture))
}

/// Write the node forest depth-first, each node followed by its children
fn write_nodes<W: Write>(writer: &mut ModelWriter<W>, roots: &[Node]) -> Result<(), EncodeError> {
    writer.write_u8_count(roots.len())?;

    let mut stack = vec![roots.iter()];
    while let Some(siblings) = stack.last_mut() {
        let Some(node) = siblings.next() else {
            stack.pop();
            continue;
        };

        writer.write_string(&node.id)?;
        writer.write_f32_slice(&node.translation)?;
        writer.write_f32_slice(&node.rotation)?;
        writer.write_f32_slice(&node.scale)?;
        writer.write_properties(&node.properties)?;

        writer.write_u8_count(node.node_parts.len())?;
        for node_part in &node.node_parts {
            writer.write_u8(node_part.part_index)?;
            writer.write_u8(node_part.material_index)?;
        }

        writer.write_u8_count(node.children.len())?;
        stack.push(node.children.iter());
    }

    Ok(())
}
