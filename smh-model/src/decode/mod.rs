//! Binary stream decoder
//!
//! Reads every section in wire order and resolves all compression sentinels,
//! so the returned [`Model`] holds plain arrays only. Lookup tables live for
//! the duration of one call and are dropped once the model is assembled.

mod streams;


use std::io::Read;

use tracing::debug;

use crate::error::{DecodeError, Section};
use crate::io::ModelReader;
use crate::model::{Material, Model, Node, NodePart};
use crate::{NORMAL_SIZE, POINT_SIZE, TEX_COORD_SIZE};

use streams::{read_faces, read_key_table, read_keyed_stream, read_normals};

/// Decode a model from a binary stream
///
/// The reader is consumed up to the end of the node forest; trailing bytes are
/// left unread.
///
/// # Example
/// ```ignore
/// let file = std::fs::File::open("ship.smhmb")?;
/// let model = decode(std::io::BufReader::new(file))?;
/// println!("{} points, {} parts", model.points_count(), model.parts.len());
/// ```
pub fn decode<R: Read>(input: R) -> Result<Model, DecodeError> {
    let mut reader = ModelReader::new(input);

    reader.enter(Section::GlobalProperties);
    let global_properties = reader.read_properties()?;

    // Lookup tables
    reader.enter(Section::PointsKeys);
    let points_keys = read_key_table(&mut reader)?;
    reader.enter(Section::PointsIndices);
    let points_indices = reader.read_f32_vec(points_keys.len() * POINT_SIZE)?;

    reader.enter(Section::NormalsIndices);
    let normals_len = reader.read_u16()? as usize;
    let normals_indices = reader.read_f32_vec(normals_len * NORMAL_SIZE)?;

    reader.enter(Section::TexCoordsKeys);
    let tex_coords_keys = read_key_table(&mut reader)?;
    reader.enter(Section::TexCoordsIndices);
    let tex_coords_indices = reader.read_f32_vec(tex_coords_keys.len() * TEX_COORD_SIZE)?;

    debug!(
        points_keys = points_keys.len(),
        normals_indices = normals_len,
        tex_coords_keys = tex_coords_keys.len(),
        "Read lookup tables"
    );

    // Vertex data
    reader.enter(Section::Points);
    let points = read_keyed_stream::<_, POINT_SIZE>(&mut reader, &points_keys, &points_indices)?;

    reader.enter(Section::Normals);
    let normals = read_normals(&mut reader, &normals_indices)?;

    reader.enter(Section::TexCoords);
    let tex_coords = read_keyed_stream::<_, TEX_COORD_SIZE>(
        &mut reader,
        &tex_coords_keys,
        &tex_coords_indices,
    )?;

    debug!(
        points = points.len(),
        normals = normals.len(),
        tex_coords = tex_coords.len(),
        "Read vertex data"
    );

    reader.enter(Section::Parts);
    let parts_len = reader.read_u8()? as usize;
    let mut parts = Vec::with_capacity(parts_len);
    for part in 0..parts_len {
        parts.push(read_faces(&mut reader, part, points.len())?);
    }

    reader.enter(Section::Materials);
    let materials = read_materials(&mut reader)?;

    reader.enter(Section::Nodes);
    let nodes = read_nodes(&mut reader, parts.len(), materials.len())?;

    debug!(
        parts = parts.len(),
        materials = materials.len(),
        root_nodes = nodes.len(),
        "Decoded model"
    );

    Ok(Model {
        points,
        normals,
        tex_coords,
        parts,
        materials,
        nodes,
        global_properties,
    })
}

/// Decode a model from an in-memory buffer
pub fn decode_bytes(data: &[u8]) -> Result<Model, DecodeError> {
    decode(data)
}

fn read_color<R: Read>(reader: &mut ModelReader<R>) -> Result<[u8; 3], DecodeError> {
    Ok([reader.read_u8()?, reader.read_u8()?, reader.read_u8()?])
}

/// Read a texture path, mapping whitespace-only paths to "no texture"
fn read_texture<R: Read>(reader: &mut ModelReader<R>) -> Result<String, DecodeError> {
    let path = reader.read_string()?;
    if path.trim().is_empty() {
        Ok(String::new())
    } else {
        Ok(path)
    }
}

fn read_materials<R: Read>(reader: &mut ModelReader<R>) -> Result<Vec<Material>, DecodeError> {
    let len = reader.read_u8()? as usize;
    let mut materials = Vec::with_capacity(len);

    for _ in 0..len {
        let ambient = read_color(reader)?;
        let diffuse = read_color(reader)?;
        let specular = read_color(reader)?;
        let opacity = reader.read_u8()?;
        let shininess = reader.read_f32()?;
        let diffuse_texture = read_texture(reader)?;
        let specular_texture = read_texture(reader)?;

        materials.push(Material {
            ambient,
            diffuse,
            specular,
            opacity,
            shininess,
            diffuse_texture,
            specular_texture,
        });
    }

    Ok(materials)
}

/// A node whose children are still being read
struct PendingNode {
    node: Node,
    remaining_children: usize,
}

/// Read the node forest
///
/// Nodes are written depth-first with each child list following its parent's
/// header. An explicit stack of partially read nodes replaces recursion so a
/// deep tree cannot exhaust the call stack.
fn read_nodes<R: Read>(
    reader: &mut ModelReader<R>,
    parts: usize,
    materials: usize,
) -> Result<Vec<Node>, DecodeError> {
    let roots_len = reader.read_u8()? as usize;
    let mut roots = Vec::with_capacity(roots_len);
    let mut stack: Vec<PendingNode> = Vec::new();

    while roots.len() < roots_len {
        let (node, children) = read_node_header(reader, parts, materials)?;
        stack.push(PendingNode {
            node,
            remaining_children: children,
        });

        // Attach every finished node to its parent, or to the roots
        while let Some(top) = stack.last_mut() {
            if top.remaining_children > 0 {
                top.remaining_children -= 1;
                let (child, children) = read_node_header(reader, parts, materials)?;
                stack.push(PendingNode {
                    node: child,
                    remaining_children: children,
                });
                continue;
            }

            let Some(done) = stack.pop() else { break };
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => roots.push(done.node),
            }
        }
    }

    Ok(roots)
}

/// Read one node without its children, returning the declared child count
fn read_node_header<R: Read>(
    reader: &mut ModelReader<R>,
    parts: usize,
    materials: usize,
) -> Result<(Node, usize), DecodeError> {
    let id = reader.read_string()?;
    let translation = reader.read_f32_array::<3>()?;
    let rotation = reader.read_f32_array::<4>()?;
    let scale = reader.read_f32_array::<3>()?;
    let properties = reader.read_properties()?;

    let node_parts_len = reader.read_u8()? as usize;
    let mut node_parts = Vec::with_capacity(node_parts_len);
    for _ in 0..node_parts_len {
        let part_index = reader.read_u8()?;
        let material_index = reader.read_u8()?;
        if part_index as usize >= parts || material_index as usize >= materials {
            return Err(DecodeError::NodePartOutOfRange {
                part_index,
                material_index,
                parts,
                materials,
            });
        }
        node_parts.push(NodePart::new(part_index, material_index));
    }

    let children = reader.read_u8()? as usize;

    let node = Node {
        id,
        translation,
        rotation,
        scale,
        node_parts,
        children: Vec::with_capacity(children),
        properties,
    };
    Ok((node, children))
}
