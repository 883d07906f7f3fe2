//! Canonical model types
//!
//! A fully decoded, compression-free mesh. Produced by the decoder or by an
//! external loader and treated as read-only afterwards. No field is optional:
//! absence is an empty string or an empty sequence.

use serde::{Deserialize, Serialize};

use crate::FACE_SIZE;

/// Canonical mesh model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Vertex positions
    pub points: Vec<[f32; 3]>,

    /// Vertex normals, unit length by convention (empty when the mesh has none)
    pub normals: Vec<[f32; 3]>,

    /// Texture coordinates
    pub tex_coords: Vec<[f32; 2]>,

    /// Mesh partitions, each a triangle list of vertex indices
    pub parts: Vec<Vec<u16>>,

    /// Materials referenced by node parts
    pub materials: Vec<Material>,

    /// Root nodes of the scene forest
    pub nodes: Vec<Node>,

    /// Opaque tags attached to the whole model
    pub global_properties: Vec<String>,
}

impl Model {
    /// Number of vertex positions
    pub fn points_count(&self) -> usize {
        self.points.len()
    }

    /// Number of normals (0 signals "no normals")
    pub fn normals_count(&self) -> usize {
        self.normals.len()
    }

    /// Number of texture coordinates
    pub fn tex_coords_count(&self) -> usize {
        self.tex_coords.len()
    }

    /// Whether the mesh carries normals
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Triangle count of every part, in part order
    pub fn faces_count(&self) -> Vec<usize> {
        self.parts.iter().map(|part| part.len() / FACE_SIZE).collect()
    }

    /// Total number of nodes in the forest, children included
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Node::subtree_len).sum()
    }

    /// Depth of the deepest node (0 for an empty forest)
    pub fn node_depth(&self) -> usize {
        self.nodes.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Same model with normals removed
    pub fn without_normals(self) -> Self {
        Self {
            normals: Vec::new(),
            ..self
        }
    }
}

/// Surface material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Ambient color (RGB, 0-255)
    pub ambient: [u8; 3],
    /// Diffuse color (RGB, 0-255)
    pub diffuse: [u8; 3],
    /// Specular color (RGB, 0-255)
    pub specular: [u8; 3],
    /// Opacity (0 = transparent, 255 = opaque)
    pub opacity: u8,
    pub shininess: f32,
    /// Diffuse texture path, empty if none
    pub diffuse_texture: String,
    /// Specular texture path, empty if none
    pub specular_texture: String,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0; 3],
            diffuse: [255; 3],
            specular: [0; 3],
            opacity: 255,
            shininess: 0.0,
            diffuse_texture: String::new(),
            specular_texture: String::new(),
        }
    }
}

impl Material {
    pub fn has_diffuse_texture(&self) -> bool {
        !self.diffuse_texture.is_empty()
    }

    pub fn has_specular_texture(&self) -> bool {
        !self.specular_texture.is_empty()
    }
}

/// Scene node
///
/// Each node exclusively owns its children; the hierarchy is a forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Node name, may be empty
    pub id: String,
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Parts rendered by this node
    pub node_parts: Vec<NodePart>,
    pub children: Vec<Node>,
    /// Opaque tags attached to this node
    pub properties: Vec<String>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: String::new(),
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            node_parts: Vec::new(),
            children: Vec::new(),
            properties: Vec::new(),
        }
    }
}

impl Node {
    /// Create an identity-transform node with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    /// Depth of this subtree (1 for a leaf)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

/// A (part, material) pairing rendered by a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePart {
    /// Index into [`Model::parts`]
    pub part_index: u8,
    /// Index into [`Model::materials`]
    pub material_index: u8,
}

impl NodePart {
    pub fn new(part_index: u8, material_index: u8) -> Self {
        Self {
            part_index,
            material_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Model {
        let mut root = Node::new("root");
        let mut arm = Node::new("arm");
        arm.children.push(Node::new("hand"));
        root.children.push(arm);
        root.children.push(Node::new("leg"));

        Model {
            parts: vec![vec![0, 1, 2, 2, 1, 3], vec![]],
            nodes: vec![root, Node::new("light")],
            ..Model::default()
        }
    }

    #[test]
    fn test_faces_count() {
        assert_eq!(tree().faces_count(), vec![2, 0]);
    }

    #[test]
    fn test_node_count_and_depth() {
        let model = tree();
        assert_eq!(model.node_count(), 5);
        assert_eq!(model.node_depth(), 3);
        assert_eq!(Model::default().node_depth(), 0);
    }

    #[test]
    fn test_without_normals() {
        let model = Model {
            normals: vec![[0.0, 1.0, 0.0]],
            ..Model::default()
        };
        assert!(model.has_normals());
        assert!(!model.without_normals().has_normals());
    }

    #[test]
    fn test_json_defaults() {
        // Missing fields fall back to identity transforms and empty lists
        let model: Model =
            serde_json::from_str(r#"{ "nodes": [ { "id": "n" } ] }"#).unwrap();
        assert_eq!(model.nodes[0].scale, [1.0; 3]);
        assert_eq!(model.nodes[0].rotation, [0.0, 0.0, 0.0, 1.0]);
        assert!(model.points.is_empty());
    }
}
