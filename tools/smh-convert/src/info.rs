//! Model statistics for the `info` command

use std::fmt;
use std::path::Path;

use anyhow::Result;
use smh_model::{encode_to_vec, EncodeOptions, Model};
use tracing::warn;

use crate::convert::{load_model, model_name};

/// Summary of a loaded model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub file_size: u64,
    pub points: usize,
    pub normals: usize,
    pub tex_coords: usize,
    /// Triangle count per part
    pub faces: Vec<usize>,
    pub materials: usize,
    pub nodes: usize,
    pub node_depth: usize,
    pub global_properties: Vec<String>,
    /// Binary size without compression passes, `None` if not encodable
    pub literal_size: Option<usize>,
    /// Binary size with every compression pass, `None` if not encodable
    pub optimized_size: Option<usize>,
}

impl ModelInfo {
    pub fn from_model(name: String, file_size: u64, model: &Model) -> Self {
        let encoded_size = |options: &EncodeOptions| match encode_to_vec(model, options) {
            Ok(bytes) => Some(bytes.len()),
            Err(e) => {
                warn!("Cannot re-encode {}: {}", name, e);
                None
            }
        };
        let literal_size = encoded_size(&EncodeOptions::literal());
        let optimized_size = literal_size.and_then(|_| encoded_size(&EncodeOptions::all()));

        Self {
            name,
            file_size,
            points: model.points_count(),
            normals: model.normals_count(),
            tex_coords: model.tex_coords_count(),
            faces: model.faces_count(),
            materials: model.materials.len(),
            nodes: model.node_count(),
            node_depth: model.node_depth(),
            global_properties: model.global_properties.clone(),
            literal_size,
            optimized_size,
        }
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.name)?;
        writeln!(f, "  File size: {} bytes", self.file_size)?;
        writeln!(f, "  Points: {}", self.points)?;
        writeln!(f, "  Normals: {}", self.normals)?;
        writeln!(f, "  Tex coords: {}", self.tex_coords)?;
        writeln!(
            f,
            "  Parts: {} ({} faces)",
            self.faces.len(),
            self.faces.iter().sum::<usize>()
        )?;
        writeln!(f, "  Materials: {}", self.materials)?;
        writeln!(f, "  Nodes: {} (depth {})", self.nodes, self.node_depth)?;
        if !self.global_properties.is_empty() {
            writeln!(f, "  Properties: {}", self.global_properties.join(", "))?;
        }
        match (self.literal_size, self.optimized_size) {
            (Some(literal), Some(optimized)) => writeln!(
                f,
                "  Binary size: {} bytes literal, {} bytes optimized",
                literal, optimized
            ),
            _ => writeln!(f, "  Binary size: not encodable"),
        }
    }
}

/// Load a model file and summarise it
pub fn inspect(path: &Path) -> Result<ModelInfo> {
    let file_size = std::fs::metadata(path)?.len();
    let model = load_model(path)?;
    Ok(ModelInfo::from_model(model_name(path), file_size, &model))
}
