//! convert.toml manifest parsing
//!
//! A manifest lists models to convert plus defaults shared by all of them.
//! Relative paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::convert::{encode_options, Optimization, OutputType, Session};

/// convert.toml manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct ConvertManifest {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Settings applied to every model unless overridden
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Output directory; defaults to each input's directory
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_type: OutputType,
    /// Encoder passes; absent means literal encoding
    pub optimize: Option<Vec<Optimization>>,
    #[serde(default)]
    pub skip_normals: bool,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output_dir: None,
            output_type: OutputType::default(),
            optimize: None,
            skip_normals: false,
            compress: false,
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

/// One model to convert
#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub input: PathBuf,
    /// Explicit output path (overrides output_dir)
    pub output: Option<PathBuf>,
    pub output_type: Option<OutputType>,
    pub optimize: Option<Vec<Optimization>>,
    pub skip_normals: Option<bool>,
    pub compress: Option<bool>,
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<ConvertManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    parse_manifest(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_manifest(content: &str) -> Result<ConvertManifest> {
    Ok(toml::from_str(content)?)
}

impl ConvertManifest {
    /// Expand the manifest into sessions, resolving paths against `base_dir`
    pub fn sessions(&self, base_dir: &Path) -> Vec<Session> {
        let defaults = &self.defaults;
        let output_dir = defaults.output_dir.as_ref().map(|dir| base_dir.join(dir));

        self.models
            .iter()
            .map(|entry| {
                let output_type = entry.output_type.unwrap_or(defaults.output_type);
                let optimize = entry.optimize.as_ref().or(defaults.optimize.as_ref());
                let options = encode_options(optimize.map(Vec::as_slice));

                let mut session = Session::new(
                    base_dir.join(&entry.input),
                    output_dir.as_deref(),
                    output_type,
                    options,
                );
                if let Some(output) = &entry.output {
                    session.output = base_dir.join(output);
                }
                session.skip_normals = entry.skip_normals.unwrap_or(defaults.skip_normals);
                if entry.compress.unwrap_or(defaults.compress) {
                    session = session.compressed();
                }
                session
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smh_model::EncodeOptions;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(
            r#"
            [defaults]
            output_dir = "out"
            optimize = ["all"]
            compress = true

            [[models]]
            input = "models/ship.json"

            [[models]]
            input = "models/crate.smhmb"
            output = "debug/crate.smhmt"
            output_type = "text"
            optimize = ["optimize-parts"]
            compress = false
            skip_normals = true
            "#,
        )
        .unwrap();

        assert!(manifest.defaults.parallel);
        assert_eq!(manifest.models.len(), 2);

        let sessions = manifest.sessions(Path::new("assets"));
        assert_eq!(sessions[0].input, PathBuf::from("assets/models/ship.json"));
        assert_eq!(sessions[0].output, PathBuf::from("assets/out/ship.smhmb.gz"));
        assert_eq!(sessions[0].options, EncodeOptions::all());
        assert!(!sessions[0].skip_normals);

        assert_eq!(sessions[1].output, PathBuf::from("assets/debug/crate.smhmt"));
        assert_eq!(sessions[1].output_type, OutputType::Text);
        assert!(sessions[1].options.optimize_parts);
        assert!(!sessions[1].options.optimize_points);
        assert!(!sessions[1].compress);
        assert!(sessions[1].skip_normals);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = parse_manifest("").unwrap();
        assert!(manifest.models.is_empty());
        assert_eq!(manifest.defaults.output_type, OutputType::Binary);
        assert!(manifest.defaults.optimize.is_none());
    }

    #[test]
    fn test_unknown_optimization_rejected() {
        assert!(parse_manifest("[defaults]\noptimize = [\"shrink\"]\n").is_err());
    }
}
