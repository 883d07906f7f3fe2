//! Conversion sessions
//!
//! A session converts one input file into one output file. Inputs are canonical
//! JSON models or `.smhmb` binaries, either optionally gzipped.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use smh_model::{EncodeOptions, Model, BINARY_EXTENSION, TEXT_EXTENSION};
use walkdir::WalkDir;

const JSON_EXTENSION: &str = "json";
const GZIP_EXTENSION: &str = "gz";

/// Indent used in text output
const TEXT_INDENT: &str = "  ";

/// Failed model names listed in a run summary
const MAX_REPORTED_FAILURES: usize = 5;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Compact binary (.smhmb)
    #[default]
    Binary,
    /// Human-readable dump (.smhmt)
    Text,
    /// Canonical model as JSON
    Json,
}

impl OutputType {
    pub fn extension(self) -> &'static str {
        match self {
            OutputType::Binary => BINARY_EXTENSION,
            OutputType::Text => TEXT_EXTENSION,
            OutputType::Json => JSON_EXTENSION,
        }
    }
}

/// Named encoder pass, as accepted by `--optimize` and manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Optimization {
    OptimizePoints,
    IndexPoints,
    OptimizeNormals,
    IndexNormals,
    OptimizeTexCoords,
    IndexTexCoords,
    OptimizeParts,
    All,
}

/// Build encoder options from a list of pass names
///
/// `None` means literal encoding; an empty list enables every pass.
pub fn encode_options(optimizations: Option<&[Optimization]>) -> EncodeOptions {
    let Some(optimizations) = optimizations else {
        return EncodeOptions::literal();
    };
    if optimizations.is_empty() || optimizations.contains(&Optimization::All) {
        return EncodeOptions::all();
    }

    let mut options = EncodeOptions::literal();
    for optimization in optimizations {
        match optimization {
            Optimization::OptimizePoints => options.optimize_points = true,
            Optimization::IndexPoints => options.index_points = true,
            Optimization::OptimizeNormals => options.optimize_normals = true,
            Optimization::IndexNormals => options.index_normals = true,
            Optimization::OptimizeTexCoords => options.optimize_tex_coords = true,
            Optimization::IndexTexCoords => options.index_tex_coords = true,
            Optimization::OptimizeParts => options.optimize_parts = true,
            Optimization::All => {}
        }
    }
    options
}

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Binary,
}

/// Detected input kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputKind {
    pub format: InputFormat,
    pub gzip: bool,
}

impl InputKind {
    /// Detect the format from the file name, looking through a `.gz` suffix
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let (name, gzip) = match name.strip_suffix(&format!(".{GZIP_EXTENSION}")) {
            Some(inner) => (inner.to_string(), true),
            None => (name, false),
        };

        let format = match Path::new(&name).extension()?.to_str()? {
            JSON_EXTENSION => InputFormat::Json,
            BINARY_EXTENSION => InputFormat::Binary,
            _ => return None,
        };
        Some(Self { format, gzip })
    }
}

/// Model name: the file name without format and `.gz` extensions
pub fn model_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match name.strip_suffix(&format!(".{GZIP_EXTENSION}")) {
        Some(inner) => inner.to_string(),
        None => name,
    };
    match Path::new(&name).file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => name,
    }
}

/// Expand input paths into model files
///
/// Files are taken as given; directories contribute their immediate children
/// with a recognised extension, sorted by path.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && InputKind::detect(p).is_some())
                .collect();
            found.sort();

            if found.is_empty() {
                tracing::warn!("No model files found in {}", path.display());
            }
            inputs.extend(found);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            bail!("Input not found: {}", path.display());
        }
    }

    Ok(inputs)
}

/// One input-to-output conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub input: PathBuf,
    pub output: PathBuf,
    pub output_type: OutputType,
    pub options: EncodeOptions,
    pub skip_normals: bool,
    pub compress: bool,
}

impl Session {
    /// Create a session writing next to `output_dir` (or next to the input)
    pub fn new(
        input: PathBuf,
        output_dir: Option<&Path>,
        output_type: OutputType,
        options: EncodeOptions,
    ) -> Self {
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let output = dir.join(format!("{}.{}", model_name(&input), output_type.extension()));

        Self {
            input,
            output,
            output_type,
            options,
            skip_normals: false,
            compress: false,
        }
    }

    /// Enable gzip output, appending `.gz` to the output path
    pub fn compressed(mut self) -> Self {
        if !self.compress {
            self.compress = true;
            let mut name = self.output.clone().into_os_string();
            name.push(format!(".{GZIP_EXTENSION}"));
            self.output = PathBuf::from(name);
        }
        self
    }

    pub fn name(&self) -> String {
        model_name(&self.input)
    }
}

/// Load a model from a JSON or binary file, gzipped or not
pub fn load_model(path: &Path) -> Result<Model> {
    let Some(kind) = InputKind::detect(path) else {
        bail!(
            "Unsupported input: {} (use .{JSON_EXTENSION} or .{BINARY_EXTENSION}, optionally .gz)",
            path.display()
        );
    };

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if kind.gzip {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let model = match kind.format {
        InputFormat::Json => serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON model {}", path.display()))?,
        InputFormat::Binary => smh_model::decode(reader)
            .with_context(|| format!("Failed to decode {}", path.display()))?,
    };
    Ok(model)
}

/// Serialize a model in the requested output format
pub fn render_model(
    model: &Model,
    output_type: OutputType,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    match output_type {
        OutputType::Binary => {
            let mut buf = Vec::new();
            let stats = smh_model::encode(model, &mut buf, options)?;
            tracing::debug!(
                bytes = stats.bytes,
                points_keys = stats.points_keys,
                normals_indices = stats.normals_indices,
                tex_coords_keys = stats.tex_coords_keys,
                "Encoded binary model"
            );
            Ok(buf)
        }
        OutputType::Text => {
            let mut buf = Vec::new();
            smh_model::write_text(model, &mut buf, TEXT_INDENT)?;
            Ok(buf)
        }
        OutputType::Json => Ok(serde_json::to_vec_pretty(model)?),
    }
}

/// Run one session: load, transform, write
pub fn run_session(session: &Session) -> Result<()> {
    if session.input == session.output {
        bail!("Output would overwrite input {}", session.input.display());
    }

    tracing::info!(
        "Converting {} -> {}",
        session.input.display(),
        session.output.display()
    );

    let mut model = load_model(&session.input)?;
    if session.skip_normals {
        model = model.without_normals();
    }

    let bytes = render_model(&model, session.output_type, &session.options)
        .with_context(|| format!("Failed to write {}", session.name()))?;

    let bytes = if session.compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&bytes)?;
        encoder.finish()?
    } else {
        bytes
    };

    if let Some(parent) = session.output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&session.output, &bytes)
        .with_context(|| format!("Failed to write {}", session.output.display()))?;

    tracing::info!("Wrote {} ({} bytes)", session.output.display(), bytes.len());
    Ok(())
}

/// Outcome of a batch of sessions
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    /// Names of failed models, in session order
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failure line listing at most a handful of model names
    pub fn failure_message(&self) -> String {
        let total = self.succeeded + self.failed.len();
        let mut names = self
            .failed
            .iter()
            .take(MAX_REPORTED_FAILURES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if self.failed.len() > MAX_REPORTED_FAILURES {
            names.push_str(&format!(
                " and {} more",
                self.failed.len() - MAX_REPORTED_FAILURES
            ));
        }
        format!("{} of {} models failed: {}", self.failed.len(), total, names)
    }
}

/// Count sessions per output path
fn output_counts(sessions: &[Session]) -> HashMap<&Path, usize> {
    let mut counts: HashMap<&Path, usize> = HashMap::new();
    for session in sessions {
        *counts.entry(session.output.as_path()).or_default() += 1;
    }
    counts
}

/// Run sessions sequentially or on the rayon pool
///
/// Every session runs regardless of earlier failures; each failure is logged
/// with its cause. Sessions that share an output path all fail without
/// writing anything.
pub fn run_sessions(sessions: &[Session], parallel: bool) -> RunSummary {
    use rayon::prelude::*;

    let counts = output_counts(sessions);
    let run = |session: &Session| {
        let shared = counts.get(session.output.as_path()).copied().unwrap_or(0);
        let result = if shared > 1 {
            Err(anyhow::anyhow!(
                "Output {} is shared by {} inputs",
                session.output.display(),
                shared
            ))
        } else {
            run_session(session)
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Failed to convert {}: {:#}", session.name(), e);
                Err(session.name())
            }
        }
    };

    let results: Vec<std::result::Result<(), String>> = if parallel {
        sessions.par_iter().map(run).collect()
    } else {
        sessions.iter().map(run).collect()
    };

    let mut summary = RunSummary::default();
    for result in results {
        match result {
            Ok(()) => summary.succeeded += 1,
            Err(name) => summary.failed.push(name),
        }
    }
    summary
}
