//! smh-convert library
//!
//! Conversion sessions, batch manifests, and model inspection used by the
//! `smh-convert` binary.

pub mod convert;
pub mod info;
pub mod manifest;

pub use convert::{
    collect_inputs, load_model, run_session, run_sessions, OutputType, RunSummary, Session,
};
pub use manifest::{load_manifest, ConvertManifest};
