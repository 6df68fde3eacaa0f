//! Build plan generation from parsed descriptors.
//!
//! The plan is plain text for the make engine:
//! - one rendered descriptor per directory (`.Rules.mk.build`)
//! - one build-variables file with global settings and per-directory
//!   `TGTCCSID_` / `OBJPATH_` values

pub mod build_vars;
pub mod rules;
pub mod writer;

use std::path::PathBuf;

use crate::config::{EffectiveConfig, ProjectConfig};
use crate::ir::Descriptor;

pub use build_vars::render_build_vars;
pub use rules::{render_descriptor, render_rule};
pub use writer::write_descriptor;

/// Generated plan content, not yet written anywhere.
pub struct GeneratedPlan {
    /// Rendered descriptor content keyed by the directory it belongs in.
    pub rendered: Vec<(PathBuf, String)>,
    /// Build-variables file content.
    pub build_vars: String,
}

/// Generates the plan for a set of descriptors and resolved directory
/// settings.
pub fn generate(
    descriptors: &[Descriptor],
    project: &ProjectConfig,
    dirs: &[(PathBuf, EffectiveConfig)],
    color: bool,
) -> GeneratedPlan {
    let rendered = descriptors
        .iter()
        .map(|descriptor| (descriptor.containing_dir.clone(), render_descriptor(descriptor)))
        .collect();

    GeneratedPlan {
        rendered,
        build_vars: render_build_vars(project, dirs, color),
    }
}
