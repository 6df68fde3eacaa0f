//! Project configuration: the project record, directory override records,
//! environment placeholders, and the planner's own settings.

pub mod cascade;
pub mod env;
pub mod overrides;
pub mod project;

use std::path::PathBuf;

pub use cascade::{objlib_to_path, Cascade, EffectiveConfig};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use overrides::{DirOverride, IBMI_JSON};
pub use project::ProjectConfig;

/// Project record file name.
pub const IPROJ_JSON: &str = "iproj.json";

/// Rendered descriptor written next to each `Rules.mk`.
pub const RULES_MK_BUILD: &str = ".Rules.mk.build";

/// Configuration for the build planner.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Project root, holding `iproj.json`.
    pub project_dir: PathBuf,

    /// Descriptor file name searched in every directory.
    pub descriptor_name: String,

    /// Override record file name.
    pub override_name: String,

    /// Project record file name.
    pub project_record: String,

    /// Rendered descriptor file name.
    pub rendered_name: String,

    /// Requested selectors; empty builds everything.
    pub selectors: Vec<String>,

    /// Value of `COLOR_TTY` in the build variables.
    pub color: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            descriptor_name: crate::frontend::rules_mk::RULES_MK.to_string(),
            override_name: IBMI_JSON.to_string(),
            project_record: IPROJ_JSON.to_string(),
            rendered_name: RULES_MK_BUILD.to_string(),
            selectors: Vec::new(),
            color: false,
        }
    }
}

impl PlannerConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    pub fn project_record_path(&self) -> PathBuf {
        self.project_dir.join(&self.project_record)
    }
}
