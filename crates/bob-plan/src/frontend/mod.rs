//! Descriptor frontends.
//!
//! A frontend knows one descriptor file format and turns a file of that
//! format into a [`Descriptor`](crate::ir::Descriptor). The planner only
//! talks to the [`Frontend`] trait, so discovery, the config cascade and
//! plan rendering are shared by every format.

pub mod rules_mk;

use std::path::{Path, PathBuf};

use crate::diagnostic::PlanError;
pub use rules_mk::Parsed;

/// Trait for descriptor frontends.
pub trait Frontend {
    /// Returns the format name (e.g., "rules.mk").
    fn format(&self) -> &str;

    /// Returns the descriptor file name searched for in every directory.
    fn file_name(&self) -> &str;

    /// Parses one descriptor file. Bare dependency names are searched in the
    /// descriptor's directory, then in `include_dirs`.
    fn parse_descriptor(&mut self, path: &Path, include_dirs: &[PathBuf]) -> Result<Parsed, PlanError>;
}
