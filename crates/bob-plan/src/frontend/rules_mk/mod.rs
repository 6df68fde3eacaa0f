//! `Rules.mk` frontend.

pub mod lexer;
pub mod member_text;
pub mod parser;

use std::path::{Path, PathBuf};

use super::Frontend;
use crate::diagnostic::PlanError;
pub use parser::{parse_file, parse_str, Parsed};

/// Default descriptor file name.
pub const RULES_MK: &str = "Rules.mk";

/// Frontend for make-style `Rules.mk` descriptors.
pub struct RulesMkFrontend {
    file_name: String,
}

impl RulesMkFrontend {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Default for RulesMkFrontend {
    fn default() -> Self {
        Self::new(RULES_MK)
    }
}

impl Frontend for RulesMkFrontend {
    fn format(&self) -> &str {
        "rules.mk"
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn parse_descriptor(&mut self, path: &Path, include_dirs: &[PathBuf]) -> Result<Parsed, PlanError> {
        parse_file(path, include_dirs)
    }
}
