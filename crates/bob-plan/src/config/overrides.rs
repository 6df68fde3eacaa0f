//! Per-directory override records, `.ibmi.json`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::env::{self, Environment};
use super::project::{validate_ccsid, RawCcsid};
use crate::diagnostic::PlanError;

/// Default override record file name.
pub const IBMI_JSON: &str = ".ibmi.json";

#[derive(Debug, Default, Deserialize)]
struct RawOverride {
    version: Option<String>,
    build: Option<RawBuild>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    #[serde(rename = "tgtCcsid")]
    tgt_ccsid: Option<RawCcsid>,
    objlib: Option<String>,
}

/// The fields a directory sets for itself. Unset fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirOverride {
    pub version: Option<String>,
    pub tgt_ccsid: Option<String>,
    /// Expanded, but sentinels are left for the cascade to resolve.
    pub objlib: Option<String>,
}

impl DirOverride {
    /// Loads an override record, `None` when the directory has none.
    pub fn load(path: &Path, env: &dyn Environment) -> Result<Option<Self>, PlanError> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| PlanError::io(path, e.to_string()))?;
        Self::from_json(&content, path, env).map(Some)
    }

    pub fn from_json(content: &str, path: &Path, env: &dyn Environment) -> Result<Self, PlanError> {
        let raw: RawOverride = serde_json::from_str(content).map_err(|e| PlanError::MalformedConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let build = raw.build.unwrap_or_default();

        let tgt_ccsid = build.tgt_ccsid.map(RawCcsid::into_string);
        if let Some(ccsid) = &tgt_ccsid {
            validate_ccsid(ccsid)?;
        }
        let objlib = build
            .objlib
            .map(|objlib| env::expand(&objlib, env))
            .transpose()?;

        Ok(Self {
            version: raw.version,
            tgt_ccsid,
            objlib,
        })
    }
}
