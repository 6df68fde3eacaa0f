//! The project record, `iproj.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::env::{self, Environment};
use crate::diagnostic::PlanError;

/// Object library placeholder meaning "the current library".
pub const CURLIB_SENTINEL: &str = "*CURLIB";
/// Current library placeholder meaning "the system default".
pub const CRTDFT_SENTINEL: &str = "*CRTDFT";
/// Library `*CRTDFT` resolves to.
pub const SYSTEM_DEFAULT_LIBRARY: &str = "QGPL";
/// Target CCSID placeholder meaning "the job's CCSID".
pub const JOB_CCSID: &str = "*JOB";

/// A CCSID written either as a string (`"*JOB"`, `"37"`) or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawCcsid {
    Number(i64),
    Text(String),
}

impl RawCcsid {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawCcsid::Number(n) => n.to_string(),
            RawCcsid::Text(s) => s,
        }
    }
}

/// `iproj.json` as written on disk.
#[derive(Debug, Default, Deserialize)]
struct RawProject {
    description: Option<String>,
    version: Option<String>,
    license: Option<String>,
    repository: Option<String>,
    #[serde(rename = "includePath")]
    include_path: Option<Vec<String>>,
    objlib: Option<String>,
    curlib: Option<String>,
    #[serde(rename = "preUsrlibl")]
    pre_usr_libl: Option<Vec<String>>,
    #[serde(rename = "postUsrlibl")]
    post_usr_libl: Option<Vec<String>>,
    #[serde(rename = "setIBMiEnvCmd")]
    set_ibmi_env_cmd: Option<Vec<String>>,
    #[serde(rename = "tgtCcsid")]
    tgt_ccsid: Option<RawCcsid>,
    extensions: Option<BTreeMap<String, Value>>,
}

/// Project-wide settings with placeholders expanded and sentinels resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub description: String,
    pub version: Option<String>,
    pub license: String,
    pub repository: Option<String>,
    pub include_path: Vec<String>,
    /// Resolved object library; never a sentinel.
    pub objlib: String,
    /// Current library as configured; may be `*CRTDFT`.
    pub curlib: String,
    pub pre_usr_libl: Vec<String>,
    pub post_usr_libl: Vec<String>,
    pub set_ibmi_env_cmd: Vec<String>,
    pub tgt_ccsid: String,
    /// Tool-specific settings, kept as written.
    pub extensions: BTreeMap<String, Value>,
}

impl ProjectConfig {
    /// Loads `iproj.json`.
    pub fn load(path: &Path, env: &dyn Environment) -> Result<Self, PlanError> {
        if !path.is_file() {
            return Err(PlanError::ProjectConfigMissing {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| PlanError::io(path, e.to_string()))?;
        Self::from_json(&content, path, env)
    }

    /// Parses project JSON. `path` is only used in error messages.
    pub fn from_json(content: &str, path: &Path, env: &dyn Environment) -> Result<Self, PlanError> {
        let raw: RawProject = serde_json::from_str(content).map_err(|e| PlanError::MalformedConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_raw(raw, env)
    }

    fn from_raw(raw: RawProject, env: &dyn Environment) -> Result<Self, PlanError> {
        let curlib = env::expand(raw.curlib.as_deref().unwrap_or(CRTDFT_SENTINEL), env)?;
        let objlib = env::expand(raw.objlib.as_deref().unwrap_or(CURLIB_SENTINEL), env)?;
        let objlib = resolve_objlib(&objlib, &curlib)?;

        let tgt_ccsid = raw
            .tgt_ccsid
            .map(RawCcsid::into_string)
            .unwrap_or_else(|| JOB_CCSID.to_string());
        validate_ccsid(&tgt_ccsid)?;

        Ok(Self {
            description: raw.description.unwrap_or_default(),
            version: raw.version,
            license: raw.license.unwrap_or_default(),
            repository: raw.repository,
            include_path: env::expand_all(&raw.include_path.unwrap_or_default(), env)?,
            objlib,
            curlib,
            pre_usr_libl: env::expand_all(&raw.pre_usr_libl.unwrap_or_default(), env)?,
            post_usr_libl: env::expand_all(&raw.post_usr_libl.unwrap_or_default(), env)?,
            set_ibmi_env_cmd: env::expand_all(&raw.set_ibmi_env_cmd.unwrap_or_default(), env)?,
            tgt_ccsid,
            extensions: raw.extensions.unwrap_or_default(),
        })
    }

    /// The current library with `*CRTDFT` resolved.
    pub fn effective_curlib(&self) -> &str {
        if self.curlib == CRTDFT_SENTINEL {
            SYSTEM_DEFAULT_LIBRARY
        } else {
            &self.curlib
        }
    }
}

/// Resolves `*CURLIB` against `curlib`, and `*CRTDFT` further to the system
/// default library.
pub fn resolve_objlib(objlib: &str, curlib: &str) -> Result<String, PlanError> {
    let resolved = match (objlib, curlib) {
        (CURLIB_SENTINEL, CRTDFT_SENTINEL) => SYSTEM_DEFAULT_LIBRARY,
        (CURLIB_SENTINEL, curlib) => curlib,
        (objlib, _) => objlib,
    };
    if resolved.trim().is_empty() {
        return Err(PlanError::EmptyObjectLibrary);
    }
    Ok(resolved.to_string())
}

/// `*JOB` or a numeric CCSID other than 65535.
pub fn validate_ccsid(ccsid: &str) -> Result<(), PlanError> {
    let invalid = || PlanError::InvalidCcsid {
        value: ccsid.to_string(),
    };
    if ccsid == JOB_CCSID {
        return Ok(());
    }
    if ccsid.starts_with('*') || ccsid == "65535" {
        return Err(invalid());
    }
    ccsid.parse::<u32>().map(|_| ()).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(json: &str) -> Result<ProjectConfig, PlanError> {
        ProjectConfig::from_json(json, &PathBuf::from("iproj.json"), &MapEnv::default())
    }

    #[test]
    fn test_defaults() {
        let config = parse("{}").unwrap();
        assert_eq!(config.curlib, "*CRTDFT");
        assert_eq!(config.objlib, "QGPL");
        assert_eq!(config.tgt_ccsid, "*JOB");
        assert!(config.include_path.is_empty());
        assert!(config.extensions.is_empty());
        assert_eq!(config.effective_curlib(), "QGPL");
    }

    #[test]
    fn test_sentinel_resolution() {
        assert_eq!(resolve_objlib("*CURLIB", "*CRTDFT").unwrap(), "QGPL");
        assert_eq!(resolve_objlib("*CURLIB", "MYLIB").unwrap(), "MYLIB");
        assert_eq!(resolve_objlib("OBJS", "MYLIB").unwrap(), "OBJS");
        assert!(matches!(resolve_objlib("", "MYLIB"), Err(PlanError::EmptyObjectLibrary)));

        let config = parse(r#"{"curlib": "MYLIB"}"#).unwrap();
        assert_eq!(config.objlib, "MYLIB");
        assert_eq!(config.curlib, "MYLIB");
    }

    #[test]
    fn test_full_record_with_placeholders() {
        let env = MapEnv::new([("lib1", "DEVLIB"), ("ROOT", "/home/dev")]);
        let json = r#"{
            "description": "Sample project",
            "version": "1.0.0",
            "license": "Apache-2.0",
            "repository": "https://example.com/repo",
            "includePath": ["&ROOT/includes", "common"],
            "objlib": "&lib1",
            "curlib": "*CRTDFT",
            "preUsrlibl": ["PRE1", "&lib1"],
            "postUsrlibl": ["POST1"],
            "setIBMiEnvCmd": ["CHGJOB CCSID(37)", "ADDLIBLE TOOLS"],
            "tgtCcsid": 37,
            "extensions": {"editor": {"tabs": 2, "rulers": [80, 100], "mode": null, "strict": true}}
        }"#;
        let config = ProjectConfig::from_json(json, &PathBuf::from("iproj.json"), &env).unwrap();

        assert_eq!(config.objlib, "DEVLIB");
        assert_eq!(config.include_path, vec!["/home/dev/includes", "common"]);
        assert_eq!(config.pre_usr_libl, vec!["PRE1", "DEVLIB"]);
        assert_eq!(config.tgt_ccsid, "37");
        assert_eq!(config.version.as_deref(), Some("1.0.0"));

        assert_eq!(
            config.extensions["editor"],
            serde_json::json!({"tabs": 2, "rulers": [80, 100], "mode": null, "strict": true})
        );
    }

    #[test]
    fn test_extensions_keep_large_integers() {
        let json = r#"{"extensions": {"build": {"seq": 9007199254740993, "ratio": 0.5}}}"#;
        let config = parse(json).unwrap();
        let build = &config.extensions["build"];
        assert_eq!(build["seq"].as_u64(), Some(9_007_199_254_740_993));
        assert_eq!(build["ratio"].as_f64(), Some(0.5));
    }

    #[test]
    fn test_undefined_placeholder_is_fatal() {
        assert!(matches!(
            parse(r#"{"objlib": "&NOPE"}"#),
            Err(PlanError::UndefinedEnvVar { .. })
        ));
    }

    #[test]
    fn test_ccsid_validation() {
        assert!(validate_ccsid("*JOB").is_ok());
        assert!(validate_ccsid("37").is_ok());
        assert!(validate_ccsid("1208").is_ok());
        for bad in ["*HEX", "65535", "abc", ""] {
            assert!(matches!(validate_ccsid(bad), Err(PlanError::InvalidCcsid { .. })), "{bad}");
        }
        assert!(parse(r#"{"tgtCcsid": "65535"}"#).is_err());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iproj.json");
        assert!(matches!(
            ProjectConfig::load(&path, &MapEnv::default()),
            Err(PlanError::ProjectConfigMissing { .. })
        ));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ProjectConfig::load(&path, &MapEnv::default()),
            Err(PlanError::MalformedConfig { .. })
        ));
    }
}
