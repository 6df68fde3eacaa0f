//! Per-directory effective settings, inherited parent to child.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::env::Environment;
use super::overrides::DirOverride;
use super::project::{resolve_objlib, ProjectConfig};
use crate::diagnostic::PlanError;

/// The settings a directory's objects are built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub tgt_ccsid: String,
    pub objlib: String,
}

impl EffectiveConfig {
    /// IFS path of the object library.
    pub fn objpath(&self) -> String {
        objlib_to_path(&self.objlib)
    }
}

/// `/QSYS.LIB/<LIB>.LIB`, with `QSYS` itself at `/QSYS.LIB`.
pub fn objlib_to_path(objlib: &str) -> String {
    if objlib == "QSYS" {
        "/QSYS.LIB".to_string()
    } else {
        format!("/QSYS.LIB/{}.LIB", objlib)
    }
}

/// Resolves effective settings for directories below a project root.
///
/// The root takes the project record's values. Every other directory takes
/// its own override record's fields and falls back, field by field, to its
/// parent's effective settings, whether or not the parent holds a
/// descriptor.
pub struct Cascade<'a> {
    root: PathBuf,
    override_file: String,
    project: &'a ProjectConfig,
    env: &'a dyn Environment,
    resolved: BTreeMap<PathBuf, EffectiveConfig>,
}

impl<'a> Cascade<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        override_file: impl Into<String>,
        project: &'a ProjectConfig,
        env: &'a dyn Environment,
    ) -> Self {
        Self {
            root: root.into(),
            override_file: override_file.into(),
            project,
            env,
            resolved: BTreeMap::new(),
        }
    }

    /// Effective settings of `dir`. Directories outside the root resolve to
    /// the root's settings.
    pub fn resolve(&mut self, dir: &Path) -> Result<EffectiveConfig, PlanError> {
        if let Some(config) = self.resolved.get(dir) {
            return Ok(config.clone());
        }

        let config = match dir.parent() {
            Some(parent) if dir != self.root && dir.starts_with(&self.root) => {
                let inherited = self.resolve(parent)?;
                let path = dir.join(&self.override_file);
                match DirOverride::load(&path, self.env)? {
                    Some(record) => self.apply(record, inherited)?,
                    None => inherited,
                }
            }
            _ => EffectiveConfig {
                tgt_ccsid: self.project.tgt_ccsid.clone(),
                objlib: self.project.objlib.clone(),
            },
        };

        debug!(
            dir = %dir.display(),
            objlib = %config.objlib,
            tgt_ccsid = %config.tgt_ccsid,
            "resolved directory settings"
        );
        self.resolved.insert(dir.to_path_buf(), config.clone());
        Ok(config)
    }

    fn apply(&self, record: DirOverride, inherited: EffectiveConfig) -> Result<EffectiveConfig, PlanError> {
        let objlib = match record.objlib {
            Some(objlib) => resolve_objlib(&objlib, &self.project.curlib)?,
            None => inherited.objlib,
        };
        Ok(EffectiveConfig {
            tgt_ccsid: record.tgt_ccsid.unwrap_or(inherited.tgt_ccsid),
            objlib,
        })
    }

    /// Resolves `dirs` shallowest first and returns them in that order.
    pub fn resolve_all(&mut self, dirs: &[PathBuf]) -> Result<Vec<(PathBuf, EffectiveConfig)>, PlanError> {
        let mut ordered: Vec<&PathBuf> = dirs.iter().collect();
        ordered.sort_by(|a, b| {
            a.components()
                .count()
                .cmp(&b.components().count())
                .then_with(|| a.cmp(b))
        });
        ordered.dedup();

        ordered
            .into_iter()
            .map(|dir| self.resolve(dir).map(|config| (dir.clone(), config)))
            .collect()
    }
}
