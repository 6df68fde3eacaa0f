//! # makei Build Planner
//!
//! This crate turns a tree of per-directory `Rules.mk` descriptors plus the
//! project's `iproj.json` / `.ibmi.json` records into a build plan for the
//! make-based object build engine.
//!
//! ## Architecture
//!
//! ```text
//! Project tree (Rules.mk, iproj.json, .ibmi.json)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Frontend   │  Descriptor parsing, wildcard expansion,
//! │ (text → IR)  │  variable overrides, member text
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Cascade    │  Per-directory CCSID / object library,
//! │  (records)   │  inherited parent to child
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Select    │  Narrow to requested targets
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  .Rules.mk.build per directory
//! │ (IR → plan)  │  + build-variables file
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bob_plan::{config::ProcessEnv, Planner, PlannerConfig};
//!
//! let mut planner = Planner::new(PlannerConfig::new("/home/dev/bob-recursive-example"));
//! let plan = planner.plan(&ProcessEnv::new())?;
//! if let Some(invocation) = plan.make_invocation("/QOpenSys/pkgs/lib/bob") {
//!     // run invocation.program with invocation.args()
//! }
//! // the plan's files are removed when `plan` is dropped
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod frontend;
pub mod ir;
pub mod naming;
pub mod select;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use config::PlannerConfig;
pub use diagnostic::{PlanError, Warning, WarningKind};
pub use engine::{BuildOutcome, MakeInvocation, OutcomeScanner};

use config::{Cascade, EffectiveConfig, Environment, ProjectConfig};
use frontend::rules_mk::RulesMkFrontend;
use frontend::Frontend;
use ir::Descriptor;

/// The build planner: walks a project, parses every descriptor, resolves
/// directory settings and writes the plan.
pub struct Planner {
    config: PlannerConfig,
    frontend: Box<dyn Frontend>,
}

impl Planner {
    /// Creates a planner reading `Rules.mk`-format descriptors.
    pub fn new(config: PlannerConfig) -> Self {
        let frontend = Box::new(RulesMkFrontend::new(config.descriptor_name.clone()));
        Self::with_frontend(config, frontend)
    }

    pub fn with_frontend(config: PlannerConfig, frontend: Box<dyn Frontend>) -> Self {
        Self { config, frontend }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Computes and writes the plan.
    ///
    /// This runs the full pipeline:
    /// 1. Load the project record
    /// 2. Discover descriptor files
    /// 3. Parse every descriptor
    /// 4. Resolve per-directory settings
    /// 5. Narrow to the requested selectors
    /// 6. Render the plan
    /// 7. Write the plan files
    ///
    /// Nothing is written unless every descriptor parsed and every record
    /// resolved. Files already written are removed if a later write fails.
    pub fn plan(&mut self, env: &dyn Environment) -> Result<BuildPlan, PlanError> {
        let root = self
            .config
            .project_dir
            .canonicalize()
            .map_err(|e| PlanError::io(&self.config.project_dir, e.to_string()))?;

        // Phase 1: Load the project record
        let project = ProjectConfig::load(&root.join(&self.config.project_record), env)?;
        let include_dirs: Vec<PathBuf> = project
            .include_path
            .iter()
            .map(|dir| root.join(dir))
            .collect();

        // Phase 2: Discover descriptors
        let paths = discover(&root, self.frontend.file_name())?;
        debug!(
            format = self.frontend.format(),
            count = paths.len(),
            root = %root.display(),
            "discovered descriptors"
        );

        // Phase 3: Parse
        let mut descriptors = Vec::with_capacity(paths.len());
        let mut warnings = Vec::new();
        for path in &paths {
            let parsed = self.frontend.parse_descriptor(path, &include_dirs)?;
            warnings.extend(parsed.warnings);
            descriptors.push(parsed.descriptor);
        }

        // Phase 4: Resolve directory settings
        let dirs: Vec<PathBuf> = descriptors
            .iter()
            .map(|d| d.containing_dir.clone())
            .collect();
        let resolved = Cascade::new(&root, self.config.override_name.as_str(), &project, env)
            .resolve_all(&dirs)?;

        // Phase 5: Select
        let selection = select::resolve(&self.config.selectors, &descriptors, &root);
        warnings.extend(selection.warnings);
        if selection.goals.is_empty() {
            warn!("no requested target matched a descriptor");
        }

        // Phase 6: Render
        let generated = codegen::generate(&descriptors, &project, &resolved, self.config.color);

        // Phase 7: Write
        let mut artifacts = Artifacts::default();
        for (dir, content) in &generated.rendered {
            let path = dir.join(&self.config.rendered_name);
            fs::write(&path, content).map_err(|e| PlanError::io(&path, e.to_string()))?;
            artifacts.paths.push(path);
        }
        let build_vars = write_build_vars(&generated.build_vars)?;

        info!(
            descriptors = descriptors.len(),
            goals = ?selection.goals,
            warnings = warnings.len(),
            build_vars = %build_vars.path().display(),
            "build plan written"
        );

        Ok(BuildPlan {
            root,
            project,
            descriptors,
            dirs: resolved,
            goals: selection.goals,
            warnings,
            build_vars,
            artifacts,
        })
    }
}

/// Descriptor files named `file_name` below `root`, parents before children,
/// siblings by name. Hidden directories are skipped. A directory that cannot
/// be read fails discovery rather than dropping out of the plan.
fn discover(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, PlanError> {
    let mut found = Vec::new();
    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.file_name().to_string_lossy().starts_with('.')
        });
    for entry in entries {
        let entry = entry.map_err(|e| PlanError::io(e.path().unwrap_or(root), e.to_string()))?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn write_build_vars(content: &str) -> Result<NamedTempFile, PlanError> {
    let mut file = tempfile::Builder::new()
        .prefix("makei-buildvars-")
        .suffix(".mk")
        .tempfile()
        .map_err(|e| PlanError::io(std::env::temp_dir(), e.to_string()))?;
    if let Err(e) = file.write_all(content.as_bytes()).and_then(|_| file.flush()) {
        return Err(PlanError::io(file.path(), e.to_string()));
    }
    Ok(file)
}

/// Rendered descriptor files, removed on drop.
#[derive(Debug, Default)]
struct Artifacts {
    paths: Vec<PathBuf>,
}

impl Drop for Artifacts {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove plan file");
            }
        }
    }
}

/// A written build plan. Its files exist for as long as the value lives.
#[derive(Debug)]
pub struct BuildPlan {
    root: PathBuf,
    project: ProjectConfig,
    descriptors: Vec<Descriptor>,
    dirs: Vec<(PathBuf, EffectiveConfig)>,
    goals: Vec<String>,
    warnings: Vec<Warning>,
    build_vars: NamedTempFile,
    artifacts: Artifacts,
}

impl BuildPlan {
    /// Canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Effective settings per descriptor directory, shallowest first.
    pub fn dirs(&self) -> &[(PathBuf, EffectiveConfig)] {
        &self.dirs
    }

    /// Make goals; empty when selectors were given and none matched.
    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Path of the build-variables file.
    pub fn build_vars_path(&self) -> &Path {
        self.build_vars.path()
    }

    /// Paths of the rendered descriptor files.
    pub fn rendered_paths(&self) -> &[PathBuf] {
        &self.artifacts.paths
    }

    /// The make run for this plan, or `None` when no goal survived selection.
    pub fn make_invocation(&self, bob_path: impl Into<PathBuf>) -> Option<MakeInvocation> {
        if self.goals.is_empty() {
            return None;
        }
        Some(MakeInvocation::new(self.build_vars_path(), bob_path).with_goals(self.goals.clone()))
    }

    /// Removes the plan files now, reporting the first failure.
    pub fn close(self) -> Result<(), PlanError> {
        let BuildPlan {
            build_vars,
            mut artifacts,
            ..
        } = self;

        let vars_path = build_vars.path().to_path_buf();
        let mut result = build_vars
            .close()
            .map_err(|e| PlanError::io(vars_path, e.to_string()));
        for path in std::mem::take(&mut artifacts.paths) {
            if let Err(e) = fs::remove_file(&path) {
                if result.is_ok() {
                    result = Err(PlanError::io(&path, e.to_string()));
                }
            }
        }
        result
    }
}
