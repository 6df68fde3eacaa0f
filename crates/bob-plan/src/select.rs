//! Narrowing a build to requested targets.
//!
//! A selector is one of:
//! - `all`, building everything
//! - `dir_<name>`, the aggregate goal of a descriptor directory
//! - a target (`VAT300.MODULE`) or source file name (`vat300.rpgle`),
//!   optionally scoped by a directory relative to the project root
//!   (`functionsVAT/vat300.rpgle`)

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::diagnostic::{PlanError, Warning, WarningKind};
use crate::ir::Descriptor;
use crate::naming;

/// The goal meaning "build everything".
pub const ALL: &str = "all";

/// Prefix of directory aggregate goals.
pub const DIR_PREFIX: &str = "dir_";

/// Make goals for a set of selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub goals: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// The directory goal for a path: `dir_` plus its last component.
pub fn dir_goal(path: &str) -> String {
    let name = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path);
    format!("{}{}", DIR_PREFIX, name)
}

/// The selector for a path named on the command line: the directory goal
/// for a directory, otherwise the source path relative to `root`.
///
/// Source names are checked against the naming model, so a file that can
/// never map to a target fails here rather than matching nothing later.
pub fn path_selector(path: &Path, root: &Path) -> Result<String, PlanError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let absolute = absolute.canonicalize().unwrap_or(absolute);

    if absolute.is_dir() {
        return Ok(dir_goal(&absolute.to_string_lossy()));
    }

    let file_name = absolute
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    naming::target_for(&file_name)?;

    let relative = pathdiff::diff_paths(&absolute, root).unwrap_or(absolute);
    let relative = relative.to_string_lossy().replace('\\', "/");
    if relative.contains('/') {
        Ok(relative)
    } else {
        Ok(format!("./{}", relative))
    }
}

/// Resolves selectors against parsed descriptors, in traversal order.
/// Unmatched selectors are reported and dropped.
pub fn resolve(selectors: &[String], descriptors: &[Descriptor], root: &Path) -> Selection {
    let mut selection = Selection::default();

    if selectors.is_empty() || selectors.iter().any(|s| s == ALL) {
        selection.goals.push(ALL.to_string());
        return selection;
    }

    for selector in selectors {
        let goals = if let Some(name) = selector.strip_prefix(DIR_PREFIX) {
            resolve_dir(name, selector, descriptors)
        } else {
            resolve_target(selector, descriptors, root, &mut selection.warnings)
        };

        match goals {
            Some(goals) => {
                for goal in goals {
                    if !selection.goals.contains(&goal) {
                        selection.goals.push(goal);
                    }
                }
            }
            None => {
                let warning = Warning::new(
                    WarningKind::UnmatchedSelector {
                        selector: selector.clone(),
                    },
                    None,
                );
                warn!("{}", warning);
                selection.warnings.push(warning);
            }
        }
    }

    selection
}

fn resolve_dir(name: &str, selector: &str, descriptors: &[Descriptor]) -> Option<Vec<String>> {
    descriptors
        .iter()
        .any(|d| {
            d.containing_dir
                .file_name()
                .is_some_and(|dir| dir.to_string_lossy().eq_ignore_ascii_case(name))
        })
        .then(|| vec![selector.to_string()])
}

fn resolve_target(
    selector: &str,
    descriptors: &[Descriptor],
    root: &Path,
    warnings: &mut Vec<Warning>,
) -> Option<Vec<String>> {
    let (scope, name) = match selector.rsplit_once('/') {
        Some((dir, name)) if !dir.is_empty() => (Some(root.join(dir)), name),
        _ => (None, selector),
    };

    let in_scope: Vec<&Descriptor> = descriptors
        .iter()
        .filter(|d| scope.as_ref().map_or(true, |dir| d.containing_dir == *dir))
        .collect();

    let mut candidates = matches(name, &in_scope);
    if candidates.is_empty() {
        if let Ok(target) = naming::target_for(name) {
            candidates = matches(&target, &in_scope);
        }
    }

    let (_, goals) = candidates.first()?.clone();
    if candidates.len() > 1 {
        let warning = Warning::new(
            WarningKind::AmbiguousSelector {
                selector: selector.to_string(),
                candidates: candidates.into_iter().map(|(dir, _)| dir).collect(),
            },
            None,
        );
        warn!("{}", warning);
        warnings.push(warning);
    }
    Some(goals)
}

/// Directories declaring `name` as a target or a source, with the targets it
/// stands for there.
fn matches(name: &str, descriptors: &[&Descriptor]) -> Vec<(PathBuf, Vec<String>)> {
    descriptors
        .iter()
        .filter_map(|d| {
            let targets = match d.rule(name) {
                Some(rule) => vec![rule.target.clone()],
                None => d.targets_for_source(name).to_vec(),
            };
            (!targets.is_empty()).then(|| (d.containing_dir.clone(), targets))
        })
        .collect()
}
