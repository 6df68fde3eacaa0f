//! One compile unit of a descriptor.

use std::path::PathBuf;

use crate::diagnostic::PlanError;
use crate::naming::{self, TargetGroup};

/// Where a rule's files live: the descriptor's directory and the project's
/// include search path, both already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirContext {
    pub containing_dir: PathBuf,
    pub include_dirs: Vec<PathBuf>,
}

impl DirContext {
    pub fn new(containing_dir: impl Into<PathBuf>, include_dirs: Vec<PathBuf>) -> Self {
        Self {
            containing_dir: containing_dir.into(),
            include_dirs,
        }
    }
}

/// Make variable that expands to the directory of the descriptor being built.
pub const DIR_VAR: &str = "$(d)";

/// A make rule: a target, the inputs it depends on, and either a generated
/// recipe (from `source`) or literal commands.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Upper-cased `NAME.TYPE`.
    pub target: String,
    /// Remaining inputs, in declaration order.
    pub dependencies: Vec<String>,
    /// The single compile input of a generated recipe. `None` for custom recipes.
    pub source: Option<String>,
    /// True when `source` was found as a file in the containing directory.
    pub source_in_dir: bool,
    /// Literal recipe lines, wrapped in the start/success echo markers.
    /// Empty for generated recipes.
    pub commands: Vec<String>,
    /// Raw `key (op) value` overrides; later entries win.
    pub variables: Vec<String>,
    /// True when the last variable is `TEXT` imported from the source's
    /// metadata block rather than declared in the descriptor.
    pub text_imported: bool,
    pub containing_dir: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub group: TargetGroup,
}

fn start_marker(target: &str) -> String {
    format!("@$(call echo_cmd,=== Creating [{}] from custom recipe)", target)
}

fn success_marker(target: &str) -> String {
    format!("@$(call echo_success_cmd,End of creating {})", target)
}

impl Rule {
    /// Builds a rule, choosing between a custom recipe (any non-blank command)
    /// and a generated one (a source picked from `dependencies`).
    pub fn new(
        target: &str,
        mut dependencies: Vec<String>,
        commands: Vec<String>,
        variables: Vec<String>,
        ctx: &DirContext,
    ) -> Result<Self, PlanError> {
        let target = target.to_ascii_uppercase();
        let mut commands: Vec<String> = commands
            .into_iter()
            .filter(|command| !command.trim().is_empty())
            .collect();

        let mut source = None;
        let mut source_in_dir = false;

        if commands.is_empty() {
            let located = dependencies.iter().position(|dep| {
                naming::is_bare_source(dep) && ctx.containing_dir.join(dep).is_file()
            });
            match located {
                Some(idx) => {
                    source = Some(dependencies.remove(idx));
                    source_in_dir = true;
                }
                None if !dependencies.is_empty() => {
                    source = Some(dependencies.remove(0));
                }
                None => {
                    return Err(PlanError::MissingSource {
                        target,
                        location: None,
                    })
                }
            }
        } else {
            commands.insert(0, start_marker(&target));
            commands.push(success_marker(&target));
        }

        let group = classify(&target, source.as_deref())?;

        Ok(Self {
            target,
            dependencies,
            source,
            source_in_dir,
            commands,
            variables,
            text_imported: false,
            containing_dir: ctx.containing_dir.clone(),
            include_dirs: ctx.include_dirs.clone(),
            group,
        })
    }

    pub fn is_custom(&self) -> bool {
        !self.commands.is_empty()
    }

    /// The object type the target declares, e.g. `MODULE`.
    pub fn target_type(&self) -> String {
        naming::declared_type(&self.target)
    }

    /// The commands as written in the descriptor, without the generated
    /// markers.
    pub fn user_commands(&self) -> &[String] {
        if self.commands.len() >= 2 {
            &self.commands[1..self.commands.len() - 1]
        } else {
            &[]
        }
    }

    /// Appends the member text imported from the source file.
    pub fn import_text(&mut self, text: &str) {
        self.variables.push(format!("TEXT = {}", text));
        self.text_imported = true;
    }

    /// Variables as declared in the descriptor, without imported member text.
    pub fn declared_variables(&self) -> &[String] {
        match self.variables.split_last() {
            Some((_, declared)) if self.text_imported => declared,
            _ => &self.variables,
        }
    }

    /// The source as make should see it: `$(d)/<file>` when it was found in
    /// the containing directory, verbatim otherwise.
    pub fn source_reference(&self) -> Option<String> {
        self.source.as_ref().map(|src| {
            if self.source_in_dir {
                format!("{}/{}", DIR_VAR, src)
            } else {
                src.clone()
            }
        })
    }

    /// The make recipe a generated rule expands to. `None` for custom rules.
    pub fn recipe_name(&self) -> Option<String> {
        let source = self.source.as_deref()?;
        let target_type = self.target_type();
        if matches!(target_type.as_str(), "SQL" | "MSGF") {
            return Some(format!("{}_RECIPE", target_type));
        }
        let source_ext = naming::decompose(source)
            .map(|d| d.extension)
            .unwrap_or_else(|_| naming::declared_type(source));
        Some(format!("{}_TO_{}_RECIPE", source_ext, target_type))
    }

    /// Dependencies with bare source files resolved against the containing
    /// directory, then each include directory; first match wins.
    pub fn resolved_dependencies(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .map(|dep| self.resolve_dependency(dep))
            .collect()
    }

    fn resolve_dependency(&self, dep: &str) -> String {
        if !naming::is_bare_source(dep) {
            return dep.to_string();
        }
        if self.containing_dir.join(dep).is_file() {
            return format!("{}/{}", DIR_VAR, dep);
        }
        self.include_dirs
            .iter()
            .map(|dir| dir.join(dep))
            .find(|candidate| candidate.is_file())
            .map(|found| found.display().to_string())
            .unwrap_or_else(|| dep.to_string())
    }

    /// Path of the source file on disk, when it was found there.
    pub fn source_path(&self) -> Option<PathBuf> {
        match (&self.source, self.source_in_dir) {
            (Some(src), true) => Some(self.containing_dir.join(src)),
            _ => None,
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.commands == other.commands
            && self.dependencies == other.dependencies
            && self.variables == other.variables
            && self.containing_dir == other.containing_dir
    }
}

/// Picks the target group: the declared object type, which must be one of
/// the groups the source plausibly feeds. Only two targets may differ from
/// their source: a `SQL` target takes the source's canonical group, and a
/// `PGM` target built from trigger source is grouped as a trigger.
fn classify(target: &str, source: Option<&str>) -> Result<TargetGroup, PlanError> {
    let object_type = naming::declared_type(target);
    let declared = TargetGroup::from_object_type(&object_type);
    let candidates = source
        .and_then(|src| naming::decompose(src).ok())
        .map(|descriptor| naming::target_groups_for(&descriptor.extension))
        .unwrap_or(&[]);

    let group = if candidates.is_empty() {
        declared
    } else if let Some(group) = declared.filter(|g| candidates.contains(g)) {
        Some(group)
    } else {
        match object_type.as_str() {
            "SQL" => candidates.first().copied(),
            "PGM" if candidates.contains(&TargetGroup::Trg) => Some(TargetGroup::Trg),
            _ => None,
        }
    };

    group.ok_or_else(|| PlanError::UnclassifiableTarget {
        target: target.to_string(),
        location: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ctx(dir: &TempDir) -> DirContext {
        DirContext::new(dir.path(), Vec::new())
    }

    #[test]
    fn test_generated_rule_prefers_existing_bare_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bar.rpgle"), "").unwrap();

        let rule = Rule::new(
            "bar.MODULE",
            strings(&["bar.TABLE", "bar.rpgle"]),
            Vec::new(),
            Vec::new(),
            &ctx(&dir),
        )
        .unwrap();

        assert_eq!(rule.target, "BAR.MODULE");
        assert_eq!(rule.source.as_deref(), Some("bar.rpgle"));
        assert!(rule.source_in_dir);
        assert_eq!(rule.dependencies, strings(&["bar.TABLE"]));
        assert_eq!(rule.source_reference().unwrap(), "$(d)/bar.rpgle");
        assert_eq!(rule.recipe_name().unwrap(), "RPGLE_TO_MODULE_RECIPE");
        assert_eq!(rule.group, TargetGroup::Module);
    }

    #[test]
    fn test_generated_rule_falls_back_to_first_dependency() {
        let dir = TempDir::new().unwrap();
        let rule = Rule::new(
            "ARTICLE.FILE",
            strings(&["ARTICLE-Article_File.PF", "SAMREF.FILE"]),
            Vec::new(),
            Vec::new(),
            &ctx(&dir),
        )
        .unwrap();

        assert_eq!(rule.source.as_deref(), Some("ARTICLE-Article_File.PF"));
        assert!(!rule.source_in_dir);
        assert_eq!(rule.source_reference().unwrap(), "ARTICLE-Article_File.PF");
        assert_eq!(rule.dependencies, strings(&["SAMREF.FILE"]));
        assert_eq!(rule.recipe_name().unwrap(), "PF_TO_FILE_RECIPE");
        assert_eq!(rule.group, TargetGroup::File);
    }

    #[test]
    fn test_rule_without_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = Rule::new("EMPTY.PGM", Vec::new(), Vec::new(), Vec::new(), &ctx(&dir)).unwrap_err();
        assert!(matches!(err, PlanError::MissingSource { ref target, .. } if target == "EMPTY.PGM"));
    }

    #[test]
    fn test_custom_rule_wraps_commands() {
        let dir = TempDir::new().unwrap();
        let rule = Rule::new(
            "CRTSBSD.FILE",
            Vec::new(),
            strings(&["", "system -i \"CRTSBSD SBSD(BATCHWL/BATCHSBSD)\"", "   "]),
            Vec::new(),
            &ctx(&dir),
        )
        .unwrap();

        assert!(rule.is_custom());
        assert!(rule.source.is_none());
        assert!(rule.recipe_name().is_none());
        assert_eq!(
            rule.commands,
            strings(&[
                "@$(call echo_cmd,=== Creating [CRTSBSD.FILE] from custom recipe)",
                "system -i \"CRTSBSD SBSD(BATCHWL/BATCHSBSD)\"",
                "@$(call echo_success_cmd,End of creating CRTSBSD.FILE)",
            ])
        );
        assert_eq!(rule.user_commands(), &strings(&["system -i \"CRTSBSD SBSD(BATCHWL/BATCHSBSD)\""])[..]);
        assert_eq!(rule.group, TargetGroup::File);
    }

    #[test]
    fn test_custom_rule_with_unknown_type_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = Rule::new("THING.XYZ", Vec::new(), strings(&["echo hi"]), Vec::new(), &ctx(&dir))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnclassifiableTarget { .. }));
    }

    #[test]
    fn test_group_disambiguated_by_declared_type() {
        let dir = TempDir::new().unwrap();
        let pgm = Rule::new("HELLO.PGM", strings(&["HELLO.RPGLE"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        let module = Rule::new("HELLO.MODULE", strings(&["HELLO.RPGLE"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        assert_eq!(pgm.group, TargetGroup::Pgm);
        assert_eq!(module.group, TargetGroup::Module);

        // Trigger programs are PGM objects grouped as triggers.
        let trg = Rule::new("ORDTRG.PGM", strings(&["ordtrg.systrg"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        assert_eq!(trg.group, TargetGroup::Trg);
    }

    #[test]
    fn test_declared_type_must_match_source() {
        let dir = TempDir::new().unwrap();
        for (target, source) in [("FOO.XYZ", "foo.rpgle"), ("FOO.PGM", "foo.sqlseq"), ("FOO.FILE", "foo.rpgle")] {
            let err = Rule::new(target, strings(&[source]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap_err();
            assert!(
                matches!(err, PlanError::UnclassifiableTarget { target: ref t, .. } if t == target),
                "{target}: {err:?}"
            );
        }

        // An object dependency says nothing about the group.
        let pgm = Rule::new("X.PGM", strings(&["X.FILE"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        assert_eq!(pgm.group, TargetGroup::Pgm);
    }

    #[test]
    fn test_fixed_recipe_names() {
        let dir = TempDir::new().unwrap();
        let msgf = Rule::new("SGSMSGF.MSGF", strings(&["SGSMSGF.MSGF"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        assert_eq!(msgf.recipe_name().unwrap(), "MSGF_RECIPE");

        let sql = Rule::new("SETUP.SQL", strings(&["setup.sqlprc"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        assert_eq!(sql.recipe_name().unwrap(), "SQL_RECIPE");
        assert_eq!(sql.group, TargetGroup::Pgm);
    }

    #[test]
    fn test_dependency_resolution_order() {
        let dir = TempDir::new().unwrap();
        let inc1 = TempDir::new().unwrap();
        let inc2 = TempDir::new().unwrap();
        fs::write(dir.path().join("local.rpgle"), "").unwrap();
        fs::write(inc2.path().join("shared.rpgle"), "").unwrap();
        fs::write(inc1.path().join("local.rpgle"), "").unwrap();

        let context = DirContext::new(
            dir.path(),
            vec![inc1.path().to_path_buf(), inc2.path().to_path_buf()],
        );
        let rule = Rule::new(
            "CUSTOM.PGM",
            strings(&["local.rpgle", "shared.rpgle", "missing.rpgle", "DB1.FILE"]),
            strings(&["echo build"]),
            Vec::new(),
            &context,
        )
        .unwrap();

        assert_eq!(
            rule.resolved_dependencies(),
            vec![
                "$(d)/local.rpgle".to_string(),
                inc2.path().join("shared.rpgle").display().to_string(),
                "missing.rpgle".to_string(),
                "DB1.FILE".to_string(),
            ]
        );
    }

    #[test]
    fn test_equality_ignores_include_dirs() {
        let dir = TempDir::new().unwrap();
        let a = Rule::new("X.PGM", strings(&["x.clp"]), Vec::new(), Vec::new(), &ctx(&dir)).unwrap();
        let b = Rule::new(
            "x.pgm",
            strings(&["x.clp"]),
            Vec::new(),
            Vec::new(),
            &DirContext::new(dir.path(), vec![PathBuf::from("/elsewhere")]),
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
