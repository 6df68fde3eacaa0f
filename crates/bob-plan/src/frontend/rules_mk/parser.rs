//! Parser turning `Rules.mk` text into a [`Descriptor`].
//!
//! Two states: scanning top-level declarations, and collecting the indented
//! body of a recipe. Everything that depends on the filesystem (wildcard
//! expansion, member text, subdirectory casing) happens in a post-pass once
//! all lines are consumed.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::lexer::{self, LineEvent};
use super::member_text;
use crate::diagnostic::{Location, PlanError, Warning, WarningKind};
use crate::ir::{Descriptor, DirContext, Rule};
use crate::naming;

/// Result of parsing one descriptor.
#[derive(Debug)]
pub struct Parsed {
    pub descriptor: Descriptor,
    pub warnings: Vec<Warning>,
}

/// A recipe whose body is still being read.
struct PendingRecipe {
    target: String,
    dependencies: Vec<String>,
    commands: Vec<String>,
    line: usize,
}

enum State {
    Scanning,
    InRecipe(PendingRecipe),
}

struct WildcardRule {
    target_ext: String,
    source_ext: String,
    extra: Vec<String>,
}

struct TargetVars {
    assignments: Vec<String>,
    line: usize,
}

/// Parses descriptor text belonging to `ctx.containing_dir`. `file` is only
/// used for diagnostics.
pub fn parse_str(source: &str, file: &Path, ctx: &DirContext) -> Result<Parsed, PlanError> {
    Parser::new(file, ctx).run(source)
}

/// Reads and parses a descriptor file.
pub fn parse_file(path: &Path, include_dirs: &[PathBuf]) -> Result<Parsed, PlanError> {
    let source = fs::read_to_string(path).map_err(|e| PlanError::io(path, e.to_string()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let ctx = DirContext::new(dir, include_dirs.to_vec());
    parse_str(&source, path, &ctx)
}

struct Parser<'a> {
    file: &'a Path,
    ctx: &'a DirContext,
    subdirs: Vec<String>,
    locals: HashMap<String, String>,
    rules: Vec<Rule>,
    target_vars: BTreeMap<String, TargetVars>,
    wildcard_vars: Vec<(String, String)>,
    wildcard_rules: Vec<WildcardRule>,
    warnings: Vec<Warning>,
}

impl<'a> Parser<'a> {
    fn new(file: &'a Path, ctx: &'a DirContext) -> Self {
        Self {
            file,
            ctx,
            subdirs: Vec::new(),
            locals: HashMap::new(),
            rules: Vec::new(),
            target_vars: BTreeMap::new(),
            wildcard_vars: Vec::new(),
            wildcard_rules: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self, source: &str) -> Result<Parsed, PlanError> {
        let mut state = State::Scanning;

        for line in lexer::logical_lines(source) {
            let event = lexer::classify(&line.text);
            state = match state {
                State::InRecipe(recipe) => self.recipe_line(recipe, event, line.number)?,
                State::Scanning => self.scan_line(event, line.number),
            };
        }
        if let State::InRecipe(recipe) = state {
            self.close_recipe(recipe)?;
        }

        self.finish()
    }

    fn location(&self, line: usize) -> Location {
        Location::new(self.file, line)
    }

    fn recipe_line(
        &mut self,
        mut recipe: PendingRecipe,
        event: LineEvent,
        line: usize,
    ) -> Result<State, PlanError> {
        match event {
            LineEvent::RecipeBody(body) => {
                if body.starts_with('#') {
                    return Ok(State::InRecipe(recipe));
                }
                match lexer::classify(&body) {
                    LineEvent::PerTargetVarDecl { target, assignment }
                        if target.eq_ignore_ascii_case(&recipe.target) =>
                    {
                        self.add_target_var(&target, &assignment, line);
                    }
                    _ => recipe.commands.push(body),
                }
                Ok(State::InRecipe(recipe))
            }
            other => {
                self.close_recipe(recipe)?;
                Ok(self.scan_line(other, line))
            }
        }
    }

    fn scan_line(&mut self, event: LineEvent, line: usize) -> State {
        match event {
            LineEvent::Blank | LineEvent::Comment => {}
            LineEvent::RecipeBody(body) => {
                if !body.is_empty() {
                    return self.scan_line(lexer::classify(&body), line);
                }
            }
            LineEvent::SubdirsDecl(subdirs) => self.subdirs = subdirs,
            LineEvent::LocalVarDecl { key, value } => {
                let value = self.substitute(&value);
                self.locals.insert(key, value);
            }
            LineEvent::PerTargetVarDecl { target, assignment } => {
                self.add_target_var(&target, &assignment, line);
            }
            LineEvent::WildcardVarDecl { suffix, assignment } => {
                let assignment = self.substitute(&assignment);
                self.wildcard_vars.push((suffix, assignment));
            }
            LineEvent::WildcardRuleDecl {
                target_ext,
                source_ext,
                extra,
            } => {
                let extra = extra.iter().map(|dep| self.substitute(dep)).collect();
                self.wildcard_rules.push(WildcardRule {
                    target_ext,
                    source_ext,
                    extra,
                });
            }
            LineEvent::RecipeHeader {
                target,
                dependencies,
            } => {
                return State::InRecipe(PendingRecipe {
                    target,
                    dependencies,
                    commands: Vec::new(),
                    line,
                });
            }
            LineEvent::Unrecognized(text) => {
                let warning = Warning::new(
                    WarningKind::RuleSyntax { line: text },
                    Some(self.location(line)),
                );
                warn!("{}", warning);
                self.warnings.push(warning);
            }
        }
        State::Scanning
    }

    fn add_target_var(&mut self, target: &str, assignment: &str, line: usize) {
        let assignment = self.substitute(assignment);
        self.target_vars
            .entry(target.to_ascii_uppercase())
            .or_insert_with(|| TargetVars {
                assignments: Vec::new(),
                line,
            })
            .assignments
            .push(assignment);
    }

    fn close_recipe(&mut self, recipe: PendingRecipe) -> Result<(), PlanError> {
        let rule = Rule::new(
            &recipe.target,
            recipe.dependencies,
            recipe.commands,
            Vec::new(),
            self.ctx,
        )
        .map_err(|e| e.at(self.location(recipe.line)))?;
        self.rules.push(rule);
        Ok(())
    }

    /// Replaces `$(KEY)` with file-local variables; unknown keys are kept for
    /// make to expand.
    fn substitute(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("$(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find(')') {
                Some(end) => {
                    let key = &after[..end];
                    match self.locals.get(key) {
                        Some(replacement) => out.push_str(replacement),
                        None => out.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn finish(mut self) -> Result<Parsed, PlanError> {
        let expanded = self.expand_wildcards()?;
        let mut rules = std::mem::take(&mut self.rules);
        rules.extend(expanded);

        for rule in &mut rules {
            if !rule.is_custom() {
                let target_type = rule.target_type();
                let mut variables: Vec<String> = self
                    .wildcard_vars
                    .iter()
                    .filter(|(suffix, _)| *suffix == target_type)
                    .map(|(_, assignment)| assignment.clone())
                    .collect();
                variables.append(&mut rule.variables);
                rule.variables = variables;
            }
            if let Some(vars) = self.target_vars.remove(&rule.target) {
                rule.variables.extend(vars.assignments);
            }
        }

        for (target, vars) in std::mem::take(&mut self.target_vars) {
            let warning = Warning::new(
                WarningKind::OrphanVariables { target },
                Some(self.location(vars.line)),
            );
            warn!("{}", warning);
            self.warnings.push(warning);
        }

        for rule in &mut rules {
            if let Some(path) = rule.source_path() {
                if let Some(text) = member_text::find_member_text(&path)? {
                    rule.import_text(&text);
                }
            }
        }

        let subdirs = self.reconcile_subdirs()?;
        let descriptor = Descriptor::new(&self.ctx.containing_dir, subdirs, rules);
        debug!(
            file = %self.file.display(),
            rules = descriptor.rules.len(),
            warnings = self.warnings.len(),
            "parsed descriptor"
        );

        Ok(Parsed {
            descriptor,
            warnings: self.warnings,
        })
    }

    /// Synthesizes one rule per matching file for every wildcard rule.
    /// Explicitly declared targets are never replaced.
    fn expand_wildcards(&self) -> Result<Vec<Rule>, PlanError> {
        if self.wildcard_rules.is_empty() {
            return Ok(Vec::new());
        }

        let files = self.list_dir(true)?;
        let mut expanded: Vec<Rule> = Vec::new();

        for wildcard in &self.wildcard_rules {
            for file in &files {
                let descriptor = match naming::decompose(file) {
                    Ok(d) if d.extension == wildcard.source_ext => d,
                    _ => continue,
                };
                let target = format!("{}.{}", descriptor.name, wildcard.target_ext).to_ascii_uppercase();
                let declared = self
                    .rules
                    .iter()
                    .chain(expanded.iter())
                    .any(|rule| rule.target == target);
                if declared {
                    continue;
                }

                let mut dependencies = vec![file.clone()];
                dependencies.extend(wildcard.extra.iter().cloned());
                expanded.push(Rule::new(&target, dependencies, Vec::new(), Vec::new(), self.ctx)?);
            }
        }

        Ok(expanded)
    }

    fn reconcile_subdirs(&self) -> Result<Vec<String>, PlanError> {
        if self.subdirs.is_empty() {
            return Ok(Vec::new());
        }
        let on_disk: HashMap<String, String> = self
            .list_dir(false)?
            .into_iter()
            .map(|name| (name.to_lowercase(), name))
            .collect();

        Ok(self
            .subdirs
            .iter()
            .map(|subdir| {
                on_disk
                    .get(&subdir.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| subdir.clone())
            })
            .collect())
    }

    /// Sorted entry names of the containing directory: files when `files`,
    /// directories otherwise.
    fn list_dir(&self, files: bool) -> Result<Vec<String>, PlanError> {
        let dir = &self.ctx.containing_dir;
        let entries = fs::read_dir(dir).map_err(|e| PlanError::io(dir, e.to_string()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PlanError::io(dir, e.to_string()))?;
            let path = entry.path();
            if path.is_file() == files && (files || path.is_dir()) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::TargetGroup;
    use tempfile::TempDir;

    fn parse(dir: &TempDir, text: &str) -> Parsed {
        let ctx = DirContext::new(dir.path(), Vec::new());
        parse_str(text, &dir.path().join("Rules.mk"), &ctx).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recipe_with_private_variable_block() {
        let dir = TempDir::new().unwrap();
        let text = "\
SUBDIRS := adir bdir

VAT300.MODULE : vat300.rpgle some.rpgleinc
\tVAT300.MODULE: private DFTACTGRP = *NO
\tVAT300.MODULE: private TEXT := Andy is cool
VAT300.MODULE: private VARAPPEND+=APPEND2 # we support end of line comments
";
        let parsed = parse(&dir, text);
        let descriptor = parsed.descriptor;

        assert_eq!(descriptor.subdirs, strings(&["adir", "bdir"]));
        assert_eq!(descriptor.rules.len(), 1);
        let rule = &descriptor.rules[0];
        assert_eq!(rule.target, "VAT300.MODULE");
        assert_eq!(rule.source.as_deref(), Some("vat300.rpgle"));
        assert_eq!(rule.dependencies, strings(&["some.rpgleinc"]));
        assert!(rule.commands.is_empty());
        assert_eq!(
            rule.variables,
            strings(&[
                "private DFTACTGRP = *NO",
                "private TEXT := Andy is cool",
                "private VARAPPEND+=APPEND2 # we support end of line comments",
            ])
        );
        assert_eq!(
            descriptor.targets_in(TargetGroup::Module),
            &strings(&["VAT300.MODULE"])[..]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_custom_recipe_block() {
        let dir = TempDir::new().unwrap();
        let text = "\
TMPDETORD.FILE:
\tsystem -i \"CPYF FROMFILE($(OBJLIB)/DETORD) TOFILE($(OBJLIB)/TMPDETORD) CRTFILE(*YES)\"
";
        let rule = &parse(&dir, text).descriptor.rules[0];
        assert!(rule.dependencies.is_empty());
        assert!(rule.source.is_none());
        assert_eq!(
            rule.commands,
            strings(&[
                "@$(call echo_cmd,=== Creating [TMPDETORD.FILE] from custom recipe)",
                "system -i \"CPYF FROMFILE($(OBJLIB)/DETORD) TOFILE($(OBJLIB)/TMPDETORD) CRTFILE(*YES)\"",
                "@$(call echo_success_cmd,End of creating TMPDETORD.FILE)",
            ])
        );
    }

    #[test]
    fn test_blank_line_closes_recipe() {
        let dir = TempDir::new().unwrap();
        let text = "A.FILE:\n\techo a\n\n\techo b\n";
        let descriptor = parse(&dir, text).descriptor;
        assert_eq!(descriptor.rules.len(), 1);
        assert_eq!(descriptor.rules[0].user_commands(), &strings(&["echo a"])[..]);
    }

    #[test]
    fn test_whitespace_line_keeps_recipe_open() {
        let dir = TempDir::new().unwrap();
        let text = "A.FILE:\n\techo a\n  \n\t# note\n\techo b\n";
        let descriptor = parse(&dir, text).descriptor;
        assert_eq!(descriptor.rules[0].user_commands(), &strings(&["echo a", "echo b"])[..]);
    }

    #[test]
    fn test_local_variable_substitution() {
        let dir = TempDir::new().unwrap();
        let text = "\
CURRENT:=V7R5
X.MODULE: x.rpgle
X.MODULE: TGTVER=$(CURRENT)
X.MODULE: LIB=$(OBJLIB)
";
        let rule = &parse(&dir, text).descriptor.rules[0];
        assert_eq!(rule.variables, strings(&["TGTVER=V7R5", "LIB=$(OBJLIB)"]));
    }

    #[test]
    fn test_wildcard_expansion_and_precedence() {
        let dir = TempDir::new().unwrap();
        for file in ["bar.rpgle", "foo.rpgle", "AB2001.B.rpgle", "hello.pgm.rpgle", "notes.txt"] {
            fs::write(dir.path().join(file), "").unwrap();
        }
        let text = "\
HEADER := some
%.MODULE: %.rpgle $(HEADER).rpgleinc
%.MODULE: TEXT := hardcoded for all mod
bar.MODULE: bar.rpgle bar.TABLE
bar.MODULE: COMMIT=*NONE
Foo.MODULE: TGTVER=V7R5
";
        let parsed = parse(&dir, text);
        let rules = &parsed.descriptor.rules;

        let targets: Vec<&str> = rules.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["BAR.MODULE", "AB2001.B.MODULE", "FOO.MODULE"]);

        assert_eq!(rules[0].dependencies, strings(&["bar.TABLE"]));
        assert_eq!(
            rules[0].variables,
            strings(&["TEXT := hardcoded for all mod", "COMMIT=*NONE"])
        );
        assert_eq!(rules[2].source.as_deref(), Some("foo.rpgle"));
        assert_eq!(rules[2].dependencies, strings(&["some.rpgleinc"]));
        assert_eq!(
            rules[2].variables,
            strings(&["TEXT := hardcoded for all mod", "TGTVER=V7R5"])
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_wildcard_variables_skip_custom_rules() {
        let dir = TempDir::new().unwrap();
        let text = "%.FILE: TEXT = all files\nX.FILE:\n\techo x\nY.FILE: y.pf\n";
        let rules = parse(&dir, text).descriptor.rules;
        assert!(rules[0].variables.is_empty());
        assert_eq!(rules[1].variables, strings(&["TEXT = all files"]));
    }

    #[test]
    fn test_unrecognized_and_orphan_warnings() {
        let dir = TempDir::new().unwrap();
        let text = "this is not make\nGHOST.PGM: TEXT = nobody\n";
        let parsed = parse(&dir, text);
        assert!(parsed.descriptor.rules.is_empty());
        let kinds: Vec<_> = parsed.warnings.iter().map(|w| w.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::RuleSyntax {
                    line: "this is not make".into()
                },
                WarningKind::OrphanVariables {
                    target: "GHOST.PGM".into()
                },
            ]
        );
        assert_eq!(parsed.warnings[0].location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_semantic_errors_are_fatal_with_location() {
        let dir = TempDir::new().unwrap();
        let ctx = DirContext::new(dir.path(), Vec::new());
        let err = parse_str("\nEMPTY.PGM:\n", &dir.path().join("Rules.mk"), &ctx).unwrap_err();
        match err {
            PlanError::MissingSource { target, location } => {
                assert_eq!(target, "EMPTY.PGM");
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_target_type_is_fatal_with_location() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("foo.rpgle"), "").unwrap();
        let ctx = DirContext::new(dir.path(), Vec::new());
        let err = parse_str("# objects\nFOO.XYZ: foo.rpgle\n", &dir.path().join("Rules.mk"), &ctx)
            .unwrap_err();
        match err {
            PlanError::UnclassifiableTarget { target, location } => {
                assert_eq!(target, "FOO.XYZ");
                assert_eq!(location.unwrap().line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_member_text_is_imported() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("art200.rpgle"),
            "     * %METADATA *\n     * %TEXT Work with article *\n     * %EMETADATA *\n",
        )
        .unwrap();
        let rule = &parse(&dir, "ART200.MODULE: art200.rpgle\nART200.MODULE: TGTRLS=*CURRENT\n")
            .descriptor
            .rules[0];
        assert_eq!(
            rule.variables,
            strings(&["TGTRLS=*CURRENT", "TEXT = Work with article"])
        );
    }

    #[test]
    fn test_subdirs_take_on_disk_casing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("QDDSSRC")).unwrap();
        let descriptor = parse(&dir, "SUBDIRS = qddssrc functionsVAT\n").descriptor;
        assert_eq!(descriptor.subdirs, strings(&["QDDSSRC", "functionsVAT"]));
    }

    #[test]
    fn test_source_mapping_for_shared_source() {
        let dir = TempDir::new().unwrap();
        let text = "OBSCURE.MODULE: LONGSOURCEFILENAME.RPGLE\nHELLO.PGM: HELLO.RPGLE\nHELLO.MODULE: HELLO.RPGLE\nWORLD.PGM: WORLD.PGM.RPGLE\n";
        let descriptor = parse(&dir, text).descriptor;
        assert_eq!(
            descriptor.targets_for_source("hello.rpgle"),
            &strings(&["HELLO.PGM", "HELLO.MODULE"])[..]
        );
        assert_eq!(
            descriptor.targets_in(TargetGroup::Module),
            &strings(&["OBSCURE.MODULE", "HELLO.MODULE"])[..]
        );
        assert_eq!(
            descriptor.targets_in(TargetGroup::Pgm),
            &strings(&["HELLO.PGM", "WORLD.PGM"])[..]
        );
    }
}
