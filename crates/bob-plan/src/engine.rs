//! The contract with the external make engine: how it is invoked and how its
//! output reports per-target outcomes.

use std::path::{Path, PathBuf};

use crate::select::ALL;

/// Printed by the engine after an object was built.
pub const SUCCESS_MARKER: &str = "was created successfully!";

/// Printed by the engine when an object failed to build.
pub const FAILURE_MARKER: &str = "Failed to create";

/// Default make executable.
pub const MAKE: &str = "make";

/// One run of the make engine over a written plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeInvocation {
    pub program: String,
    pub build_vars: PathBuf,
    pub bob_path: PathBuf,
    pub options: Vec<String>,
    pub goals: Vec<String>,
}

impl MakeInvocation {
    pub fn new(build_vars: impl Into<PathBuf>, bob_path: impl Into<PathBuf>) -> Self {
        Self {
            program: MAKE.to_string(),
            build_vars: build_vars.into(),
            bob_path: bob_path.into(),
            options: Vec::new(),
            goals: Vec::new(),
        }
    }

    /// Free-form make options, split on whitespace.
    pub fn with_options(mut self, options: &str) -> Self {
        self.options = options.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The engine's top-level makefile.
    pub fn makefile(&self) -> PathBuf {
        makefile_in(&self.bob_path)
    }

    /// Goals to build; `all` when none were given.
    pub fn effective_goals(&self) -> Vec<String> {
        if self.goals.is_empty() {
            vec![ALL.to_string()]
        } else {
            self.goals.clone()
        }
    }

    /// Arguments for the make process, without shell quoting.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-k".to_string(),
            format!("BUILDVARSMKPATH={}", self.build_vars.display()),
            "-k".to_string(),
            format!("BOB={}", self.bob_path.display()),
            "-f".to_string(),
            self.makefile().display().to_string(),
        ];
        args.extend(self.options.iter().cloned());
        args.extend(self.effective_goals());
        args
    }

    /// The command as a shell would show it, for logs.
    pub fn command_line(&self) -> String {
        let mut line = format!(
            "{} -k BUILDVARSMKPATH=\"{}\" -k BOB=\"{}\" -f \"{}\"",
            self.program,
            self.build_vars.display(),
            self.bob_path.display(),
            self.makefile().display()
        );
        for option in &self.options {
            line.push(' ');
            line.push_str(option);
        }
        for goal in self.effective_goals() {
            line.push(' ');
            line.push_str(&goal);
        }
        line
    }
}

fn makefile_in(bob_path: &Path) -> PathBuf {
    bob_path.join("src").join("mk").join("Makefile")
}

/// Collects target outcomes from engine output, line by line.
#[derive(Debug, Clone, Default)]
pub struct OutcomeScanner {
    succeeded: Vec<String>,
    failed: Vec<String>,
}

impl OutcomeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&mut self, line: &str) {
        if line.contains(FAILURE_MARKER) {
            if let Some(last) = line.split_whitespace().last() {
                let target = last.split('!').next().unwrap_or(last);
                if !target.is_empty() {
                    self.failed.push(target.to_string());
                }
            }
        } else if line.contains(SUCCESS_MARKER) {
            if let Some(target) = line.split_whitespace().nth(1) {
                self.succeeded.push(target.to_string());
            }
        }
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// Final outcome once make has exited.
    pub fn finish(self, make_succeeded: bool) -> BuildOutcome {
        BuildOutcome {
            succeeded: self.succeeded,
            failed: self.failed,
            make_succeeded,
        }
    }
}

/// What a make run built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub make_succeeded: bool,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.make_succeeded && self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// `Objects: N failed M succeed T total`
    pub fn summary(&self) -> String {
        format!(
            "Objects: {} failed {} succeed {} total",
            self.failed.len(),
            self.succeeded.len(),
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_args() {
        let invocation = MakeInvocation::new("/tmp/vars.mk", "/QOpenSys/pkgs/lib/bob")
            .with_options("-j4  --silent");
        assert_eq!(
            invocation.args(),
            vec![
                "-k",
                "BUILDVARSMKPATH=/tmp/vars.mk",
                "-k",
                "BOB=/QOpenSys/pkgs/lib/bob",
                "-f",
                "/QOpenSys/pkgs/lib/bob/src/mk/Makefile",
                "-j4",
                "--silent",
                "all",
            ]
        );
    }

    #[test]
    fn test_command_line() {
        let invocation = MakeInvocation::new("/tmp/vars.mk", "/bob")
            .with_goals(vec!["dir_QDDSSRC".into(), "VAT300.MODULE".into()]);
        assert_eq!(
            invocation.command_line(),
            "make -k BUILDVARSMKPATH=\"/tmp/vars.mk\" -k BOB=\"/bob\" -f \"/bob/src/mk/Makefile\" dir_QDDSSRC VAT300.MODULE"
        );
    }

    #[test]
    fn test_scanner() {
        let mut scanner = OutcomeScanner::new();
        scanner.scan("=== Creating RPG module [VAT300.MODULE]");
        scanner.scan("✓ VAT300.MODULE was created successfully!");
        scanner.scan("✗ Failed to create ART200.PGM!");
        scanner.scan("make: *** [ART200.PGM] Error 1");

        assert_eq!(scanner.succeeded(), ["VAT300.MODULE"]);
        assert_eq!(scanner.failed(), ["ART200.PGM"]);

        let outcome = scanner.finish(false);
        assert!(!outcome.is_success());
        assert_eq!(outcome.summary(), "Objects: 1 failed 1 succeed 2 total");
    }

    #[test]
    fn test_success_requires_clean_exit() {
        let mut scanner = OutcomeScanner::new();
        scanner.scan("✓ A.PGM was created successfully!");
        assert!(scanner.clone().finish(true).is_success());
        assert!(!scanner.finish(false).is_success());
    }
}
