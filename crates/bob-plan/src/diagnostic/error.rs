//! Plan error and warning types.
#![allow(unused_assignments)]

use std::fmt;
use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use super::Location;

/// Errors that abort plan emission.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum PlanError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(makei::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Config Errors
    // =========================================================================
    #[error("Project record not found: {}", path.display())]
    #[diagnostic(
        code(makei::config::project_missing),
        help("Run the build from the project root, next to iproj.json")
    )]
    ProjectConfigMissing {
        path: PathBuf,
    },

    #[error("Malformed config record '{}': {message}", path.display())]
    #[diagnostic(code(makei::config::malformed))]
    MalformedConfig {
        path: PathBuf,
        message: String,
    },

    #[error("Environment variable '{name}' is referenced as '&{name}' but not defined")]
    #[diagnostic(
        code(makei::config::undefined_placeholder),
        help("Define it in the environment or pass -e {name}=<value>")
    )]
    UndefinedEnvVar {
        name: String,
    },

    #[error("Invalid target CCSID '{value}'")]
    #[diagnostic(
        code(makei::config::invalid_ccsid),
        help("Use *JOB or a numeric CCSID other than 65535")
    )]
    InvalidCcsid {
        value: String,
    },

    #[error("Object library resolves to an empty name")]
    #[diagnostic(code(makei::config::empty_objlib))]
    EmptyObjectLibrary,

    // =========================================================================
    // Naming Errors
    // =========================================================================
    #[error("Cannot decompose filename '{filename}': no recognized extension")]
    #[diagnostic(
        code(makei::naming::invalid_filename),
        help("Source files are named NAME[-Text].EXT, e.g. VAT300.RPGLE or ART200-Work_with_article.PGM.SQLRPGLE")
    )]
    InvalidFilename {
        filename: String,
    },

    // =========================================================================
    // Rule Semantic Errors
    // =========================================================================
    #[error("Target '{target}' does not map to any target group")]
    #[diagnostic(
        code(makei::rule::unclassifiable_target),
        help("Targets are named NAME.TYPE where TYPE is PGM, MODULE, SRVPGM, FILE, CMD, MENU, PNLGRP, QMQRY, WSCST, MSGF, BNDDIR, DTAARA, DTAQ or TRG")
    )]
    UnclassifiableTarget {
        target: String,
        location: Option<Location>,
    },

    #[error("No source file found for target '{target}'")]
    #[diagnostic(
        code(makei::rule::missing_source),
        help("List the source file as the first dependency or give the recipe literal commands")
    )]
    MissingSource {
        target: String,
        location: Option<Location>,
    },
}

impl PlanError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attaches a descriptor location to rule errors that lack one.
    pub fn at(self, here: Location) -> Self {
        match self {
            Self::UnclassifiableTarget { target, location: None } => Self::UnclassifiableTarget {
                target,
                location: Some(here),
            },
            Self::MissingSource { target, location: None } => Self::MissingSource {
                target,
                location: Some(here),
            },
            other => other,
        }
    }
}

/// Non-fatal findings reported while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A descriptor line matching no grammar production.
    RuleSyntax { line: String },
    /// Variables declared for a target no rule produces.
    OrphanVariables { target: String },
    /// A requested selector resolving to nothing.
    UnmatchedSelector { selector: String },
    /// A requested selector resolving in more than one directory.
    AmbiguousSelector { selector: String, candidates: Vec<PathBuf> },
}

/// A non-fatal finding with an optional descriptor location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub location: Option<Location>,
}

impl Warning {
    pub fn new(kind: WarningKind, location: Option<Location>) -> Self {
        Self { kind, location }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        match &self.kind {
            WarningKind::RuleSyntax { line } => write!(f, "skipped unrecognized line '{}'", line),
            WarningKind::OrphanVariables { target } => {
                write!(f, "variables declared for '{}' but no rule builds it", target)
            }
            WarningKind::UnmatchedSelector { selector } => {
                write!(f, "'{}' does not match any target", selector)
            }
            WarningKind::AmbiguousSelector { selector, candidates } => {
                let dirs: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "'{}' matches targets in {}; using the first",
                    selector,
                    dirs.join(", ")
                )
            }
        }
    }
}
