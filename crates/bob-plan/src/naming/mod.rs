//! Object naming: source file extensions and the compiled-object categories
//! they produce.
//!
//! Everything here is driven by one immutable table, [`EXTENSIONS`]. A file
//! name is split on dots and its suffix is matched against the table from the
//! longest known multi-part extension down to a single part, so
//! `test.PGM.RPGLE` resolves to `PGM.RPGLE` rather than `RPGLE`.

mod groups;

pub use groups::TargetGroup;

use crate::diagnostic::PlanError;

/// What a recognized extension denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// A source file. `target_type` is the object type a compile produces by
    /// default; `groups` lists every group the source plausibly feeds, the
    /// canonical one first.
    Source {
        target_type: &'static str,
        groups: &'static [TargetGroup],
    },
    /// An already-built object type. Never a compile input.
    Object,
}

/// One row of the extension table.
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    pub suffix: &'static str,
    pub kind: ExtensionKind,
}

const fn source(
    suffix: &'static str,
    target_type: &'static str,
    groups: &'static [TargetGroup],
) -> Extension {
    Extension {
        suffix,
        kind: ExtensionKind::Source { target_type, groups },
    }
}

const fn object(suffix: &'static str) -> Extension {
    Extension {
        suffix,
        kind: ExtensionKind::Object,
    }
}

use TargetGroup as G;

const ILE_MODULE: &[TargetGroup] = &[G::Module, G::Pgm];

/// Recognized extensions, upper-cased.
pub const EXTENSIONS: &[Extension] = &[
    source("PGM.SQLRPGLE", "PGM", &[G::Pgm]),
    source("PGM.RPGLE", "PGM", &[G::Pgm]),
    source("PGM.CLLE", "PGM", &[G::Pgm]),
    source("PGM.CBLLE", "PGM", &[G::Pgm]),
    source("PGM.C", "PGM", &[G::Pgm]),
    source("PGM.SQLCBLLE", "PGM", &[G::Pgm]),
    source("CMDSRC", "CMD", &[G::Cmd]),
    source("CMD", "CMD", &[G::Cmd]),
    source("DSPF", "FILE", &[G::File]),
    source("LF", "FILE", &[G::File]),
    source("PF", "FILE", &[G::File]),
    source("PRTF", "FILE", &[G::File]),
    source("MENUSRC", "MENU", &[G::Menu]),
    source("MENU", "MENU", &[G::Menu]),
    source("C", "MODULE", ILE_MODULE),
    source("CPP", "MODULE", ILE_MODULE),
    source("RPGLE", "MODULE", ILE_MODULE),
    source("CLLE", "MODULE", ILE_MODULE),
    source("CBLLE", "MODULE", ILE_MODULE),
    source("SQLC", "MODULE", ILE_MODULE),
    source("SQLCPP", "MODULE", ILE_MODULE),
    source("SQLRPGLE", "MODULE", ILE_MODULE),
    source("SQLCBLLE", "MODULE", ILE_MODULE),
    source("MODULE", "PGM", &[G::Pgm, G::Srvpgm]),
    source("CLP", "PGM", &[G::Pgm]),
    source("CBL", "PGM", &[G::Pgm]),
    source("RPG", "PGM", &[G::Pgm]),
    source("ILEPGM", "PGM", &[G::Pgm]),
    source("PNLGRPSRC", "PNLGRP", &[G::Pnlgrp]),
    source("PNLGRP", "PNLGRP", &[G::Pnlgrp]),
    source("SQL", "QMQRY", &[G::Qmqry]),
    source("BND", "SRVPGM", &[G::Srvpgm]),
    source("ILESRVPGM", "SRVPGM", &[G::Srvpgm]),
    source("BNDDIR", "BNDDIR", &[G::Bndd]),
    source("DTAARA", "DTAARA", &[G::Dtaara]),
    source("DTAQ", "DTAQ", &[G::Dtaq]),
    source("SYSTRG", "PGM", &[G::Trg]),
    source("SQLPRC", "PGM", &[G::Pgm]),
    source("TABLE", "FILE", &[G::File]),
    source("PFSQL", "FILE", &[G::File]),
    source("VIEW", "FILE", &[G::File]),
    source("INDEX", "FILE", &[G::File]),
    source("SQLSEQ", "DTAARA", &[G::Dtaara]),
    source("SQLUDF", "SRVPGM", &[G::Srvpgm]),
    source("SQLTRG", "PGM", &[G::Trg]),
    source("MSGF", "MSGF", &[G::Msgf]),
    source("WSCSTSRC", "WSCST", &[G::Wscst]),
    object("PGM"),
    object("SRVPGM"),
    object("FILE"),
    object("QMQRY"),
    object("WSCST"),
    object("TRG"),
];

/// Maximum number of dot-separated parts in any extension of [`EXTENSIONS`].
pub const MAX_EXTENSION_PARTS: usize = 2;

/// A file name split into its naming parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Object name, as written.
    pub name: String,
    /// Human-readable text following a single `-` in the base name.
    pub text_attribute: Option<String>,
    /// Matched extension, upper-cased.
    pub extension: String,
    /// Directory part of the input, empty for a bare file name.
    pub dir: String,
}

impl SourceDescriptor {
    /// True when the input had no directory component.
    pub fn is_bare(&self) -> bool {
        self.dir.is_empty()
    }
}

/// Looks up an extension (case-insensitive).
pub fn lookup(extension: &str) -> Option<&'static Extension> {
    EXTENSIONS
        .iter()
        .find(|ext| ext.suffix.eq_ignore_ascii_case(extension))
}

/// Splits a file name into (name, text attribute, extension, directory).
pub fn decompose(filename: &str) -> Result<SourceDescriptor, PlanError> {
    let invalid = || PlanError::InvalidFilename {
        filename: filename.to_string(),
    };
    if filename.is_empty() {
        return Err(invalid());
    }

    let (dir, base) = match filename.rfind('/') {
        Some(0) => ("/", &filename[1..]),
        Some(idx) => (&filename[..idx], &filename[idx + 1..]),
        None => ("", filename),
    };

    let parts: Vec<&str> = base.split('.').collect();
    for ext_len in (1..=MAX_EXTENSION_PARTS).rev() {
        if ext_len >= parts.len() {
            continue;
        }
        let split = parts.len() - ext_len;
        let ext = parts[split..].join(".").to_ascii_uppercase();
        if lookup(&ext).is_none() {
            continue;
        }
        let stem = parts[..split].join(".");
        let (name, text_attribute) = match stem.split('-').collect::<Vec<_>>().as_slice() {
            [name, text] => (name.to_string(), Some(text.to_string())),
            _ => (stem.clone(), None),
        };
        return Ok(SourceDescriptor {
            name,
            text_attribute,
            extension: ext,
            dir: dir.to_string(),
        });
    }

    Err(invalid())
}

/// True iff the name decomposes and its extension is a source extension.
pub fn is_source(filename: &str) -> bool {
    decompose(filename)
        .ok()
        .and_then(|d| lookup(&d.extension))
        .is_some_and(|ext| matches!(ext.kind, ExtensionKind::Source { .. }))
}

/// True for a source file name without a directory part.
pub fn is_bare_source(filename: &str) -> bool {
    decompose(filename).is_ok_and(|d| d.is_bare()) && is_source(filename)
}

/// Every group a source extension plausibly produces, canonical first.
///
/// Empty for object suffixes and unknown extensions.
pub fn target_groups_for(extension: &str) -> &'static [TargetGroup] {
    match lookup(extension).map(|ext| ext.kind) {
        Some(ExtensionKind::Source { groups, .. }) => groups,
        _ => &[],
    }
}

/// The object type a target name declares (its last dot-separated part),
/// upper-cased.
pub fn declared_type(target: &str) -> String {
    target
        .rsplit('.')
        .next()
        .unwrap_or(target)
        .to_ascii_uppercase()
}

/// The default compile target for a source file: `NAME.TYPE`, upper-cased.
pub fn target_for(filename: &str) -> Result<String, PlanError> {
    let descriptor = decompose(filename)?;
    match lookup(&descriptor.extension).map(|ext| ext.kind) {
        Some(ExtensionKind::Source { target_type, .. }) => Ok(format!(
            "{}.{}",
            descriptor.name.to_ascii_uppercase(),
            target_type
        )),
        _ => Err(PlanError::InvalidFilename {
            filename: filename.to_string(),
        }),
    }
}
