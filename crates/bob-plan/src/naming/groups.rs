//! Target groups: the categories of compiled objects the make engine builds
//! in order.

use std::fmt;

/// Canonical compiled-output category.
///
/// Declaration order is the order group variables are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetGroup {
    Trg,
    Dtaara,
    Dtaq,
    Bndd,
    File,
    Cmd,
    Module,
    Srvpgm,
    Pgm,
    Menu,
    Pnlgrp,
    Qmqry,
    Wscst,
    Msgf,
}

impl TargetGroup {
    pub const ALL: [TargetGroup; 14] = [
        TargetGroup::Trg,
        TargetGroup::Dtaara,
        TargetGroup::Dtaq,
        TargetGroup::Bndd,
        TargetGroup::File,
        TargetGroup::Cmd,
        TargetGroup::Module,
        TargetGroup::Srvpgm,
        TargetGroup::Pgm,
        TargetGroup::Menu,
        TargetGroup::Pnlgrp,
        TargetGroup::Qmqry,
        TargetGroup::Wscst,
        TargetGroup::Msgf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TargetGroup::Trg => "TRG",
            TargetGroup::Dtaara => "DTAARA",
            TargetGroup::Dtaq => "DTAQ",
            TargetGroup::Bndd => "BNDD",
            TargetGroup::File => "FILE",
            TargetGroup::Cmd => "CMD",
            TargetGroup::Module => "MODULE",
            TargetGroup::Srvpgm => "SRVPGM",
            TargetGroup::Pgm => "PGM",
            TargetGroup::Menu => "MENU",
            TargetGroup::Pnlgrp => "PNLGRP",
            TargetGroup::Qmqry => "QMQRY",
            TargetGroup::Wscst => "WSCST",
            TargetGroup::Msgf => "MSGF",
        }
    }

    /// The aggregate make variable name, e.g. `MODULEs`.
    pub fn plural(self) -> String {
        format!("{}s", self.name())
    }

    /// The group an object-type suffix (`PGM`, `BNDDIR`, ...) belongs to.
    pub fn from_object_type(object_type: &str) -> Option<TargetGroup> {
        let group = match object_type.to_ascii_uppercase().as_str() {
            "TRG" => TargetGroup::Trg,
            "DTAARA" => TargetGroup::Dtaara,
            "DTAQ" => TargetGroup::Dtaq,
            "BNDDIR" => TargetGroup::Bndd,
            "FILE" => TargetGroup::File,
            "CMD" => TargetGroup::Cmd,
            "MODULE" => TargetGroup::Module,
            "SRVPGM" => TargetGroup::Srvpgm,
            "PGM" => TargetGroup::Pgm,
            "MENU" => TargetGroup::Menu,
            "PNLGRP" => TargetGroup::Pnlgrp,
            "QMQRY" => TargetGroup::Qmqry,
            "WSCST" => TargetGroup::Wscst,
            "MSGF" => TargetGroup::Msgf,
            _ => return None,
        };
        Some(group)
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
