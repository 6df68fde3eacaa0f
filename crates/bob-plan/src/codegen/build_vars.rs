//! The build-variables file handed to make as `BUILDVARSMKPATH`.

use std::path::PathBuf;

use crate::config::{EffectiveConfig, ProjectConfig};

/// `INCDIR` value meaning "no include directories".
const NO_INCDIR: &str = "*NONE";

/// Placeholder make turns back into newlines between setup commands.
const CMD_SEPARATOR: &str = "\\n";

/// The include path as a quoted CL list, or `*NONE`.
pub fn incdir(include_path: &[String]) -> String {
    let only_none = include_path.len() == 1 && include_path[0].eq_ignore_ascii_case(NO_INCDIR);
    if include_path.is_empty() || only_none {
        return NO_INCDIR.to_string();
    }
    include_path
        .iter()
        .map(|dir| format!("'{}'", dir))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders global settings followed by one `TGTCCSID_` / `OBJPATH_` pair per
/// directory, in the order given.
pub fn render_build_vars(
    project: &ProjectConfig,
    dirs: &[(PathBuf, EffectiveConfig)],
    color: bool,
) -> String {
    let mut output = String::new();
    let incdir = incdir(&project.include_path);

    output.push_str("# This file is generated by makei, DO NOT EDIT.\n");
    output.push_str("# Modify .ibmi.json to override values\n\n");
    output.push_str(&format!("curlib := {}\n", project.curlib));
    output.push_str(&format!("preUsrlibl := {}\n", project.pre_usr_libl.join(" ")));
    output.push_str(&format!("postUsrlibl := {}\n", project.post_usr_libl.join(" ")));
    output.push_str(&format!("INCDIR := {}\n", incdir));
    output.push_str(&format!("unquotedINCDIR := {}\n", project.include_path.join(" ")));
    output.push_str(&format!("doublequotedINCDIR := {}\n", incdir.replace('\'', "''")));
    output.push_str(&format!(
        "IBMiEnvCmd := {}\n",
        project.set_ibmi_env_cmd.join(CMD_SEPARATOR)
    ));
    output.push_str(&format!("COLOR_TTY := {}\n\n", color));

    for (dir, config) in dirs {
        output.push_str(&format!("TGTCCSID_{} := {}\n", dir.display(), config.tgt_ccsid));
        output.push_str(&format!("OBJPATH_{} := {}\n", dir.display(), config.objpath()));
    }

    output
}
