//! Rendering of descriptors into the `.Rules.mk.build` form the make engine
//! includes.

use crate::ir::{Descriptor, Rule};

/// Renders one rule: either `_SRC` / `_DEP` / `_RECIPE` assignments or a
/// custom recipe block, followed by its target-specific variables.
pub fn render_rule(rule: &Rule) -> String {
    let mut output = String::new();
    let target = &rule.target;

    if rule.is_custom() {
        output.push_str(&format!("{}_CUSTOM_RECIPE=true\n", target));
        output.push_str(&format!("{} : {}\n", target, rule.resolved_dependencies().join(" ")));
        for command in &rule.commands {
            output.push_str(&format!("\t{}\n", command));
        }
    } else {
        output.push_str(&format!(
            "{}_SRC={}\n",
            target,
            rule.source_reference().unwrap_or_default()
        ));
        output.push_str(&format!("{}_DEP={}\n", target, rule.resolved_dependencies().join(" ")));
        output.push_str(&format!(
            "{}_RECIPE={}\n",
            target,
            rule.recipe_name().unwrap_or_default()
        ));
    }

    for variable in &rule.variables {
        output.push_str(&format!("{}: {}\n", target, variable));
    }

    output
}

/// Renders a whole descriptor: subdirectories, one aggregate variable per
/// non-empty target group, then every rule.
pub fn render_descriptor(descriptor: &Descriptor) -> String {
    let mut output = String::new();

    if !descriptor.subdirs.is_empty() {
        output.push_str(&format!("SUBDIRS := {}\n\n", descriptor.subdirs.join(" ")));
    }

    for (group, targets) in &descriptor.targets {
        if !targets.is_empty() {
            output.push_str(&format!("{} := {}\n", group.plural(), targets.join(" ")));
        }
    }
    output.push_str("\n\n");

    for rule in &descriptor.rules {
        output.push_str(&render_rule(rule));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::rules_mk::parse_str;
    use crate::ir::DirContext;
    use std::fs;
    use tempfile::TempDir;

    fn parse(dir: &TempDir, text: &str) -> Descriptor {
        let ctx = DirContext::new(dir.path(), Vec::new());
        parse_str(text, &dir.path().join("Rules.mk"), &ctx)
            .unwrap()
            .descriptor
    }

    #[test]
    fn test_generated_rule() {
        let dir = TempDir::new().unwrap();
        let descriptor = parse(
            &dir,
            "SUBDIRS := adir bdir\nVAT300.MODULE : vat300.rpgle some.rpgleinc\nVAT300.MODULE: private DFTACTGRP = *NO\n",
        );
        assert_eq!(
            render_descriptor(&descriptor),
            "SUBDIRS := adir bdir

MODULEs := VAT300.MODULE


VAT300.MODULE_SRC=vat300.rpgle
VAT300.MODULE_DEP=some.rpgleinc
VAT300.MODULE_RECIPE=RPGLE_TO_MODULE_RECIPE
VAT300.MODULE: private DFTACTGRP = *NO
"
        );
    }

    #[test]
    fn test_custom_rule() {
        let dir = TempDir::new().unwrap();
        let descriptor = parse(
            &dir,
            "CRTSBSD.FILE:\n\tsystem -i \"CRTSBSD SBSD(BATCHWL/BATCHSBSD) POOLS((1 *SHRPOOL3 *N *MB))\"\n",
        );
        assert_eq!(
            render_descriptor(&descriptor),
            "FILEs := CRTSBSD.FILE


CRTSBSD.FILE_CUSTOM_RECIPE=true
CRTSBSD.FILE : \n\
\t@$(call echo_cmd,=== Creating [CRTSBSD.FILE] from custom recipe)
\tsystem -i \"CRTSBSD SBSD(BATCHWL/BATCHSBSD) POOLS((1 *SHRPOOL3 *N *MB))\"
\t@$(call echo_success_cmd,End of creating CRTSBSD.FILE)
"
        );
    }

    #[test]
    fn test_located_source_and_group_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bar.rpgle"), "").unwrap();
        let descriptor = parse(
            &dir,
            "BAR.PGM: BAR.MODULE\nbar.MODULE: bar.rpgle bar.TABLE\nLASTORDNO.DTAARA: LASTORDNO.DTAARA\n",
        );
        let rendered = render_descriptor(&descriptor);
        assert!(rendered.starts_with(
            "DTAARAs := LASTORDNO.DTAARA\nMODULEs := BAR.MODULE\nPGMs := BAR.PGM\n\n\n"
        ));
        assert!(rendered.contains("BAR.MODULE_SRC=$(d)/bar.rpgle\nBAR.MODULE_DEP=bar.TABLE\n"));
        assert!(rendered.contains("BAR.PGM_SRC=BAR.MODULE\nBAR.PGM_DEP=\nBAR.PGM_RECIPE=MODULE_TO_PGM_RECIPE\n"));
        assert!(rendered.contains("LASTORDNO.DTAARA_RECIPE=DTAARA_TO_DTAARA_RECIPE\n"));
    }
}
