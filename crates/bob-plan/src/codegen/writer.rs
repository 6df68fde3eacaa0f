//! Writes a descriptor back in `Rules.mk` syntax.
//!
//! Wildcards and local variables are already expanded in a [`Descriptor`], so
//! the output lists every rule explicitly. Parsing the output again yields
//! the same rules.

use crate::ir::{Descriptor, Rule};

/// Writes one rule as a recipe header, its commands, and one line per
/// declared variable.
pub fn write_rule(rule: &Rule) -> String {
    let mut output = String::new();

    let mut header: Vec<&str> = Vec::new();
    header.extend(rule.source.as_deref());
    header.extend(rule.dependencies.iter().map(String::as_str));
    if header.is_empty() {
        output.push_str(&format!("{}:\n", rule.target));
    } else {
        output.push_str(&format!("{}: {}\n", rule.target, header.join(" ")));
    }

    for command in rule.user_commands() {
        output.push_str(&format!("\t{}\n", command));
    }

    for variable in rule.declared_variables() {
        output.push_str(&format!("{}: {}\n", rule.target, variable));
    }

    output
}

/// Writes a whole descriptor.
pub fn write_descriptor(descriptor: &Descriptor) -> String {
    let mut output = String::new();

    if !descriptor.subdirs.is_empty() {
        output.push_str(&format!("SUBDIRS := {}\n\n", descriptor.subdirs.join(" ")));
    }

    for rule in &descriptor.rules {
        output.push_str(&write_rule(rule));
        output.push('\n');
    }

    output
}
