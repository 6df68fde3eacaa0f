//! Debug script to see what the parser produces for a `Rules.mk`.
//!
//! Usage: `debug_parse [path/to/Rules.mk]`

use std::path::PathBuf;

use bob_plan::codegen::render_descriptor;
use bob_plan::frontend::rules_mk::{parse_file, RULES_MK};

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(RULES_MK));

    match parse_file(&path, &[]) {
        Ok(parsed) => {
            println!("Parsed file: {:?}", path);
            println!("\nSubdirs: {:?}", parsed.descriptor.subdirs);
            println!("\nRules:");
            for rule in &parsed.descriptor.rules {
                println!("  {} ({})", rule.target, rule.group);
                println!("    source: {:?}", rule.source);
                println!("    dependencies: {:?}", rule.dependencies);
                println!("    variables: {:?}", rule.variables);
                if rule.is_custom() {
                    println!("    commands: {:?}", rule.user_commands());
                }
            }
            println!("\nWarnings:");
            for warning in &parsed.warnings {
                println!("  {}", warning);
            }
            println!("\nRendered:\n{}", render_descriptor(&parsed.descriptor));
        }
        Err(e) => {
            println!("Error: {:?}", e);
        }
    }
}
