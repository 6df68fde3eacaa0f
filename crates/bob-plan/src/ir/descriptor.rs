//! A parsed descriptor: the rules of one directory plus the indices the make
//! engine aggregates over.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::Rule;
use crate::naming::TargetGroup;

/// One directory's build description. Immutable once built.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub containing_dir: PathBuf,
    /// Subdirectory names, in declaration order, using on-disk casing.
    pub subdirs: Vec<String>,
    pub rules: Vec<Rule>,
    /// Targets per group, in rule order. Iterates in emission order.
    pub targets: BTreeMap<TargetGroup, Vec<String>>,
    /// Upper-cased source file name to every target it feeds.
    pub src_obj_mapping: HashMap<String, Vec<String>>,
}

impl Descriptor {
    pub fn new(containing_dir: impl Into<PathBuf>, subdirs: Vec<String>, rules: Vec<Rule>) -> Self {
        let mut targets: BTreeMap<TargetGroup, Vec<String>> = BTreeMap::new();
        let mut src_obj_mapping: HashMap<String, Vec<String>> = HashMap::new();

        for rule in &rules {
            targets
                .entry(rule.group)
                .or_default()
                .push(rule.target.clone());
            if let Some(source) = &rule.source {
                let consumers = src_obj_mapping.entry(source.to_ascii_uppercase()).or_default();
                if !consumers.contains(&rule.target) {
                    consumers.push(rule.target.clone());
                }
            }
        }

        Self {
            containing_dir: containing_dir.into(),
            subdirs,
            rules,
            targets,
            src_obj_mapping,
        }
    }

    /// Targets declared in `group`, empty when none.
    pub fn targets_in(&self, group: TargetGroup) -> &[String] {
        self.targets.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule(&self, target: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.target.eq_ignore_ascii_case(target))
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.rule(target).is_some()
    }

    /// Every target built from `source` (case-insensitive file name).
    pub fn targets_for_source(&self, source: &str) -> &[String] {
        self.src_obj_mapping
            .get(&source.to_ascii_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DirContext;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_indices_follow_rule_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vat300.rpgle"), "").unwrap();
        let ctx = DirContext::new(dir.path(), Vec::new());

        let rules = vec![
            Rule::new("VAT300.MODULE", vec!["vat300.rpgle".into()], vec![], vec![], &ctx).unwrap(),
            Rule::new("VAT300.PGM", vec!["vat300.rpgle".into()], vec![], vec![], &ctx).unwrap(),
            Rule::new("VAT.SRVPGM", vec!["vat.bnd".into(), "VAT300.MODULE".into()], vec![], vec![], &ctx)
                .unwrap(),
        ];
        let descriptor = Descriptor::new(dir.path(), vec![], rules);

        assert_eq!(descriptor.targets_in(TargetGroup::Module), &["VAT300.MODULE".to_string()]);
        assert_eq!(descriptor.targets_in(TargetGroup::Pgm), &["VAT300.PGM".to_string()]);
        assert_eq!(descriptor.targets_in(TargetGroup::Srvpgm), &["VAT.SRVPGM".to_string()]);
        assert!(descriptor.targets_in(TargetGroup::File).is_empty());

        assert_eq!(
            descriptor.targets_for_source("VAT300.RPGLE"),
            &["VAT300.MODULE".to_string(), "VAT300.PGM".to_string()]
        );
        assert!(descriptor.has_target("vat.srvpgm"));

        let groups: Vec<_> = descriptor.targets.keys().copied().collect();
        assert_eq!(groups, vec![TargetGroup::Module, TargetGroup::Srvpgm, TargetGroup::Pgm]);
    }
}
