//! `&NAME` placeholder expansion.

use std::collections::HashMap;

use crate::diagnostic::PlanError;

/// Source of environment variables for placeholder expansion.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment, optionally shadowed by explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnv {
    overrides: HashMap<String, String>,
}

impl ProcessEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides take precedence over the process environment, which is left
    /// untouched.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }
}

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Replaces every `&NAME` segment of `value` with the variable's value.
///
/// Segments are delimited by `/` and spaces, so `&ROOT/include` and
/// `LIB1 &LIB2` both expand. A lone `&` is kept.
pub fn expand(value: &str, env: &dyn Environment) -> Result<String, PlanError> {
    let segments = value
        .split('/')
        .map(|segment| {
            segment
                .split(' ')
                .map(|part| expand_part(part, env))
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.join(" "))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join("/"))
}

/// Expands every element of a list.
pub fn expand_all(values: &[String], env: &dyn Environment) -> Result<Vec<String>, PlanError> {
    values.iter().map(|value| expand(value, env)).collect()
}

fn expand_part(part: &str, env: &dyn Environment) -> Result<String, PlanError> {
    match part.strip_prefix('&') {
        Some(name) if !name.is_empty() => env.var(name).ok_or_else(|| PlanError::UndefinedEnvVar {
            name: name.to_string(),
        }),
        _ => Ok(part.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> MapEnv {
        MapEnv::new([
            ("key1", "value1"),
            ("key2", "value2"),
            ("key3", "value3"),
            ("dependency_dir", "dep_dir_value"),
        ])
    }

    #[test]
    fn test_expand_segments() {
        let env = env();
        for (input, expected) in [
            ("key1", "key1"),
            ("&key1", "value1"),
            ("&key1/key2", "value1/key2"),
            ("key1/&key2", "key1/value2"),
            ("/&key1/", "/value1/"),
            ("/&key1///&key2/&key3", "/value1///value2/value3"),
            ("&dependency_dir/includes", "dep_dir_value/includes"),
            ("LIB1 &key2", "LIB1 value2"),
            ("&", "&"),
        ] {
            assert_eq!(expand(input, &env).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        let err = expand("&MISSING", &env()).unwrap_err();
        assert!(matches!(err, PlanError::UndefinedEnvVar { ref name } if name == "MISSING"));
    }

    #[test]
    fn test_overrides_shadow_process_env() {
        let mut overrides = HashMap::new();
        overrides.insert("PATH".to_string(), "shadowed".to_string());
        let env = ProcessEnv::with_overrides(overrides);
        assert_eq!(env.var("PATH").as_deref(), Some("shadowed"));
    }
}
