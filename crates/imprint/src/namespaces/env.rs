//! The `env` namespace: `{{ env.HOME }}`.
//!
//! With `safe` on (the default) only variables whose names are valid
//! identifiers (`^[a-zA-Z][a-zA-Z0-9_]*$`) are exposed. Values are never
//! logged, only names.

use imprint_values::{EnvReader, RealEnv, ValueTree};
use serde_json::Value;
use tracing::debug;

use super::{Namespace, NamespaceConfig, NamespaceError};

/// `^[a-zA-Z][a-zA-Z0-9_]*$`
pub fn is_safe_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Factory for the process environment.
pub fn namespace(config: &NamespaceConfig<'_>) -> Result<Namespace, NamespaceError> {
    from_reader(&RealEnv, config)
}

/// Builds the namespace from any environment source.
pub fn from_reader(
    reader: &dyn EnvReader,
    config: &NamespaceConfig<'_>,
) -> Result<Namespace, NamespaceError> {
    let safe = config.flag("safe", true)?;

    let mut exposed = ValueTree::new();
    let mut ignored = Vec::new();
    for (name, value) in reader.vars() {
        if safe && !is_safe_name(&name) {
            ignored.push(name);
            continue;
        }
        exposed.insert(name, Value::String(value));
    }

    if !ignored.is_empty() {
        ignored.sort();
        debug!(?ignored, "Environment variables unsafe to load");
    }
    debug!(
        names = ?exposed.keys().collect::<Vec<_>>(),
        "env namespace"
    );
    Ok(Namespace::Static(Value::Object(exposed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprint_values::MockEnv;
    use serde_json::json;

    fn bind(reader: &MockEnv, options: Value) -> Value {
        let options = options.as_object().cloned().unwrap_or_default();
        let config = NamespaceConfig {
            name: "env",
            options: &options,
            command_timeout: None,
        };
        match from_reader(reader, &config).unwrap() {
            Namespace::Static(value) => value,
            other => panic!("expected a static namespace, got {other:?}"),
        }
    }

    #[test]
    fn test_safe_filters_invalid_names() {
        let env = MockEnv::new().with_var("FOO", "bar").with_var("1BAD", "x");
        let value = bind(&env, json!({ "safe": true }));
        assert_eq!(value["FOO"], json!("bar"));
        assert!(value.get("1BAD").is_none());
    }

    #[test]
    fn test_safe_is_the_default() {
        let env = MockEnv::new().with_var("OK_1", "y").with_var("has-dash", "z");
        let value = bind(&env, json!({}));
        assert_eq!(value, json!({ "OK_1": "y" }));
    }

    #[test]
    fn test_unsafe_exposes_everything() {
        let env = MockEnv::new().with_var("FOO", "bar").with_var("1BAD", "x");
        let value = bind(&env, json!({ "safe": false }));
        assert_eq!(value["1BAD"], json!("x"));
        assert_eq!(value["FOO"], json!("bar"));
    }

    #[test]
    fn test_name_rules() {
        assert!(is_safe_name("PATH"));
        assert!(is_safe_name("a_1"));
        assert!(!is_safe_name("_HIDDEN"));
        assert!(!is_safe_name("9LIVES"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name("A.B"));
    }
}
