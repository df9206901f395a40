use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Load and parse a YAML file, flattening it into the values map.
///
/// A missing file is not an error: profile files are optional.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if path.exists() {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        load_yaml_str(&content, values)?;
    }
    Ok(())
}

/// Parse a YAML string and flatten it into the values map.
pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key_str = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let full_key = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            if !prefix.is_empty() {
                out.insert(
                    prefix.to_string(),
                    ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect()),
                );
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

/// Translate an environment variable name into a config key.
///
/// Only variables starting with `prefix` are considered. The remainder is
/// lowercased and `__` becomes the path separator, so single underscores
/// survive inside key segments:
/// `GATE_COGNITO__USER_POOL_ID` -> `cognito.user_pool_id`.
pub(crate) fn env_key_to_config_key(prefix: &str, env_key: &str) -> Option<String> {
    let rest = env_key.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_lowercase().split("__").collect::<Vec<_>>().join("."))
}

#[cfg(test)]
mod tests {
    use super::env_key_to_config_key;

    #[test]
    fn env_key_keeps_single_underscores() {
        assert_eq!(
            env_key_to_config_key("GATE_", "GATE_COGNITO__USER_POOL_ID").as_deref(),
            Some("cognito.user_pool_id")
        );
    }

    #[test]
    fn env_key_without_prefix_is_ignored() {
        assert_eq!(env_key_to_config_key("GATE_", "HOME"), None);
        assert_eq!(env_key_to_config_key("GATE_", "GATE_"), None);
    }

    #[test]
    fn env_key_top_level() {
        assert_eq!(
            env_key_to_config_key("GATE_", "GATE_PROFILE").as_deref(),
            Some("profile")
        );
    }
}
