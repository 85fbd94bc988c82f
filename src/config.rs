use crate::engine::engine::{EngineConfig, DEFAULT_MAX_FILE_MB};
use crate::error::ConfigError;
use crate::header::SynonymTable;

use std::{env, fmt::Display, path::Path, path::PathBuf, str::FromStr};
use tracing::info;

pub struct Config {
    pub max_file_mb: u64,
    pub data_dir: PathBuf,
    pub synonyms: SynonymTable,
    pub rollback_on_failure: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; [`Config::load`] uses the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let synonyms = match lookup("DEBTDESK_SYNONYMS") {
            Some(path) => {
                info!("Loading header synonyms from {path}");
                SynonymTable::from_json_file(Path::new(&path))?
            }
            None => SynonymTable::default(),
        };

        Ok(Self {
            max_file_mb: try_load(&lookup, "DEBTDESK_MAX_FILE_MB", &DEFAULT_MAX_FILE_MB.to_string())?,
            data_dir: try_load(&lookup, "DEBTDESK_DATA_DIR", "data")?,
            synonyms,
            rollback_on_failure: try_load(&lookup, "DEBTDESK_ROLLBACK", "true")?,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_file_mb: self.max_file_mb,
            synonyms: self.synonyms.clone(),
            rollback_on_failure: self.rollback_on_failure,
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Field;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.max_file_mb, 10);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.rollback_on_failure);
        assert_eq!(config.synonyms, SynonymTable::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DEBTDESK_MAX_FILE_MB", "25"),
            ("DEBTDESK_DATA_DIR", "/var/lib/debtdesk"),
            ("DEBTDESK_ROLLBACK", "false"),
        ]))
        .unwrap();

        assert_eq!(config.max_file_mb, 25);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/debtdesk"));
        assert!(!config.rollback_on_failure);

        let engine_config = config.engine_config();
        assert_eq!(engine_config.max_file_mb, 25);
        assert!(!engine_config.rollback_on_failure);
    }

    #[test]
    fn test_invalid_value() {
        let result = Config::from_lookup(lookup(&[("DEBTDESK_MAX_FILE_MB", "ten")]));

        match result {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "DEBTDESK_MAX_FILE_MB"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_synonyms_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"name": [{"equals": "cliente"}]}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::from_lookup(lookup(&[("DEBTDESK_SYNONYMS", path.as_str())])).unwrap();

        assert_eq!(config.synonyms.matchers(Field::Name).len(), 1);
        assert!(config.synonyms.matchers(Field::Document).is_empty());
    }

    #[test]
    fn test_missing_synonyms_file() {
        let result = Config::from_lookup(lookup(&[("DEBTDESK_SYNONYMS", "/nonexistent/synonyms.json")]));
        assert!(matches!(result, Err(ConfigError::Synonyms { .. })));
    }
}
