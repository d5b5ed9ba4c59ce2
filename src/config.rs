//! Runtime settings taken from the environment (and a `.env` file, if any).
//!
//! Command-line flags override whatever is set here.

pub const DEFAULT_DATASET_PATH: &str = "data/cleaned_data.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/delivery_delay_model.json";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/delivery_insights.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dataset: String,
    pub model: String,
    pub schema: Option<String>,
    pub log_file: String,
}

impl Settings {
    /// Loads `.env` and reads `DATASET_PATH`, `MODEL_PATH`, `SCHEMA_PATH` and
    /// `LOG_FILE_PATH`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            dataset: get("DATASET_PATH").unwrap_or_else(|| DEFAULT_DATASET_PATH.to_string()),
            model: get("MODEL_PATH").unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            schema: get("SCHEMA_PATH"),
            log_file: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.dataset, DEFAULT_DATASET_PATH);
        assert_eq!(settings.model, DEFAULT_MODEL_PATH);
        assert_eq!(settings.schema, None);
        assert_eq!(settings.log_file, DEFAULT_LOG_FILE_PATH);
    }

    #[test]
    fn test_values_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATASET_PATH", "https://example.com/shipments.csv.gz"),
            ("SCHEMA_PATH", "schema.json"),
            ("MODEL_PATH", ""),
        ]);
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.dataset, "https://example.com/shipments.csv.gz");
        assert_eq!(settings.schema.as_deref(), Some("schema.json"));
        assert_eq!(settings.model, DEFAULT_MODEL_PATH);
    }
}
