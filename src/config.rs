use std::path::PathBuf;

use anyhow::Result;

use crate::data::loader::DataSources;
use crate::data::normalize::{DatasetVariant, NormalizerConfig};

/// Startup configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Tabular scorecard data to open at startup.
    pub data_path: Option<PathBuf>,
    /// TopoJSON state boundaries to load alongside the data.
    pub boundaries_path: Option<PathBuf>,
    /// Which loading path the normalizer follows.
    pub variant: DatasetVariant,
    /// Optional JSON file overriding the normalizer configuration.
    pub normalizer_path: Option<PathBuf>,
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `SCORECARD_DATA`: Tabular data file (csv, json, parquet)
    /// - `SCORECARD_BOUNDARIES`: TopoJSON state boundaries
    /// - `SCORECARD_VARIANT`: `cleaned` or `structured` (default: cleaned)
    /// - `SCORECARD_NORMALIZER`: JSON normalizer override file
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let variant = match lookup("SCORECARD_VARIANT") {
            Some(val) => val.parse().unwrap_or_else(|e| {
                log::warn!("{e}; using the {} variant", DatasetVariant::default());
                DatasetVariant::default()
            }),
            None => DatasetVariant::default(),
        };

        Self {
            data_path: lookup("SCORECARD_DATA").map(PathBuf::from),
            boundaries_path: lookup("SCORECARD_BOUNDARIES").map(PathBuf::from),
            variant,
            normalizer_path: lookup("SCORECARD_NORMALIZER").map(PathBuf::from),
        }
    }

    /// Positional arguments `[DATA [BOUNDARIES]]` override the environment.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(data) = args.next() {
            self.data_path = Some(PathBuf::from(data));
        }
        if let Some(boundaries) = args.next() {
            self.boundaries_path = Some(PathBuf::from(boundaries));
        }
        self
    }

    /// Normalizer configuration: the variant preset, with the override file (if
    /// any) applied on top of it.
    pub fn normalizer(&self) -> Result<NormalizerConfig> {
        match &self.normalizer_path {
            Some(path) => NormalizerConfig::from_json_file(path, self.variant.config()),
            None => Ok(self.variant.config()),
        }
    }

    /// Sources to load at startup, if a data file was configured.
    pub fn sources(&self) -> Option<DataSources> {
        self.data_path.as_ref().map(|table| DataSources {
            table: table.clone(),
            boundaries: self.boundaries_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.variant, DatasetVariant::Cleaned);
        assert!(config.sources().is_none());
        assert!(config.normalizer().unwrap().enforce_state_allow_list);
    }

    #[test]
    fn test_env_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SCORECARD_DATA", "data/scorecard.json"),
            ("SCORECARD_BOUNDARIES", "data/us.json"),
            ("SCORECARD_VARIANT", "structured"),
        ]));
        let sources = config.sources().unwrap();
        assert_eq!(sources.table, PathBuf::from("data/scorecard.json"));
        assert_eq!(sources.boundaries, Some(PathBuf::from("data/us.json")));
        assert!(!config.normalizer().unwrap().enforce_state_allow_list);
    }

    #[test]
    fn test_unknown_variant_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[("SCORECARD_VARIANT", "territories")]));
        assert_eq!(config.variant, DatasetVariant::Cleaned);
    }

    #[test]
    fn test_args_override_env() {
        let config = AppConfig::from_lookup(lookup(&[("SCORECARD_DATA", "env.csv")]))
            .with_args(vec!["cli.csv".to_string()]);
        let sources = config.sources().unwrap();
        assert_eq!(sources.table, PathBuf::from("cli.csv"));
        assert_eq!(sources.boundaries, None);
    }

    #[test]
    fn test_normalizer_override_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "aliases": {{ "undergrad_population": ["UGDS"] }} }}"#).unwrap();

        let config = AppConfig {
            normalizer_path: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        let normalizer = config.normalizer().unwrap();
        assert_eq!(normalizer.aliases.undergrad_population, vec!["UGDS".to_string()]);
        assert_eq!(normalizer.aliases.longitude, vec!["LONGITUDE".to_string()]);
        assert!(normalizer.enforce_state_allow_list);
    }

    #[test]
    fn test_override_file_follows_structured_variant() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "aliases": {{ "undergrad_population": ["UGDS"] }} }}"#).unwrap();

        let config = AppConfig {
            normalizer_path: Some(file.path().to_path_buf()),
            variant: DatasetVariant::Structured,
            ..AppConfig::default()
        };
        let normalizer = config.normalizer().unwrap();
        assert!(!normalizer.enforce_state_allow_list);
        assert_eq!(normalizer.aliases.undergrad_population, vec!["UGDS".to_string()]);
    }
}
