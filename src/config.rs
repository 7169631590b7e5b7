use crate::params::{Language, Units};

use serde::Deserialize;
use thiserror::Error;

use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.forecast.io/forecast";

/// Settings for a [`ForecastClient`](crate::ForecastClient), usually read from a JSON file:
///
/// ```json
/// {
///     "api_key": "0123456789abcdef",
///     "units": "si",
///     "language": "de",
///     "timeout_secs": 10
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the forecast endpoint; the API key and coordinates are appended as path segments
    pub base_url: String,
    pub api_key: Option<String>,
    pub units: Units,
    pub language: Option<Language>,
    /// Upper bound for a whole request. No limit when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            units: Units::default(),
            language: None,
            timeout_secs: None,
        }
    }
}

// Hand-written so the API key never ends up in logs
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("units", &self.units)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let conf_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&conf_str).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::process;

    #[test]
    fn defaults_when_fields_missing() {
        let conf: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(conf, ClientConfig::default());
        assert_eq!(conf.base_url, DEFAULT_BASE_URL);
        assert_eq!(conf.units, Units::Us);
        assert_eq!(conf.timeout(), None);
    }

    #[test]
    fn full_config_parses() {
        let conf: ClientConfig = serde_json::from_str(
            r#"{
                "base_url": "http://localhost:8080/forecast",
                "api_key": "SECRET",
                "units": "si",
                "language": "zh-tw",
                "timeout_secs": 5
            }"#,
        )
        .unwrap();

        assert_eq!(conf.base_url, "http://localhost:8080/forecast");
        assert_eq!(conf.api_key.as_deref(), Some("SECRET"));
        assert_eq!(conf.units, Units::Si);
        assert_eq!(conf.language, Some(Language::ZhTw));
        assert_eq!(conf.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn unknown_units_rejected() {
        let res = serde_json::from_str::<ClientConfig>(r#"{"units": "metric"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn debug_hides_api_key() {
        let conf = ClientConfig {
            api_key: Some("SECRET".to_string()),
            ..Default::default()
        };
        let printed = format!("{conf:?}");
        assert!(!printed.contains("SECRET"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn from_file_reads_json() {
        let path = env::temp_dir().join(format!("forecast-client-config-{}.json", process::id()));
        fs::write(&path, r#"{"api_key": "KEY", "units": "ca"}"#).unwrap();

        let conf = ClientConfig::from_file(&path);
        fs::remove_file(&path).unwrap();

        let conf = conf.unwrap();
        assert_eq!(conf.api_key.as_deref(), Some("KEY"));
        assert_eq!(conf.units, Units::Ca);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = ClientConfig::from_file("/nonexistent/forecast-client.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/forecast-client.json"));
    }
}
