use std::time::Duration;

use shared::picker::{DEFAULT_DIRECTIONS_ROOT, MapConfig};

pub const DEFAULT_API_ROOT: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MAPBOX_ACCESS_TOKEN is not set; it is required for route lookups")]
    MissingToken,
    #[error("HTTP_TIMEOUT_SECS must be a positive integer, got `{0}`")]
    InvalidTimeout(String),
}

/// Runtime settings for the admin tooling.
///
/// Read from `CHALLENGE_API_ROOT`, `MAPBOX_ACCESS_TOKEN`, `MAPBOX_API_ROOT`
/// and `HTTP_TIMEOUT_SECS`; the CLI can override each one.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub api_root: String,
    pub map: MapConfig,
    pub timeout: Option<Duration>,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_root = lookup("CHALLENGE_API_ROOT")
            .unwrap_or_else(|| DEFAULT_API_ROOT.to_string())
            .trim_end_matches('/')
            .to_string();

        let map = MapConfig {
            access_token: lookup("MAPBOX_ACCESS_TOKEN").unwrap_or_default(),
            directions_root: lookup("MAPBOX_API_ROOT")
                .unwrap_or_else(|| DEFAULT_DIRECTIONS_ROOT.to_string()),
            ..MapConfig::default()
        };

        let timeout = match lookup("HTTP_TIMEOUT_SECS") {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Self {
            api_root,
            map,
            timeout,
        })
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        let token = self.map.access_token.trim();
        if token.is_empty() {
            Err(ConfigError::MissingToken)
        } else {
            Ok(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AdminConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_root, "http://localhost:8080");
        assert_eq!(config.map.directions_root, "https://api.mapbox.com");
        assert_eq!(config.timeout, None);
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn reads_overrides() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("CHALLENGE_API_ROOT", "https://api.example.com/"),
            ("MAPBOX_ACCESS_TOKEN", "pk.abc"),
            ("HTTP_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.api_root, "https://api.example.com");
        assert_eq!(config.require_token().unwrap(), "pk.abc");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn rejects_bad_timeout() {
        for raw in ["0", "soon", "-3"] {
            assert!(matches!(
                AdminConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", raw)])),
                Err(ConfigError::InvalidTimeout(_))
            ));
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_positive_timeout_is_accepted(secs in 1u64..=86_400) {
                let raw = format!(" {secs} ");
                let config = AdminConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", raw.as_str())])).unwrap();
                prop_assert_eq!(config.timeout, Some(Duration::from_secs(secs)));
            }

            #[test]
            fn api_root_never_ends_with_slash(host in "[a-z]{1,12}", slashes in 0usize..4) {
                let raw = format!("https://{host}.test{}", "/".repeat(slashes));
                let config = AdminConfig::from_lookup(lookup(&[("CHALLENGE_API_ROOT", raw.as_str())])).unwrap();
                prop_assert_eq!(config.api_root, format!("https://{host}.test"));
            }
        }
    }
}
