use super::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_COCKPIT_TIMEOUT_SECS: u64 = 30;

/// Endpoints of the inventory search and cockpit backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub search_base_url: String,
    pub cockpit_base_url: String,
    pub search_timeout_secs: u64,
    pub cockpit_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            search_base_url: String::new(),
            cockpit_base_url: String::new(),
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            cockpit_timeout_secs: DEFAULT_COCKPIT_TIMEOUT_SECS,
            accept_invalid_certs: false,
            debug_dump_dir: None,
        }
    }
}

impl BackendConfig {
    /// Checks the fields needed to actually host the tools.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_base_url.trim().is_empty() {
            return Err(ConfigError::MissingBackendUrl {
                field: "search_base_url",
            });
        }
        if self.cockpit_base_url.trim().is_empty() {
            return Err(ConfigError::MissingBackendUrl {
                field: "cockpit_base_url",
            });
        }
        if self.search_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                field: "backend.search_timeout_secs",
            });
        }
        if self.cockpit_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                field: "backend.cockpit_timeout_secs",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawBackend {
    search_base_url: Option<String>,
    cockpit_base_url: Option<String>,
    search_timeout_secs: Option<u64>,
    cockpit_timeout_secs: Option<u64>,
    #[serde(default)]
    accept_invalid_certs: bool,
    debug_dump_dir: Option<String>,
}

/// Unresolvable variables leave the URL empty so validation reports it.
fn expand_url(raw: &str) -> String {
    shellexpand::full(raw)
        .map(|cow| cow.trim().to_string())
        .unwrap_or_default()
}

impl From<RawBackend> for BackendConfig {
    fn from(raw: RawBackend) -> Self {
        let defaults = BackendConfig::default();
        Self {
            search_base_url: raw
                .search_base_url
                .map(|url| expand_url(&url))
                .unwrap_or(defaults.search_base_url),
            cockpit_base_url: raw
                .cockpit_base_url
                .map(|url| expand_url(&url))
                .unwrap_or(defaults.cockpit_base_url),
            search_timeout_secs: raw
                .search_timeout_secs
                .unwrap_or(defaults.search_timeout_secs),
            cockpit_timeout_secs: raw
                .cockpit_timeout_secs
                .unwrap_or(defaults.cockpit_timeout_secs),
            accept_invalid_certs: raw.accept_invalid_certs,
            debug_dump_dir: raw
                .debug_dump_dir
                .filter(|dir| !dir.trim().is_empty())
                .map(|dir| {
                    PathBuf::from(
                        shellexpand::full(&dir)
                            .map(|cow| cow.into_owned())
                            .unwrap_or(dir),
                    )
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_url_variable_fails_validation() {
        let raw: RawBackend = toml::from_str(
            r#"
            search_base_url = "${LANDSCAPE_TEST_UNSET_SEARCH_URL}"
            cockpit_base_url = "https://cockpit.example.com/api"
            "#,
        )
        .unwrap();
        let config = BackendConfig::from(raw);
        assert_eq!(config.search_base_url, "");
        assert_eq!(config.search_timeout_secs, DEFAULT_SEARCH_TIMEOUT_SECS);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBackendUrl {
                field: "search_base_url"
            })
        ));
    }
}
