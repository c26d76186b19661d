//! Gateway configuration.
//!
//! Settings arrive in layers: a TOML file, then the `COURIER_BASE_API`
//! environment variable, then whatever the caller sets explicitly (e.g. CLI
//! flags). Each layer is a [`GatewaySettings`] whose present fields override the
//! previous layer; [`GatewaySettings::into_config`] validates the result into a
//! [`GatewayConfig`].
//!
//! ```toml
//! base_url = "https://api.example.com/v1"
//! timeout_ms = 5000
//! locale = "zh-CN"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConfigError, Locale};

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "COURIER_BASE_API";

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Construction-time inputs of a [`crate::RequestGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    base_url: Url,
    timeout: Duration,
    locale: Locale,
}

impl GatewayConfig {
    /// Creates a configuration with the default timeout and locale.
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::InvalidBaseUrl {
                    value: base_url.to_string(),
                    reason: format!("unsupported scheme '{other}'"),
                })
            }
        }
        if base_url.cannot_be_a_base() || base_url.host().is_none() {
            return Err(ConfigError::InvalidBaseUrl {
                value: base_url.to_string(),
                reason: "URL has no host".into(),
            });
        }
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(ConfigError::InvalidBaseUrl {
                value: base_url.to_string(),
                reason: "base URL must not carry a query or fragment".into(),
            });
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            locale: Locale::default(),
        })
    }

    /// Parses `base_url` and creates a configuration from it.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(url)
    }

    /// Replaces the default per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Replaces the message locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Base URL every relative request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Default per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Locale of user-facing messages.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Resolves a request path and query against the base URL.
    ///
    /// Absolute `http(s)` URLs are used as-is. Anything else is appended
    /// beneath the base URL's path, with or without a leading slash. Relative
    /// paths may not contain `.` or `..` segments, which would otherwise be
    /// normalised out of the base path.
    pub fn resolve(&self, path: &str, query: &[(String, String)]) -> Result<Url, String> {
        if path.trim().is_empty() {
            return Err("request path is empty".into());
        }

        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path).map_err(|e| e.to_string())?
        } else {
            let base = self.base_url.as_str().trim_end_matches('/');
            let relative = path.trim_start_matches('/');
            let segments = relative.split(['?', '#']).next().unwrap_or_default();
            if segments.split(['/', '\\']).any(is_dot_segment) {
                return Err(format!("relative path '{path}' contains a dot segment"));
            }
            Url::parse(&format!("{base}/{relative}")).map_err(|e| e.to_string())?
        };

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let segment = segment.to_ascii_lowercase().replace("%2e", ".");
    segment == "." || segment == ".."
}

// ---------------------------------------------------------------------------
// Layered settings
// ---------------------------------------------------------------------------

/// One layer of partially specified settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySettings {
    /// Base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default per-request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Message locale.
    #[serde(default)]
    pub locale: Option<Locale>,
}

impl GatewaySettings {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// The layer contributed by the process environment.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(BASE_URL_ENV).ok())
    }

    fn from_env_value(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.filter(|v| !v.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Returns `self` with every field present in `other` replaced.
    pub fn merge(self, other: GatewaySettings) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
            locale: other.locale.or(self.locale),
        }
    }

    /// Validates the merged layers.
    pub fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let base_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;
        let mut config = GatewayConfig::parse(&base_url)?;
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms))?;
        }
        if let Some(locale) = self.locale {
            config = config.with_locale(locale);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config(base: &str) -> GatewayConfig {
        GatewayConfig::parse(base).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config("http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.locale(), Locale::ZhCn);
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            GatewayConfig::parse("ftp://files.example.com"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            GatewayConfig::parse("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(matches!(
            config("http://localhost").with_timeout(Duration::ZERO),
            Err(ConfigError::ZeroTimeout)
        ));
    }

    #[test]
    fn test_resolve_joins_beneath_base_path() {
        let config = config("http://localhost:8080/api");
        for path in ["/users/42", "users/42"] {
            assert_eq!(
                config.resolve(path, &[]).unwrap().as_str(),
                "http://localhost:8080/api/users/42"
            );
        }

        let trailing = self::config("http://localhost:8080/api/");
        assert_eq!(
            trailing.resolve("/users/42", &[]).unwrap().as_str(),
            "http://localhost:8080/api/users/42"
        );
    }

    #[test]
    fn test_resolve_absolute_url_passes_through() {
        let config = config("http://localhost:8080/api");
        let url = config.resolve("https://other.example.com/x", &[]).unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/x");
    }

    #[test]
    fn test_resolve_appends_query() {
        let config = config("http://localhost");
        let query = vec![("page".to_string(), "2".to_string()), ("q".to_string(), "a b".to_string())];
        let url = config.resolve("/search", &query).unwrap();
        assert_eq!(url.as_str(), "http://localhost/search?page=2&q=a+b");
    }

    #[test]
    fn test_resolve_rejects_unresolvable_paths() {
        let config = config("http://localhost");
        assert!(config.resolve("", &[]).is_err());
        assert!(config.resolve("http://", &[]).is_err());
    }

    #[test]
    fn test_rejects_base_with_query_or_fragment() {
        for base in ["http://h.test/api?key=1", "http://h.test/api#top"] {
            assert!(matches!(
                GatewayConfig::parse(base),
                Err(ConfigError::InvalidBaseUrl { .. })
            ));
        }
    }

    #[test]
    fn test_resolve_rejects_dot_segments() {
        let config = config("http://h.test/api");
        for path in ["/../admin", "users/./42", "a/..", "/%2E%2e/admin", "..\\admin"] {
            assert!(config.resolve(path, &[]).is_err(), "{path} should be rejected");
        }
        assert_eq!(
            config.resolve("/files/v1.2..3", &[]).unwrap().path(),
            "/api/files/v1.2..3"
        );
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = GatewaySettings::from_toml_str(
            "base_url = \"https://api.example.com\"\ntimeout_ms = 1500\nlocale = \"en\"\n",
        )
        .unwrap();
        let config = settings.into_config().unwrap();
        assert_eq!(config.base_url().as_str(), "https://api.example.com/");
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.locale(), Locale::En);
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        assert!(matches!(
            GatewaySettings::from_toml_str("base = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_later_layers_win() {
        let file = GatewaySettings {
            base_url: Some("http://file.example.com".into()),
            timeout_ms: Some(1000),
            locale: None,
        };
        let env = GatewaySettings::from_env_value(Some("http://env.example.com".into()));
        let merged = file.merge(env).into_config().unwrap();
        assert_eq!(merged.base_url().host_str(), Some("env.example.com"));
        assert_eq!(merged.timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_blank_env_value_is_ignored() {
        assert_eq!(GatewaySettings::from_env_value(Some("  ".into())).base_url, None);
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            GatewaySettings::default().into_config(),
            Err(ConfigError::MissingBaseUrl)
        ));
    }

    #[test]
    fn test_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"http://localhost:9000\"").unwrap();
        let settings = GatewaySettings::from_file(file.path()).unwrap();
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9000"));

        let missing = GatewaySettings::from_file(Path::new("/nonexistent/courier.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
