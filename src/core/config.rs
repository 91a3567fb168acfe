//! Session configuration.
//!
//! On the server, load with `SessionConfig::from_env()` after calling
//! `dotenvy::dotenv()`. The server shell renders the values as `<meta>` tags
//! and the browser reads them back with `SessionConfig::from_document()`.

use std::time::Duration;

/// Default base URL of the backend API
pub const DEFAULT_API_BASE_URL: &str = "/api";

/// Default bound on a token refresh or profile verification
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default route anonymous users are sent to
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

pub const ENV_API_BASE_URL: &str = "CLINIC_API_BASE_URL";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "CLINIC_REFRESH_TIMEOUT_MS";
pub const ENV_REVERIFY_INTERVAL_SECS: &str = "CLINIC_REVERIFY_INTERVAL_SECS";
pub const ENV_LOGIN_ROUTE: &str = "CLINIC_LOGIN_ROUTE";

/// `<meta>` names carrying the configuration to the browser, paired with the
/// environment variable each one mirrors.
pub const META_KEYS: [(&str, &str); 4] = [
    ("clinic:api-base-url", ENV_API_BASE_URL),
    ("clinic:refresh-timeout-ms", ENV_REFRESH_TIMEOUT_MS),
    ("clinic:reverify-interval-secs", ENV_REVERIFY_INTERVAL_SECS),
    ("clinic:login-route", ENV_LOGIN_ROUTE),
];

/// When a degraded session is verified again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverifyPolicy {
    /// Only on the next protected navigation or explicit action
    #[default]
    OnDemand,
    /// Additionally on a fixed interval
    Interval(Duration),
}

/// Session layer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Backend API base, e.g. `https://api.clinic.example/v1` or `/api`
    pub api_base_url: String,

    /// Bound on a token refresh (and on background profile verification)
    pub refresh_timeout: Duration,

    pub reverify: ReverifyPolicy,

    /// Where anonymous users are redirected from protected pages
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            reverify: ReverifyPolicy::OnDemand,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }
}

impl SessionConfig {
    /// Build a config from any key lookup keyed by the environment variable
    /// names. Missing or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let refresh_timeout = match get(ENV_REFRESH_TIMEOUT_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(key = ENV_REFRESH_TIMEOUT_MS, value = %raw, "invalid value, using default");
                    defaults.refresh_timeout
                }
            },
            None => defaults.refresh_timeout,
        };

        let reverify = match get(ENV_REVERIFY_INTERVAL_SECS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => ReverifyPolicy::OnDemand,
                Ok(secs) => ReverifyPolicy::Interval(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!(key = ENV_REVERIFY_INTERVAL_SECS, value = %raw, "invalid value, using default");
                    defaults.reverify
                }
            },
            None => defaults.reverify,
        };

        Self {
            api_base_url: get(ENV_API_BASE_URL).unwrap_or(defaults.api_base_url),
            refresh_timeout,
            reverify,
            login_route: get(ENV_LOGIN_ROUTE).unwrap_or(defaults.login_route),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    #[cfg(feature = "ssr")]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from the `<meta>` tags rendered by the server shell
    #[cfg(not(feature = "ssr"))]
    pub fn from_document() -> Self {
        let document = web_sys::window().and_then(|w| w.document());
        Self::from_lookup(|key| {
            let (meta_name, _) = META_KEYS.iter().find(|(_, env)| *env == key)?;
            let selector = format!("meta[name=\"{}\"]", meta_name);
            document
                .as_ref()?
                .query_selector(&selector)
                .ok()??
                .get_attribute("content")
        })
    }

    /// Values to render as `<meta name content>` pairs
    pub fn meta_tags(&self) -> Vec<(&'static str, String)> {
        let reverify_secs = match self.reverify {
            ReverifyPolicy::OnDemand => 0,
            ReverifyPolicy::Interval(d) => d.as_secs(),
        };
        vec![
            (META_KEYS[0].0, self.api_base_url.clone()),
            (META_KEYS[1].0, self.refresh_timeout.as_millis().to_string()),
            (META_KEYS[2].0, reverify_secs.to_string()),
            (META_KEYS[3].0, self.login_route.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        assert_eq!(SessionConfig::from_lookup(lookup(&[])), SessionConfig::default());
    }

    #[test]
    fn test_all_values_set() {
        let config = SessionConfig::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "https://api.clinic.test"),
            (ENV_REFRESH_TIMEOUT_MS, "2500"),
            (ENV_REVERIFY_INTERVAL_SECS, "300"),
            (ENV_LOGIN_ROUTE, "/signin"),
        ]));

        assert_eq!(config.api_base_url, "https://api.clinic.test");
        assert_eq!(config.refresh_timeout, Duration::from_millis(2500));
        assert_eq!(
            config.reverify,
            ReverifyPolicy::Interval(Duration::from_secs(300))
        );
        assert_eq!(config.login_route, "/signin");
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = SessionConfig::from_lookup(lookup(&[
            (ENV_REFRESH_TIMEOUT_MS, "soon"),
            (ENV_REVERIFY_INTERVAL_SECS, "-1"),
        ]));

        assert_eq!(config.refresh_timeout, DEFAULT_REFRESH_TIMEOUT);
        assert_eq!(config.reverify, ReverifyPolicy::OnDemand);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = SessionConfig::from_lookup(lookup(&[(ENV_REFRESH_TIMEOUT_MS, "0")]));
        assert_eq!(config.refresh_timeout, DEFAULT_REFRESH_TIMEOUT);
    }

    #[test]
    fn test_zero_interval_means_on_demand() {
        let config = SessionConfig::from_lookup(lookup(&[(ENV_REVERIFY_INTERVAL_SECS, "0")]));
        assert_eq!(config.reverify, ReverifyPolicy::OnDemand);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = SessionConfig::from_lookup(lookup(&[(ENV_API_BASE_URL, "   ")]));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_meta_tags_round_trip_through_lookup() {
        let original = SessionConfig {
            api_base_url: "https://api.clinic.test".to_string(),
            refresh_timeout: Duration::from_millis(1500),
            reverify: ReverifyPolicy::Interval(Duration::from_secs(60)),
            login_route: "/signin".to_string(),
        };

        let tags = original.meta_tags();
        let restored = SessionConfig::from_lookup(|key| {
            let (meta, _) = META_KEYS.iter().find(|(_, env)| *env == key)?;
            tags.iter()
                .find(|(name, _)| name == meta)
                .map(|(_, v)| v.clone())
        });

        assert_eq!(restored, original);
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_config_from_env_returns_config() {
        // Values depend on the environment; only check it loads
        let config = SessionConfig::from_env();
        assert!(!config.login_route.is_empty());
    }
}
