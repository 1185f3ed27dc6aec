//! Runtime configuration, read from the environment (and `.env`) on startup.

use reqwest::Url;
use std::{env, time::Duration};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{var}` must be set for the {backend} backend")]
    Missing { var: &'static str, backend: &'static str },
    #[error("`{var}` has invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Hosted REST endpoint (Supabase / PostgREST).
    Rest { url: Url, api_key: String },
    Postgres { database_url: String },
    /// No data service; reads are served from the fallback dataset.
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    Builtin,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub port: u16,
    pub admin_token: Option<String>,
    pub fallback: FallbackSource,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("CATALOG_BACKEND").as_deref().unwrap_or("rest") {
            "rest" => {
                let raw = get("SUPABASE_URL").ok_or(ConfigError::Missing { var: "SUPABASE_URL", backend: "rest" })?;
                let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    var: "SUPABASE_URL",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                let api_key = get("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing { var: "SUPABASE_ANON_KEY", backend: "rest" })?;
                Backend::Rest { url, api_key }
            }
            "postgres" => {
                let database_url =
                    get("DATABASE_URL").ok_or(ConfigError::Missing { var: "DATABASE_URL", backend: "postgres" })?;
                Backend::Postgres { database_url }
            }
            "offline" => Backend::Offline,
            other => {
                return Err(ConfigError::Invalid {
                    var: "CATALOG_BACKEND",
                    value: other.to_string(),
                    reason: "expected `rest`, `postgres` or `offline`".into(),
                })
            }
        };

        let fallback = match get("CATALOG_FALLBACK").as_deref().unwrap_or("builtin") {
            "builtin" => FallbackSource::Builtin,
            "none" => FallbackSource::None,
            other => {
                return Err(ConfigError::Invalid {
                    var: "CATALOG_FALLBACK",
                    value: other.to_string(),
                    reason: "expected `builtin` or `none`".into(),
                })
            }
        };

        let port = parse_or("PORT", get("PORT"), 8081)?;
        let timeout = Duration::from_secs(parse_or("CATALOG_TIMEOUT_SECS", get("CATALOG_TIMEOUT_SECS"), 10)?);

        Ok(Config {
            backend,
            port,
            admin_token: get("ADMIN_TOKEN"),
            fallback,
            timeout,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn rest_is_the_default_backend() {
        let cfg = config(&[("SUPABASE_URL", "https://demo.supabase.co"), ("SUPABASE_ANON_KEY", "anon")]).unwrap();
        assert!(matches!(cfg.backend, Backend::Rest { ref api_key, .. } if api_key == "anon"));
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.fallback, FallbackSource::Builtin);
        assert_eq!(cfg.admin_token, None);
    }

    #[test]
    fn rest_requires_credentials() {
        assert_eq!(
            config(&[("SUPABASE_URL", "https://demo.supabase.co")]).unwrap_err(),
            ConfigError::Missing { var: "SUPABASE_ANON_KEY", backend: "rest" }
        );
        assert!(matches!(
            config(&[("SUPABASE_URL", "not a url"), ("SUPABASE_ANON_KEY", "k")]),
            Err(ConfigError::Invalid { var: "SUPABASE_URL", .. })
        ));
    }

    #[test]
    fn offline_and_overrides() {
        let cfg = config(&[
            ("CATALOG_BACKEND", "offline"),
            ("PORT", "9000"),
            ("ADMIN_TOKEN", " secret "),
            ("CATALOG_FALLBACK", "none"),
            ("CATALOG_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.backend, Backend::Offline);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.admin_token.as_deref(), Some("secret"));
        assert_eq!(cfg.fallback, FallbackSource::None);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("CATALOG_BACKEND", "mysql")]),
            Err(ConfigError::Invalid { var: "CATALOG_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("CATALOG_BACKEND", "offline"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert_eq!(
            config(&[("CATALOG_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::Missing { var: "DATABASE_URL", backend: "postgres" }
        );
    }
}
