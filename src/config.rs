//! Environment-driven runtime configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fallback signing key so the demo runs without any environment set up.
/// `main` warns loudly when this is in use.
pub const DEV_SESSION_SECRET: &str = "intake-dev-secret";

fn default_port() -> u16 {
    3000
}

/// Which [`EntryStore`](crate::store::EntryStore) backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Supabase,
}

impl Default for StoreKind {
    fn default() -> Self {
        Self::Memory
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "supabase" => Ok(Self::Supabase),
            other => Err(Error::Config(format!(
                "unknown store kind '{other}' (expected 'memory' or 'supabase')"
            ))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Supabase => write!(f, "supabase"),
        }
    }
}

/// Credentials for the durable backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub store: StoreKind,
    pub supabase: Option<SupabaseConfig>,
    pub session_secret: String,
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// Selecting the supabase store without both `SUPABASE_URL` and
    /// `SUPABASE_SERVICE_ROLE_KEY` is a fatal configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable variable
    /// source, so tests stay off the process environment.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got '{raw}'")))?,
            None => default_port(),
        };

        let store = match var("INTAKE_STORE") {
            Some(raw) => raw.parse()?,
            None => StoreKind::default(),
        };

        let supabase = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url,
                service_role_key,
            }),
            _ => None,
        };

        if store == StoreKind::Supabase && supabase.is_none() {
            return Err(Error::Config(
                "Missing SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY in environment".to_string(),
            ));
        }

        let session_secret =
            var("SESSION_SECRET").unwrap_or_else(|| DEV_SESSION_SECRET.to_string());

        Ok(Self {
            port,
            store,
            supabase,
            session_secret,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_with_empty_environment() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Memory);
        assert!(config.supabase.is_none());
        assert!(config.uses_default_secret());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_vars(vars(&[
            ("PORT", "8080"),
            ("SESSION_SECRET", "hunter2"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.uses_default_secret());
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = Config::from_vars(vars(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn supabase_store_requires_credentials() {
        let err = Config::from_vars(vars(&[("INTAKE_STORE", "supabase")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = Config::from_vars(vars(&[
            ("INTAKE_STORE", "supabase"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-role"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Supabase);
        assert!(config.supabase.is_some());
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let err = Config::from_vars(vars(&[("INTAKE_STORE", "redis")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!("memory".parse::<StoreKind>().is_ok());
        assert!("Supabase".parse::<StoreKind>().is_ok());
    }
}
