// File: atelier-core/src/config.rs
//
// Runtime configuration: `.env` first, then the process environment.
// Command-line flags in the binary override whatever is loaded here.

use std::fmt;
use std::str::FromStr;
use tracing::debug;
use crate::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Which store the coupon engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Direct Postgres connection (`DATABASE_URL`).
    Postgres,
    /// The hosted backend's REST data API (`SUPABASE_URL` + `SUPABASE_ANON_KEY`).
    Rest,
    /// Process-local maps; nothing survives a restart.
    Memory,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(BackendKind::Postgres),
            "rest" | "supabase" => Ok(BackendKind::Rest),
            "memory" | "mem" => Ok(BackendKind::Memory),
            other => Err(Error::Config(format!(
                "unknown backend '{other}' (expected postgres, rest or memory)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Postgres => "postgres",
            BackendKind::Rest => "rest",
            BackendKind::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub rest_url: Option<String>,
    pub rest_key: Option<String>,
    pub bind_addr: String,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_with(|_| None)
    }

    /// Like `from_env`, but values returned by `overrides` win over the environment.
    pub fn from_env_with<F>(overrides: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Ok(path) = dotenv::dotenv() {
            debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    /// Builds a config from any key lookup. Without `ATELIER_BACKEND` the
    /// backend is inferred: a database url wins, then a REST url, else memory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL");
        let rest_url = get("SUPABASE_URL");
        let rest_key = get("SUPABASE_ANON_KEY");

        let backend = match get("ATELIER_BACKEND") {
            Some(raw) => raw.parse()?,
            None if database_url.is_some() => BackendKind::Postgres,
            None if rest_url.is_some() => BackendKind::Rest,
            None => BackendKind::Memory,
        };

        let config = Self {
            backend,
            database_url,
            rest_url,
            rest_key,
            bind_addr: get("ATELIER_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the selected backend has what it needs.
    pub fn validate(&self) -> Result<(), Error> {
        match self.backend {
            BackendKind::Postgres if self.database_url.is_none() => Err(Error::Config(
                "postgres backend needs DATABASE_URL (or --database-url)".into(),
            )),
            BackendKind::Rest if self.rest_url.is_none() || self.rest_key.is_none() => {
                Err(Error::Config(
                    "rest backend needs SUPABASE_URL and SUPABASE_ANON_KEY".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}
