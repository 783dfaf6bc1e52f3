use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub seed_demo: bool,
    /// `None` means permissive CORS.
    pub allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("CLUBHOUSE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("CLUBHOUSE_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("CLUBHOUSE_PORT must be a port number")?;
        let db_path: PathBuf = get("CLUBHOUSE_DB_PATH")
            .unwrap_or_else(|| "clubhouse.db".into())
            .into();
        let seed_demo = match get("CLUBHOUSE_SEED_DEMO").as_deref() {
            None => true,
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(other) => anyhow::bail!("CLUBHOUSE_SEED_DEMO must be true or false, got '{}'", other),
        };
        let allowed_origins = get("CLUBHOUSE_ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        });

        Ok(Self {
            host,
            port,
            db_path,
            seed_demo,
            allowed_origins,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
