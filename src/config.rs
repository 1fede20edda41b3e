use std::{env, path::PathBuf};

use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BODY_LIMIT_MB: usize = 16;
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const PLACEHOLDER_SECRET: &str = "your-secret-key-here";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BODY_LIMIT_MB must be a valid integer, got {0:?}")]
    BodyLimit(String),
    #[error("PORT must be a valid number between 0 and 65535, got {0:?}")]
    Port(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub body_limit_bytes: usize,
    pub upload_dir: PathBuf,
    pub secret_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let body_limit_bytes = match lookup("BODY_LIMIT_MB") {
            Some(raw) => {
                let mb = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::BodyLimit(raw.clone()))?;
                mb * 1024 * 1024
            }
            None => DEFAULT_BODY_LIMIT_MB * 1024 * 1024,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Port(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let upload_dir = lookup("UPLOAD_DIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into())
            .into();

        let secret_key = lookup("SECRET_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_SECRET.into());

        Ok(Config {
            port,
            body_limit_bytes,
            upload_dir,
            secret_key,
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.secret_key == PLACEHOLDER_SECRET
    }
}
