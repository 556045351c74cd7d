use anyhow::{Context, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{debug, info};

use crate::agent::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub record_path: PathBuf,
    pub history_path: PathBuf,
    pub bulletin_path: PathBuf,
    pub public_dir: PathBuf,
    pub timeline_path: Option<PathBuf>,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Config {
    /// Read configuration from the process environment, after loading `.env` if present
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!(".env not loaded: {e}");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_address: try_load(&var, "BIND_ADDRESS", "0.0.0.0")?,
            port: try_load(&var, "PORT", "3000")?,
            record_path: try_load(&var, "VISA_DATA_PATH", "data/visas.json")?,
            history_path: try_load(&var, "VISA_HISTORY_PATH", "data/visaHistory.json")?,
            bulletin_path: try_load(&var, "VISA_BULLETIN_PATH", "data/visaBulletin.json")?,
            public_dir: try_load(&var, "PUBLIC_DIR", "public")?,
            timeline_path: var("TIMELINE_CONFIG_PATH").map(PathBuf::from),
            google_api_key: var("GOOGLE_API_KEY"),
            gemini_model: try_load(&var, "GEMINI_MODEL", DEFAULT_MODEL)?,
            gemini_base_url: try_load(&var, "GEMINI_BASE_URL", DEFAULT_BASE_URL)?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Generation settings, only when a credential is configured
    pub fn gemini(&self) -> Option<GeminiConfig> {
        self.google_api_key.as_ref().map(|key| GeminiConfig {
            api_key: key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
        })
    }
}

fn try_load<T: FromStr>(var: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw:?}"))
}
