use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "elevenlabs_api_key")]
    pub elevenlabs_key: String,
    #[serde(rename = "eleven_voice_id")]
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(rename = "eleven_model_id")]
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
    #[serde(default = "default_client_secret_path")]
    pub client_secret_path: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_privacy_status")]
    pub privacy_status: String,
    #[serde(skip)]
    pub pexels_key: String,
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_client_secret_path() -> String {
    "client_secret.json".to_string()
}

fn default_token_path() -> String {
    "token.json".to_string()
}

fn default_privacy_status() -> String {
    "public".to_string()
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let mut config: Config = serde_json::from_str(&content)?;

        if config.elevenlabs_key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing");
        }

        // The stock-media key lives in the environment, not in config.json.
        config.pexels_key = std::env::var("PEXELS_API_KEY")
            .context("PEXELS_API_KEY environment variable is not set")?;
        if config.pexels_key.is_empty() {
            anyhow::bail!("PEXELS_API_KEY is empty");
        }

        Ok(config)
    }
}
