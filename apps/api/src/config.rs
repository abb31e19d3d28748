use anyhow::{bail, Context, Result};

use crate::provider::{gemini, openai, ProviderConfig};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Active AI backend, fixed for the process lifetime.
    pub provider: ProviderConfig,
    /// Allowed CORS origins. Empty means permissive (local development).
    pub client_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider_name =
            std::env::var("AI_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_name.to_lowercase().as_str() {
            "gemini" => ProviderConfig::Gemini {
                api_key: require_env("GEMINI_API_KEY")?,
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| gemini::DEFAULT_MODEL.to_string()),
            },
            "openai" => ProviderConfig::OpenAi {
                api_key: require_env("OPENAI_API_KEY")?,
                model: std::env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| openai::DEFAULT_MODEL.to_string()),
            },
            other => bail!("Unsupported AI_PROVIDER '{other}' (expected 'gemini' or 'openai')"),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            provider,
            client_origins: std::env::var("CLIENT_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
