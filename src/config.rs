//! Configuration management for Campus Hub.
//!
//! Loads configuration from environment variables at startup:
//! - Server binding for the API and the assistant service
//! - Database path
//! - LLM providers with fallback priority
//! - JWT signing secret and token lifetime
//! - Upload storage limits

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub assistant: AssistantConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub assistant_port: u16,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub providers: Vec<LlmProvider>,
}

#[derive(Debug, Clone)]
pub struct LlmProvider {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub priority: u8,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Base URL of the REST API used for context fetches.
    pub api_base_url: String,
    /// Retained turns per conversation (system seed excluded).
    pub history_max_turns: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub uploads_path: String,
    pub max_upload_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "5000").parse().expect("Invalid PORT"),
                assistant_port: env_or("ASSISTANT_PORT", "5001")
                    .parse()
                    .expect("Invalid ASSISTANT_PORT"),
                cors_origin: env::var("CORS_ORIGIN").ok(),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/campus.db"),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| nanoid::nanoid!(32)),
                token_ttl_hours: env_or("TOKEN_TTL_HOURS", "168").parse().unwrap_or(168),
            },
            llm: LlmConfig {
                providers: Self::parse_llm_providers(),
            },
            assistant: AssistantConfig {
                api_base_url: env_or("API_BASE_URL", "http://localhost:5000"),
                history_max_turns: env_or("HISTORY_MAX_TURNS", "40").parse().unwrap_or(40),
            },
            storage: StorageConfig {
                uploads_path: env_or("UPLOADS_PATH", "./data/uploads"),
                max_upload_size: env_or("MAX_UPLOAD_SIZE", "5242880")
                    .parse()
                    .unwrap_or(5 * 1024 * 1024), // 5MB
            },
        }
    }

    /// Parse LLM providers from environment.
    /// Supports Gemini, Anthropic, and OpenAI with automatic fallback ordering.
    fn parse_llm_providers() -> Vec<LlmProvider> {
        let mut providers = Vec::new();

        // Gemini (priority 1 - free tier)
        if let Ok(api_key) = env::var("GOOGLE_API_KEY") {
            providers.push(LlmProvider {
                name: "gemini".to_string(),
                base_url: env_or(
                    "GEMINI_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
                api_key,
                priority: 1,
            });
        }

        // Anthropic/Claude (priority 2)
        if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
            providers.push(LlmProvider {
                name: "anthropic".to_string(),
                base_url: env_or("ANTHROPIC_BASE_URL", "https://api.anthropic.com/v1"),
                model: env_or("ANTHROPIC_MODEL", "claude-3-5-haiku-20241022"),
                api_key,
                priority: 2,
            });
        }

        // OpenAI (priority 3)
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            providers.push(LlmProvider {
                name: "openai".to_string(),
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
                api_key,
                priority: 3,
            });
        }

        // Sort by priority
        providers.sort_by_key(|p| p.priority);
        providers
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("CAMPUS_HUB_MISSING_VAR", "fallback"), "fallback");
    }
}
