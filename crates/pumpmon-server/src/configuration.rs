use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment};
use pumpmon::agent::{AgentConfig, HistoryOrder};
use pumpmon::providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Keys without a default; a missing one is reported by its environment variable
const REQUIRED_KEYS: &[&str] = &["provider.api_key"];

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub history_order: HistoryOrder,
    /// Replaces the bundled system prompt template
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            stream_timeout_secs: default_stream_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            history_order: HistoryOrder::default(),
            system_prompt_path: None,
        }
    }
}

impl ChatSettings {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            stream_timeout: Duration::from_secs(self.stream_timeout_secs),
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            history_order: self.history_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CorsSettings {
    /// Comma separated list of origins
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsSettings {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", default_openai_host())?
            .set_default("provider.model", default_model())?
            .set_default("cors.allowed_origins", default_allowed_origins())?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let Some(field) = missing_field(&err.to_string()) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

/// Recover the dotted key from a "missing field `x`" deserialization message
fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;

    if let Some((key, _)) = rest
        .split_once("for key `")
        .and_then(|(_, key)| key.split_once('`'))
    {
        return Some(format!("{key}.{field}"));
    }

    let qualified = REQUIRED_KEYS
        .iter()
        .find(|key| key.rsplit('.').next() == Some(field))
        .map(|key| key.to_string());
    Some(qualified.unwrap_or_else(|| field.to_string()))
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_provider_timeout() -> u64 {
    120
}

fn default_stream_timeout() -> u64 {
    120
}

fn default_tool_timeout() -> u64 {
    10
}

fn default_allowed_origins() -> String {
    "http://localhost:3000,http://localhost:3001".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("PUMPMON_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("PUMPMON_PROVIDER__API_KEY", "test-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);

        assert_eq!(settings.chat.history_order, HistoryOrder::NamedFirst);
        assert_eq!(settings.chat.system_prompt_path, None);
        let agent = settings.chat.agent_config();
        assert_eq!(agent.stream_timeout, Duration::from_secs(120));
        assert_eq!(agent.tool_timeout, Duration::from_secs(10));

        assert_eq!(
            settings.cors.origins(),
            vec!["http://localhost:3000", "http://localhost:3001"]
        );

        let provider = settings.provider.into_config();
        assert_eq!(provider.host, "https://api.openai.com");
        assert_eq!(provider.api_key, "test-key");
        assert_eq!(provider.model, "gpt-4o");
        assert_eq!(provider.temperature, None);
        assert_eq!(provider.max_tokens, None);
        assert_eq!(provider.timeout, Duration::from_secs(120));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("PUMPMON_SERVER__PORT", "8080");
        env::set_var("PUMPMON_PROVIDER__API_KEY", "test-key");
        env::set_var("PUMPMON_PROVIDER__HOST", "https://custom.openai.com");
        env::set_var("PUMPMON_PROVIDER__MODEL", "gpt-4o-mini");
        env::set_var("PUMPMON_PROVIDER__TEMPERATURE", "0.2");
        env::set_var("PUMPMON_PROVIDER__MAX_TOKENS", "2000");
        env::set_var("PUMPMON_CHAT__HISTORY_ORDER", "chronological");
        env::set_var("PUMPMON_CHAT__TOOL_TIMEOUT_SECS", "3");
        env::set_var("PUMPMON_CHAT__SYSTEM_PROMPT_PATH", "/etc/pumpmon/prompt.md");
        env::set_var(
            "PUMPMON_CORS__ALLOWED_ORIGINS",
            "https://ops.example.com, https://plant.example.com",
        );

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.chat.history_order, HistoryOrder::Chronological);
        assert_eq!(
            settings.chat.agent_config().tool_timeout,
            Duration::from_secs(3)
        );
        assert_eq!(
            settings.chat.system_prompt_path,
            Some(PathBuf::from("/etc/pumpmon/prompt.md"))
        );
        assert_eq!(
            settings.cors.origins(),
            vec!["https://ops.example.com", "https://plant.example.com"]
        );

        let provider = settings.provider.into_config();
        assert_eq!(provider.host, "https://custom.openai.com");
        assert_eq!(provider.model, "gpt-4o-mini");
        assert_eq!(provider.temperature, Some(0.2));
        assert_eq!(provider.max_tokens, Some(2000));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "PUMPMON_PROVIDER__API_KEY");
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_message() {
        assert_eq!(
            missing_field("missing field `api_key`").as_deref(),
            Some("provider.api_key")
        );
        assert_eq!(
            missing_field("missing field `api_key` for key `provider`").as_deref(),
            Some("provider.api_key")
        );
        assert_eq!(missing_field("invalid type: string"), None);
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8000");

        let server_settings = ServerSettings {
            host: "not a host".to_string(),
            port: 8000,
        };
        assert!(server_settings.socket_addr().is_err());
    }
}
