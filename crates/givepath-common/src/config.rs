//! Configuration for GivePath

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Razorpay payment gateway configuration
    #[serde(default)]
    pub razorpay: RazorpayConfig,

    /// SendGrid email provider configuration
    #[serde(default)]
    pub sendgrid: SendGridConfig,

    /// Scheduled-campaign sweep configuration
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            bind_address: default_bind_address(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Bearer token granting access to the admin API
    pub admin_token: Option<String>,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            admin_token: None,
            cors_origins: Vec::new(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

/// Razorpay payment gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RazorpayConfig {
    /// Public key identifier
    pub key_id: Option<String>,

    /// Secret key, used for order creation and signature verification
    pub key_secret: Option<String>,
}

/// SendGrid email provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGridConfig {
    /// API key; when absent, sends run in mock mode and no email leaves
    /// the process
    pub api_key: Option<String>,

    /// From address stamped on every outbound message
    #[serde(default = "default_from_email")]
    pub from_email: String,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from_email: default_from_email(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@givepath.org".to_string()
}

/// Scheduled-campaign sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Run the sweep inside the server process on an interval. When
    /// disabled, the sweep only runs via its admin endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Interval between sweep runs (seconds)
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/givepath/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_sections() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address, "0.0.0.0");

        let api = ApiConfig::default();
        assert_eq!(api.port, 8080);
        assert!(api.admin_token.is_none());

        let sweep = SweepConfig::default();
        assert!(!sweep.enabled);
        assert_eq!(sweep.interval_secs, 60);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [database]
            url = "postgres://localhost/givepath"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/givepath");
        assert_eq!(config.database.max_connections, 20);
        assert!(config.sendgrid.api_key.is_none());
        assert_eq!(config.sendgrid.from_email, "noreply@givepath.org");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [database]
            url = "postgres://localhost/givepath"

            [api]
            port = 9090
            admin_token = "secret-token"

            [razorpay]
            key_id = "rzp_test_key"
            key_secret = "rzp_test_secret"

            [sendgrid]
            api_key = "SG.key"
            from_email = "hello@example.org"

            [sweep]
            enabled = true
            interval_secs = 30
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.port, 9090);
        assert_eq!(config.razorpay.key_id.as_deref(), Some("rzp_test_key"));
        assert_eq!(config.sendgrid.from_email, "hello@example.org");
        assert!(config.sweep.enabled);
        assert_eq!(config.sweep.interval_secs, 30);
    }
}
