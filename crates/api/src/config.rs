use serde::Deserialize;
use shared::jwt::{JwtError, JwtVerifier};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Identity provider token verification
    pub auth: AuthConfig,
    /// Guest and celebrant notification e-mails
    #[serde(default)]
    pub email: EmailConfig,
    /// Birthday letter generation
    #[serde(default)]
    pub letters: LettersConfig,
    /// Pending admin write queue
    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Public submissions per client IP per minute. 0 disables limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Send Strict-Transport-Security. Only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

/// Verification settings for identity provider access tokens.
///
/// Exactly one of `public_key` (RS256) or `hs256_secret` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// RSA public key in PEM format
    #[serde(default)]
    pub public_key: String,

    /// Shared secret for HS256 tokens
    #[serde(default)]
    pub hs256_secret: String,

    /// Expected `iss` claim; empty skips the check
    #[serde(default)]
    pub issuer: String,

    /// Expected `aud` claim; empty skips the check
    #[serde(default)]
    pub audience: String,

    /// Clock skew tolerance in seconds
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Builds the token verifier described by this section.
    pub fn verifier(&self) -> Result<JwtVerifier, JwtError> {
        let verifier = if !self.public_key.is_empty() {
            JwtVerifier::rs256(&self.public_key)?
        } else {
            JwtVerifier::hs256(&self.hs256_secret)?
        };

        let mut verifier = verifier.with_leeway(self.leeway_secs);
        if !self.issuer.is_empty() {
            verifier = verifier.with_issuer(self.issuer.clone());
        }
        if !self.audience.is_empty() {
            verifier = verifier.with_audience(self.audience.clone());
        }
        Ok(verifier)
    }
}

/// Email service configuration for reservation and donation notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: resend, sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default)]
    pub resend_api_key: String,

    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Receives the celebrant notification for every reservation and donation
    #[serde(default)]
    pub admin_email: String,

    /// Base URL of the guest facing site, linked from e-mails
    #[serde(default)]
    pub base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            resend_api_key: String::new(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            admin_email: String::new(),
            base_url: String::new(),
        }
    }
}

/// Chat completion endpoint used for birthday letters.
#[derive(Debug, Clone, Deserialize)]
pub struct LettersConfig {
    /// API key; letters answer with a configuration error when empty
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_letters_api_url")]
    pub api_url: String,

    #[serde(default = "default_letters_model")]
    pub model: String,

    #[serde(default = "default_letters_temperature")]
    pub temperature: f32,

    #[serde(default = "default_letters_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_letters_timeout")]
    pub timeout_secs: u64,
}

impl Default for LettersConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_letters_api_url(),
            model: default_letters_model(),
            temperature: default_letters_temperature(),
            max_tokens: default_letters_max_tokens(),
            timeout_secs: default_letters_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// JSON file holding queued writes across restarts. Empty keeps them in memory.
    #[serde(default)]
    pub persist_path: String,

    /// Seconds between connectivity probes while writes are queued
    #[serde(default = "default_replay_interval")]
    pub replay_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            persist_path: String::new(),
            replay_interval_secs: default_replay_interval(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    30
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_email() -> String {
    "noreply@birthday-wishlist.app".to_string()
}
fn default_sender_name() -> String {
    "Birthday Wishlist".to_string()
}
fn default_letters_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_letters_model() -> String {
    "gpt-4o".to_string()
}
fn default_letters_temperature() -> f32 {
    0.7
}
fn default_letters_max_tokens() -> u32 {
    800
}
fn default_letters_timeout() -> u64 {
    30
}
fn default_replay_interval() -> u64 {
    15
}

const EMAIL_PROVIDERS: [&str; 3] = ["console", "resend", "sendgrid"];

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with WL__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("WL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 30

            [auth]
            hs256_secret = "test-secret"
            leeway_secs = 30

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"

            [letters]
            model = "gpt-4o"

            [queue]
            replay_interval_secs = 15
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WL__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.auth.public_key.is_empty() && self.auth.hs256_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "WL__AUTH__PUBLIC_KEY or WL__AUTH__HS256_SECRET must be set".to_string(),
            ));
        }
        if !self.auth.public_key.is_empty() && !self.auth.hs256_secret.is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "auth.public_key and auth.hs256_secret are mutually exclusive".to_string(),
            ));
        }
        self.auth
            .verifier()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("auth: {}", e)))?;

        if !EMAIL_PROVIDERS.contains(&self.email.provider.as_str()) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "email.provider must be one of {}",
                EMAIL_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.letters.temperature) {
            return Err(ConfigValidationError::InvalidValue(
                "letters.temperature must be between 0 and 2".to_string(),
            ));
        }

        if self.queue.replay_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "queue.replay_interval_secs cannot be 0".to_string(),
            ));
        }

        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!(
                    "Invalid socket address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }
}
