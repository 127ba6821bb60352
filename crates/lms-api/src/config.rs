use serde::Deserialize;

/// Deployment environment; drives log format, cookie and header policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Process configuration, read once at start-up.
///
/// Every field maps to the upper-cased environment variable of the same name
/// (`DATABASE_URL`, `PAYSTACK_SECRET_KEY`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    /// HS256 secret shared with the identity provider's session tokens
    pub jwt_secret: String,
    /// Svix signing secret (`whsec_...`) for identity webhooks
    pub identity_webhook_secret: String,

    pub paystack_secret_key: String,
    #[serde(default = "default_paystack_base_url")]
    pub paystack_base_url: String,

    pub mux_token_id: String,
    pub mux_token_secret: String,
    pub mux_webhook_secret: String,
    #[serde(default = "default_mux_base_url")]
    pub mux_base_url: String,

    /// Timeout applied to every outbound provider call
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from_email: Option<String>,
    pub smtp_from_name: Option<String>,

    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Comma separated list of CORS origins
    #[serde(default = "default_frontend_url")]
    pub allowed_origins: String,

    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_max_connections() -> u32 {
    10
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_mux_base_url() -> String {
    "https://api.mux.com".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_port() -> u16 {
    3000
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Build the configuration from Shuttle secrets instead of the process
    /// environment. Keys use the same upper-case names as `from_env`.
    #[cfg(feature = "shuttle")]
    pub fn from_shuttle_secrets(secrets: &shuttle_runtime::SecretStore) -> Result<Self, envy::Error> {
        const KEYS: &[&str] = &[
            "DATABASE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "JWT_SECRET",
            "IDENTITY_WEBHOOK_SECRET",
            "PAYSTACK_SECRET_KEY",
            "PAYSTACK_BASE_URL",
            "MUX_TOKEN_ID",
            "MUX_TOKEN_SECRET",
            "MUX_WEBHOOK_SECRET",
            "MUX_BASE_URL",
            "HTTP_TIMEOUT_SECS",
            "SMTP_HOST",
            "SMTP_USERNAME",
            "SMTP_PASSWORD",
            "SMTP_FROM_EMAIL",
            "SMTP_FROM_NAME",
            "FRONTEND_URL",
            "ALLOWED_ORIGINS",
            "ENVIRONMENT",
            "PORT",
        ];

        let mut pairs: Vec<(String, String)> = KEYS
            .iter()
            .filter_map(|key| secrets.get(key).map(|value| (key.to_string(), value)))
            .collect();

        // Shuttle injects the pool itself; the URL is informational there
        if !pairs.iter().any(|(key, _)| key == "DATABASE_URL") {
            pairs.push(("DATABASE_URL".to_string(), String::new()));
        }

        envy::from_iter(pairs)
    }

    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
