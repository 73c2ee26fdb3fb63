use boxoffice_core::holds::DEFAULT_HOLD_TTL_SECS;
use boxoffice_core::payment::DEFAULT_MAX_PAYMENT_ATTEMPTS;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Connection pool size (default: `20`).
    pub db_max_connections: u32,
    pub checkout: CheckoutConfig,
}

/// Tunables of the checkout flow.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// How long a hold keeps its seats (default: 600 s).
    pub hold_ttl_secs: i64,
    /// Payment attempts allowed per order (default: `5`).
    pub max_payment_attempts: i64,
    /// Extra attempts after a serialization failure in order creation
    /// (default: `3`).
    pub order_create_max_retries: u32,
    /// Shared secret for webhook signatures. Unset disables verification.
    pub webhook_secret: Option<String>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            hold_ttl_secs: DEFAULT_HOLD_TTL_SECS,
            max_payment_attempts: DEFAULT_MAX_PAYMENT_ATTEMPTS,
            order_create_max_retries: 3,
            webhook_secret: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `DB_MAX_CONNECTIONS`       | `20`                    |
    /// | `HOLD_TTL_SECS`            | `600`                   |
    /// | `MAX_PAYMENT_ATTEMPTS`     | `5`                     |
    /// | `ORDER_CREATE_MAX_RETRIES` | `3`                     |
    /// | `PAYMENT_WEBHOOK_SECRET`   | unset                   |
    ///
    /// Panics on unparsable values; misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", "3000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", "30");
        let db_max_connections: u32 = parse_env("DB_MAX_CONNECTIONS", "20");

        let defaults = CheckoutConfig::default();
        let checkout = CheckoutConfig {
            hold_ttl_secs: parse_env("HOLD_TTL_SECS", &defaults.hold_ttl_secs.to_string()),
            max_payment_attempts: parse_env(
                "MAX_PAYMENT_ATTEMPTS",
                &defaults.max_payment_attempts.to_string(),
            ),
            order_create_max_retries: parse_env(
                "ORDER_CREATE_MAX_RETRIES",
                &defaults.order_create_max_retries.to_string(),
            ),
            webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            db_max_connections,
            checkout,
        }
    }
}

fn parse_env<T>(name: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("{name} is invalid: {e}"))
}
