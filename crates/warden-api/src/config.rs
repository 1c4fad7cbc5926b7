//! Configuration management for the Warden API.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use warden_payments::{PaymentConfig, DEFAULT_API_BASE};
use warden_store::StoreConfig;

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Credentials have no defaults. A missing data store URL or key stops the
/// service at startup; missing gateway or relay settings only disable the
/// routes that need them.
///
/// # Example
///
/// ```no_run
/// use warden_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Data store
    /// Base URL of the hosted data store project.
    ///
    /// Environment variable: `SUPABASE_URL`
    #[serde(default, alias = "SUPABASE_URL")]
    pub supabase_url: String,
    /// Service role key for the data store.
    ///
    /// Environment variable: `SUPABASE_SERVICE_ROLE_KEY`
    #[serde(default, alias = "SUPABASE_SERVICE_ROLE_KEY")]
    pub supabase_service_role_key: String,

    // Payment gateway
    /// Gateway secret key; payment routes are disabled without it.
    ///
    /// Environment variable: `STRIPE_SECRET_KEY`
    #[serde(default, alias = "STRIPE_SECRET_KEY")]
    pub stripe_secret_key: Option<String>,
    /// Webhook endpoint secret used to verify gateway deliveries.
    ///
    /// Environment variable: `STRIPE_WEBHOOK_SECRET`
    #[serde(default, alias = "STRIPE_WEBHOOK_SECRET")]
    pub stripe_webhook_secret: Option<String>,
    /// Gateway base URL.
    ///
    /// Environment variable: `STRIPE_API_BASE`
    #[serde(default = "default_stripe_api_base", alias = "STRIPE_API_BASE")]
    pub stripe_api_base: String,
    /// Front-end URL checkout redirects return to.
    ///
    /// Environment variable: `FRONTEND_URL`
    #[serde(default = "default_frontend_url", alias = "FRONTEND_URL")]
    pub frontend_url: String,

    // Relay
    /// Outbound webhook blasts are forwarded to.
    ///
    /// Environment variable: `MAKE_WEBHOOK_URL`
    #[serde(default, alias = "MAKE_WEBHOOK_URL")]
    pub make_webhook_url: Option<String>,
    /// Relay request timeout in seconds.
    ///
    /// Environment variable: `RELAY_TIMEOUT_SECONDS`
    #[serde(default = "default_relay_timeout", alias = "RELAY_TIMEOUT_SECONDS")]
    pub relay_timeout_seconds: u64,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails
    /// validation.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Relay timeout as a duration.
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_secs(self.relay_timeout_seconds)
    }

    /// Data store client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store URL or service key is missing.
    pub fn to_store_config(&self) -> Result<StoreConfig> {
        if self.supabase_url.trim().is_empty() {
            anyhow::bail!("supabase_url is not configured");
        }
        if self.supabase_service_role_key.trim().is_empty() {
            anyhow::bail!("supabase_service_role_key is not configured");
        }
        Ok(StoreConfig::new(&self.supabase_url, &self.supabase_service_role_key))
    }

    /// Payment gateway configuration, if a secret key is set.
    pub fn to_payment_config(&self) -> Option<PaymentConfig> {
        present(self.stripe_secret_key.as_deref())
            .map(|key| PaymentConfig::new(key).with_api_base(&self.stripe_api_base))
    }

    /// Webhook endpoint secret, if set.
    pub fn webhook_secret(&self) -> Option<&str> {
        present(self.stripe_webhook_secret.as_deref())
    }

    /// Relay URL, if set.
    pub fn relay_url(&self) -> Option<&str> {
        present(self.make_webhook_url.as_deref())
    }

    /// Whether a gateway key is configured.
    pub fn stripe_configured(&self) -> bool {
        present(self.stripe_secret_key.as_deref()).is_some()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.relay_timeout_seconds == 0 {
            anyhow::bail!("relay_timeout_seconds must be greater than 0");
        }

        if !self.stripe_api_base.starts_with("http") {
            anyhow::bail!("stripe_api_base must be an http(s) URL");
        }

        Ok(())
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn mask(value: Option<&str>) -> &'static str {
    if present(value).is_some() {
        "***"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_role_key", &mask(Some(&self.supabase_service_role_key)))
            .field("stripe_secret_key", &mask(self.stripe_secret_key.as_deref()))
            .field("stripe_webhook_secret", &mask(self.stripe_webhook_secret.as_deref()))
            .field("stripe_api_base", &self.stripe_api_base)
            .field("frontend_url", &self.frontend_url)
            .field("make_webhook_url", &self.make_webhook_url)
            .field("relay_timeout_seconds", &self.relay_timeout_seconds)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: default_stripe_api_base(),
            frontend_url: default_frontend_url(),
            make_webhook_url: None,
            relay_timeout_seconds: default_relay_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    60
}

fn default_stripe_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_relay_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        vars: Vec<String>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Self { _lock: lock, vars: Vec::new(), originals: HashMap::new() }
        }

        fn set_var(&mut self, key: &str, value: &str) {
            if !self.vars.contains(&key.to_string()) {
                self.originals.insert(key.to_string(), env::var(key).ok());
                self.vars.push(key.to_string());
            }
            env::set_var(key, value);
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                match self.originals.get(var) {
                    Some(Some(value)) => env::set_var(var, value),
                    Some(None) => env::remove_var(var),
                    None => {},
                }
            }
        }
    }

    #[test]
    fn defaults_validate() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.port, 5000);
        assert_eq!(config.request_timeout, 60);
        assert_eq!(config.relay_timeout_seconds, 30);
        assert_eq!(config.stripe_api_base, "https://api.stripe.com");
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert!(!config.stripe_configured());
        assert!(config.relay_url().is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("PORT", "9090");
        guard.set_var("SUPABASE_URL", "https://proj.supabase.co");
        guard.set_var("SUPABASE_SERVICE_ROLE_KEY", "service-role");
        guard.set_var("STRIPE_SECRET_KEY", "sk_test_abc");
        guard.set_var("MAKE_WEBHOOK_URL", "https://hook.example/abc");
        guard.set_var("RELAY_TIMEOUT_SECONDS", "12");

        let config = Config::load().expect("Config should load with env overrides");

        assert_eq!(config.port, 9090);
        assert_eq!(config.relay_timeout(), Duration::from_secs(12));
        assert!(config.stripe_configured());
        assert_eq!(config.relay_url(), Some("https://hook.example/abc"));

        let store = config.to_store_config().expect("store settings are present");
        assert_eq!(store.base_url, "https://proj.supabase.co");
    }

    #[test]
    fn blank_optional_secrets_count_as_unset() {
        let config = Config {
            stripe_secret_key: Some("   ".into()),
            stripe_webhook_secret: Some(String::new()),
            ..Config::default()
        };

        assert!(config.to_payment_config().is_none());
        assert!(config.webhook_secret().is_none());
    }

    #[test]
    fn store_settings_are_required_to_build_a_client() {
        let config = Config { supabase_url: "https://proj.supabase.co".into(), ..Config::default() };

        let err = config.to_store_config().unwrap_err();

        assert!(err.to_string().contains("supabase_service_role_key"));
    }

    #[test]
    fn invalid_config_validation_fails() {
        let mut config = Config::default();
        config.port = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.request_timeout = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.relay_timeout_seconds = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.stripe_api_base = "api.stripe.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_masks_secrets() {
        let config = Config {
            supabase_service_role_key: "service-role-secret".into(),
            stripe_secret_key: Some("sk_live_secret".into()),
            stripe_webhook_secret: Some("whsec_secret".into()),
            ..Config::default()
        };

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("service-role-secret"));
        assert!(!rendered.contains("sk_live_secret"));
        assert!(!rendered.contains("whsec_secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn socket_address_parsing() {
        let config = Config { host: "127.0.0.1".into(), port: 9000, ..Config::default() };

        let addr = config.parse_server_addr().expect("Should parse socket address");

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
    }
}
