//! Configuration for the Orders API client.

use std::env;

use crate::error::{GatewayError, Result};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.mercadopago.com";

/// Default request timeout in seconds. The Orders API has no server-side
/// deadline we can rely on, so the client always imposes its own.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default pix code lifetime when the provider omits an expiration.
pub const DEFAULT_PIX_EXPIRATION_HOURS: i64 = 24;

/// Configuration for [`crate::OrdersClient`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API base URL.
    pub api_url: String,

    /// Access token used as the bearer credential.
    pub access_token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Fallback pix expiration window in hours.
    pub pix_expiration_hours: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pix_expiration_hours: DEFAULT_PIX_EXPIRATION_HOURS,
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `MPAGO_ACCESS_TOKEN` - access token for authentication
    ///
    /// Optional environment variables:
    /// - `MPAGO_API_URL` - API base URL (default: https://api.mercadopago.com)
    /// - `MPAGO_TIMEOUT_SECS` - request timeout (default: 15)
    /// - `MPAGO_PIX_EXPIRATION_HOURS` - pix code lifetime fallback (default: 24)
    pub fn from_env() -> Result<Self> {
        let access_token = env::var("MPAGO_ACCESS_TOKEN")
            .map_err(|_| GatewayError::Configuration("MPAGO_ACCESS_TOKEN not set".to_string()))?;

        let api_url = env::var("MPAGO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout_secs = env::var("MPAGO_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let pix_expiration_hours = env::var("MPAGO_PIX_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PIX_EXPIRATION_HOURS);

        let config = Self {
            api_url,
            access_token,
            timeout_secs,
            pix_expiration_hours,
        };
        config.validate_credentials()?;

        Ok(config)
    }

    /// Create a new config builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// The Orders API only accepts application credentials; anything else
    /// fails before a request is ever sent.
    pub fn validate_credentials(&self) -> Result<()> {
        let token = self.access_token.trim();
        if token.is_empty() {
            return Err(GatewayError::Configuration(
                "access token is empty".to_string(),
            ));
        }
        if !token.starts_with("APP_USR-") && !token.starts_with("TEST-") {
            return Err(GatewayError::Configuration(
                "access token is not an application credential (expected APP_USR- or TEST- prefix)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    /// Set the access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Set the fallback pix expiration window.
    pub fn pix_expiration_hours(mut self, hours: i64) -> Self {
        self.config.pix_expiration_hours = hours;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GatewayConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.access_token.is_empty());
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.pix_expiration_hours, 24);
    }

    #[test]
    fn test_builder() {
        let config = GatewayConfig::builder()
            .access_token("APP_USR-abc")
            .api_url("https://sandbox.local")
            .timeout_secs(5)
            .pix_expiration_hours(2)
            .build();
        assert_eq!(config.access_token, "APP_USR-abc");
        assert_eq!(config.api_url, "https://sandbox.local");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.pix_expiration_hours, 2);
    }

    #[test]
    fn test_credential_class_validation() {
        assert!(GatewayConfig::builder()
            .access_token("APP_USR-123")
            .build()
            .validate_credentials()
            .is_ok());
        assert!(GatewayConfig::builder()
            .access_token("TEST-123")
            .build()
            .validate_credentials()
            .is_ok());

        let err = GatewayConfig::builder()
            .access_token("PUB-123")
            .build()
            .validate_credentials()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = GatewayConfig::default().validate_credentials().unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    // Environment-based scenarios share one test because env vars are
    // process-global and tests run in parallel.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            std::env::remove_var("MPAGO_ACCESS_TOKEN");
            std::env::remove_var("MPAGO_API_URL");
            std::env::remove_var("MPAGO_TIMEOUT_SECS");
            std::env::remove_var("MPAGO_PIX_EXPIRATION_HOURS");
        }

        clear_vars();
        assert!(matches!(
            GatewayConfig::from_env(),
            Err(GatewayError::Configuration(_))
        ));

        clear_vars();
        std::env::set_var("MPAGO_ACCESS_TOKEN", "TEST-env-token");
        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.access_token, "TEST-env-token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 15);

        clear_vars();
        std::env::set_var("MPAGO_ACCESS_TOKEN", "APP_USR-full");
        std::env::set_var("MPAGO_API_URL", "https://test.api.local");
        std::env::set_var("MPAGO_TIMEOUT_SECS", "30");
        std::env::set_var("MPAGO_PIX_EXPIRATION_HOURS", "6");
        let config = GatewayConfig::from_env().unwrap();
        assert_eq!(config.api_url, "https://test.api.local");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pix_expiration_hours, 6);

        clear_vars();
    }
}
