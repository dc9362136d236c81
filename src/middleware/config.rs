use axum_extra::extract::cookie::Key;

use super::error::GateError;
use super::spend::RetryPolicy;

/// Shared gate settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct GateSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) client_cookie_name: String,
    pub(crate) session_ttl_days: i64,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) wallet_path: String,
    pub(crate) dev_login_enabled: bool,
    pub(crate) vip_price_gems: u64,
    pub(crate) retry: RetryPolicy,
}

impl GateSettings {
    pub(crate) fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "session".into(),
            client_cookie_name: "session_ui".into(),
            session_ttl_days: 7,
            secure_cookies: true,
            auth_path: "/api/auth".into(),
            wallet_path: "/api/wallet".into(),
            dev_login_enabled: false,
            vip_price_gems: 100,
            retry: RetryPolicy::default(),
        }
    }
}

/// Gate configuration.
///
/// All fields have working defaults. Use [`from_env()`](GateConfig::from_env)
/// for convention-based setup, or [`new()`](GateConfig::new) with `with_*`
/// methods for full control.
pub struct GateConfig {
    pub(super) settings: GateSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfig {
    /// Create config with defaults and an ephemeral cookie key.
    ///
    /// Sessions do not survive a restart unless a stable key is supplied
    /// with [`with_cookie_key`](Self::with_cookie_key).
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: GateSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `COOKIE_KEY`: Cookie encryption key bytes (at least 64)
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to enable the dev-login route
    ///   and disable secure cookies
    /// - `SESSION_TTL_DAYS`: Session validity in days
    /// - `VIP_PRICE_GEMS`: Gem price of the VIP upgrade
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, GateError> {
        let dev_auth = matches!(std::env::var("DEV_AUTH").as_deref(), Ok("1") | Ok("true"));

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                GateError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        let mut config = Self::new()
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth)
            .with_dev_login_enabled(dev_auth);

        if let Ok(days) = std::env::var("SESSION_TTL_DAYS") {
            let days: i64 = days
                .parse()
                .map_err(|e| GateError::Config(format!("SESSION_TTL_DAYS: {e}")))?;
            config = config.with_session_ttl_days(days);
        }
        if let Ok(price) = std::env::var("VIP_PRICE_GEMS") {
            let price: u64 = price
                .parse()
                .map_err(|e| GateError::Config(format!("VIP_PRICE_GEMS: {e}")))?;
            config = config.with_vip_price_gems(price);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_client_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.client_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_wallet_path(mut self, path: impl Into<String>) -> Self {
        self.settings.wallet_path = path.into();
        self
    }

    #[must_use]
    pub fn with_dev_login_enabled(mut self, enabled: bool) -> Self {
        self.settings.dev_login_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_vip_price_gems(mut self, price: u64) -> Self {
        self.settings.vip_price_gems = price;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.settings.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_contract() {
        let config = GateConfig::new();
        assert_eq!(config.settings.session_cookie_name, "session");
        assert_eq!(config.settings.session_ttl_days, 7);
        assert!(config.settings.secure_cookies);
        assert!(!config.settings.dev_login_enabled);
        assert_eq!(config.settings.vip_price_gems, 100);
        assert_eq!(config.settings.retry.max_attempts, 3);
    }

    #[test]
    fn builders_override_defaults() {
        let config = GateConfig::new()
            .with_session_cookie_name("sf_session")
            .with_session_ttl_days(1)
            .with_secure_cookies(false)
            .with_vip_price_gems(250);
        assert_eq!(config.settings.session_cookie_name, "sf_session");
        assert_eq!(config.settings.session_ttl_days, 1);
        assert!(!config.settings.secure_cookies);
        assert_eq!(config.settings.vip_price_gems, 250);
    }
}
