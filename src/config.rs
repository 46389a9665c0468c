//! TOML configuration with environment overrides.
//!
//! Every field has a default, so an absent file or an empty one yields a
//! working local setup: port 8888 on loopback, a 15-minute trial and checkout
//! disabled until an endpoint is configured.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkout::{CheckoutGateway, HttpCheckout, PriceIds};
use crate::entitlement::DEFAULT_TRIAL_SECS;
use crate::error::DashboardError;
use crate::layout::ClampPolicy;

pub const ENV_CHECKOUT_ENDPOINT: &str = "MSW_CHECKOUT_ENDPOINT";
pub const ENV_CHECKOUT_CONFIRM_ENDPOINT: &str = "MSW_CHECKOUT_CONFIRM_ENDPOINT";
pub const ENV_PRICE_MONTHLY: &str = "MSW_PRICE_MONTHLY";
pub const ENV_PRICE_QUARTERLY: &str = "MSW_PRICE_QUARTERLY";
pub const ENV_PRICE_YEARLY: &str = "MSW_PRICE_YEARLY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub trial: TrialConfig,
    pub checkout: CheckoutConfig,
    pub layout: LayoutConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8888,
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub duration_secs: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_TRIAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Backend `create-checkout-session` URL. Unset disables checkout.
    pub endpoint: Option<String>,
    /// Backend URL reporting whether a checkout session was paid.
    pub confirm_endpoint: Option<String>,
    /// Upgrade instantly without calling any backend.
    pub demo: bool,
    pub timeout_secs: u64,
    #[serde(flatten)]
    pub prices: PriceIds,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            confirm_endpoint: None,
            demo: false,
            timeout_secs: 10,
            prices: PriceIds::default(),
        }
    }
}

impl CheckoutConfig {
    pub fn gateway(&self) -> CheckoutGateway {
        if self.demo {
            return CheckoutGateway::Demo;
        }
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
        };
        let Some(url) = non_blank(&self.endpoint) else {
            return CheckoutGateway::Disabled;
        };
        let mut http = HttpCheckout::new(
            url,
            self.prices.clone(),
            std::time::Duration::from_secs(self.timeout_secs),
        );
        if let Some(confirm) = non_blank(&self.confirm_endpoint) {
            http = http.with_confirm_endpoint(confirm);
        }
        CheckoutGateway::Http(http)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub clamp_policy: ClampPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub flag_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            flag_path: PathBuf::from(".multistream-watch/flags.json"),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, DashboardError> {
        toml::from_str(text).map_err(|e| DashboardError::Config {
            path: origin.to_string(),
            detail: e.to_string(),
        })
    }

    /// Read `path` if given, falling back to defaults, then apply environment
    /// overrides. A path that is given but missing is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| DashboardError::io(p.display().to_string(), e))?;
                Self::from_toml(&text, &p.display().to_string())?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from `lookup`, which maps variable names to values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CHECKOUT_ENDPOINT) {
            self.checkout.endpoint = Some(v);
        }
        if let Some(v) = lookup(ENV_CHECKOUT_CONFIRM_ENDPOINT) {
            self.checkout.confirm_endpoint = Some(v);
        }
        if let Some(v) = lookup(ENV_PRICE_MONTHLY) {
            self.checkout.prices.monthly = v;
        }
        if let Some(v) = lookup(ENV_PRICE_QUARTERLY) {
            self.checkout.prices.quarterly = v;
        }
        if let Some(v) = lookup(ENV_PRICE_YEARLY) {
            self.checkout.prices.yearly = v;
        }
    }
}
