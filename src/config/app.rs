//! Application configuration.
//!
//! Settings come from a TOML file (default `./config.toml`, overridable with
//! `STOREFRONT_CONFIG`) and are then overridden by environment variables. Every
//! field has a default so the service also boots without a config file.

use crate::config::catalog::ProductSeed;
use crate::errors::{Error, Result};
use axum::http::HeaderName;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Root of config.toml
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub payments: PaymentsConfig,
    /// Catalog products to seed when missing
    pub products: Vec<ProductSeed>,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Public storefront URL used to build redirect targets
    pub public_base_url: String,
    /// Header carrying the authenticated user id set by the identity proxy
    pub identity_header: String,
    /// External ids allowed to use the admin endpoints
    pub admin_user_ids: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            identity_header: "x-user-id".to_string(),
            admin_user_ids: Vec::new(),
        }
    }
}

/// Pricing and payment gateway settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Tax rate applied on top of the item subtotal (IVA)
    pub tax_rate: f64,
    pub currency: String,
    /// Country code sent to the gateway widget
    pub country: String,
    /// Shipping country recorded on balance orders
    pub shipping_country: String,
    pub lang: String,
    /// Merchant name shown in the checkout widget
    pub merchant_name: String,
    pub epayco_public_key: String,
    pub epayco_test: bool,
    /// Whether the widget opens the gateway's standalone page
    pub epayco_external: bool,
    /// Path the gateway redirects the browser to, relative to the base URL
    pub response_path: String,
    /// Path the gateway posts confirmations to, relative to the base URL
    pub confirmation_path: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.19,
            currency: "COP".to_string(),
            country: "CO".to_string(),
            shipping_country: "Colombia".to_string(),
            lang: "es".to_string(),
            merchant_name: "Tienda".to_string(),
            epayco_public_key: String::new(),
            epayco_test: true,
            epayco_external: false,
            response_path: "/api/epayco/response".to_string(),
            confirmation_path: "/api/epayco/confirmation".to_string(),
        }
    }
}

impl ServerConfig {
    /// The identity header as a typed header name.
    ///
    /// Falls back to `x-user-id` if the configured name is not a valid header;
    /// [`AppConfig::from_toml_str`] rejects such names up front.
    #[must_use]
    pub fn identity_header_name(&self) -> HeaderName {
        HeaderName::from_bytes(self.identity_header.trim().as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static("x-user-id"))
    }
}

impl AppConfig {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or values are out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides using `lookup` to resolve variable names.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup("PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }
        if let Some(key) = lookup("EPAYCO_PUBLIC_KEY") {
            self.payments.epayco_public_key = key;
        }
        if let Some(test) = lookup("EPAYCO_TEST") {
            self.payments.epayco_test = matches!(test.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(ids) = lookup("ADMIN_USER_IDS") {
            for id in crate::config::users::parse_admin_ids(&ids) {
                if !self.server.admin_user_ids.contains(&id) {
                    self.server.admin_user_ids.push(id);
                }
            }
        }
    }

    /// Returns true if `clerk_id` may use admin endpoints.
    #[must_use]
    pub fn is_admin(&self, clerk_id: &str) -> bool {
        self.server.admin_user_ids.iter().any(|id| id == clerk_id)
    }

    /// Joins `path` onto the public base URL.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server.public_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn validate(&self) -> Result<()> {
        let rate = self.payments.tax_rate;
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(Error::Config {
                message: format!("tax_rate must be in [0, 1), got {rate}"),
            });
        }
        if HeaderName::from_bytes(self.server.identity_header.trim().as_bytes()).is_err() {
            return Err(Error::Config {
                message: format!(
                    "identity_header is not a valid header name: {:?}",
                    self.server.identity_header
                ),
            });
        }
        for path in [&self.payments.response_path, &self.payments.confirmation_path] {
            if !path.starts_with('/') {
                return Err(Error::Config {
                    message: format!("callback paths must start with '/', got {path:?}"),
                });
            }
        }
        Ok(())
    }
}

/// Loads configuration from `path`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        warn!("Config file {:?} not found, using defaults", path_ref);
        return Ok(AppConfig::default());
    }
    debug!("Loading configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    AppConfig::from_toml_str(&contents)
}

/// Loads the full application configuration: file first, then environment.
///
/// # Errors
/// Returns an error if the config file is unreadable or invalid.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("STOREFRONT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = load_config(&path)?;
    config.apply_overrides(|name| std::env::var(name).ok());
    info!(
        bind = %config.server.bind_address,
        products = config.products.len(),
        admins = config.server.admin_user_ids.len(),
        "Configuration loaded"
    );
    Ok(config)
}
