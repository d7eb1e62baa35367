use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Hosted-checkout processor; absent means demo mode (subscriptions
    /// are created synchronously without payment).
    #[serde(default)]
    pub checkout: Option<CheckoutConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub database_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            database_path: "data/membership.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub secret_key: String,
    pub success_url: String,
    pub cancel_url: String,
    pub price_refs: PriceRefs,
}

/// Processor-side price identifiers, one per plan tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRefs {
    pub basic: String,
    pub premium: String,
    pub elite: String,
}

impl PriceRefs {
    pub fn for_plan(&self, plan: crate::plans::Plan) -> &str {
        use crate::plans::Plan;
        match plan {
            Plan::Basic => &self.basic,
            Plan::Premium => &self.premium,
            Plan::Elite => &self.elite,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::find_config_file()?;
        let config_content = std::fs::read_to_string(&config_path)?;
        let settings: Settings = toml::from_str(&config_content)?;
        Ok(settings)
    }

    fn find_config_file() -> Result<String, Box<dyn std::error::Error>> {
        let possible_names = ["custom-config.toml", "config.toml"];

        for name in &possible_names {
            if Path::new(name).exists() {
                return Ok(name.to_string());
            }
        }

        Err("Configuration file not found. Please create custom-config.toml or config.toml".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_without_checkout() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [logging]
            database_path = "data/test.db"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 9000);
        assert!(settings.checkout.is_none());
    }

    #[test]
    fn parses_checkout_section() {
        let settings: Settings = toml::from_str(
            r#"
            [checkout]
            secret_key = "sk_test_123"
            success_url = "https://example.com/success.html?session_id={CHECKOUT_SESSION_ID}"
            cancel_url = "https://example.com/?cancelled=true"

            [checkout.price_refs]
            basic = "price_basic"
            premium = "price_premium"
            elite = "price_elite"
            "#,
        )
        .unwrap();
        let checkout = settings.checkout.unwrap();
        assert_eq!(checkout.price_refs.elite, "price_elite");
        assert_eq!(settings.server.port, 8000);
    }
}
