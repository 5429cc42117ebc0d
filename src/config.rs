//! Configuration management

use anyhow::Result;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

use crate::dashboard::FetchPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    #[serde(default)]
    pub tls_cert: String,
    #[serde(default)]
    pub tls_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub driver: String,
    /// SQLite file path, or `:memory:`
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Insert the demo data set when the CDR table is empty
    #[serde(default)]
    pub seed_demo: bool,
}

fn default_max_connections() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub title: String,
    pub subtitle: String,
    /// Sidebar logo, read once at startup
    pub logo: String,
    #[serde(default)]
    pub fetch_policy: FetchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("FRAUD").separator("__"));

        Self::build(builder)
    }

    /// Apply defaults underneath the given sources, deserialize and validate
    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.http_port", 8501)?
            .set_default("warehouse.driver", "sqlite")?
            .set_default("warehouse.url", "fraud_data.db")?
            .set_default("dashboard.title", "Fraud Detection Analytics")?
            .set_default(
                "dashboard.subtitle",
                "Demo Dashboards powered by Snowflake using Streamlit",
            )?
            .set_default("dashboard.logo", "logo.png")?
            .set_default("logging.level", "info")?
            .build()?;
        let config: Config = settings.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.http_port == 0 {
            anyhow::bail!("Invalid http_port: 0 is not allowed");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        if self.warehouse.url.is_empty() {
            anyhow::bail!("Warehouse URL cannot be empty");
        }
        if self.warehouse.driver != "sqlite" {
            anyhow::bail!("Invalid warehouse driver '{}'. Must be 'sqlite'", self.warehouse.driver);
        }
        if self.warehouse.max_connections == 0 {
            anyhow::bail!("Warehouse max_connections must be at least 1");
        }

        // Both or neither
        let has_cert = !self.server.tls_cert.is_empty();
        let has_key = !self.server.tls_key.is_empty();
        if has_cert != has_key {
            anyhow::bail!("TLS configuration incomplete: both tls_cert and tls_key must be set, or neither");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid logging level '{}'. Must be one of: {:?}", self.logging.level, valid_levels);
        }

        Ok(())
    }

    pub fn tls_enabled(&self) -> bool {
        !self.server.tls_cert.is_empty() && !self.server.tls_key.is_empty()
    }
}
