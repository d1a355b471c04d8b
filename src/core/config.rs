use crate::core::conversion::Converter;
use crate::core::currency::Currency;
use crate::core::error::{ConversionError, QuoteResult};
use crate::core::fees::FeePolicy;
use crate::providers::binance::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BinanceProviderConfig {
    pub base_url: String,
    /// Use the last traded price for both legs instead of bid/ask.
    #[serde(default)]
    pub price_only: bool,
}

impl Default for BinanceProviderConfig {
    fn default() -> Self {
        BinanceProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            price_only: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub binance: BinanceProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FixedRateConfig {
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_rate: Decimal,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    30
}

fn default_from() -> Currency {
    Currency::new("BRL").expect("valid currency literal")
}

fn default_to() -> Currency {
    Currency::new("BOB").expect("valid currency literal")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub fees: FeePolicy,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub fixed_rates: BTreeMap<Currency, FixedRateConfig>,
    /// Rates older than this are refused. Absent means no staleness check.
    #[serde(default)]
    pub max_rate_age_secs: Option<u64>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_from")]
    pub default_from: Currency,
    #[serde(default = "default_to")]
    pub default_to: Currency,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            fees: FeePolicy::default(),
            providers: ProvidersConfig::default(),
            fixed_rates: BTreeMap::new(),
            max_rate_age_secs: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            default_from: default_from(),
            default_to: default_to(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "bridgefx", "bridgefx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .converter()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn converter(&self) -> QuoteResult<Converter> {
        let converter = Converter::new(self.fees);
        let Some(secs) = self.max_rate_age_secs else {
            return Ok(converter);
        };
        let max_age = i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                ConversionError::InvalidConfiguration(format!(
                    "max_rate_age_secs is out of range, got {secs}"
                ))
            })?;
        Ok(converter.with_max_rate_age(max_age))
    }
}
