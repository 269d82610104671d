use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{MiddlePriceStrategy, OrderType, PriceStrategy};

/// Worker configuration, loaded from a JSON file and validated once at
/// construction. Everything the tick loop consults lives here; nothing is
/// re-read after startup.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Worker id, composed into the log span.
    pub id: String,
    pub chain: String,
    pub network: String,
    pub connector: String,
    /// Owner address used in every order/balance call.
    pub wallet: String,
    /// Market name resolved against the venue at initialization.
    pub market: String,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    pub strategy: StrategyConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    /// Inter-tick delay in milliseconds; ticks align to a global grid.
    pub tick_interval: u64,
    #[serde(default)]
    pub run_only_once: bool,
    #[serde(default)]
    pub cancel_all_orders_on_start: bool,
    #[serde(default)]
    pub cancel_all_orders_on_stop: bool,
    #[serde(default)]
    pub withdraw_market_on_start: bool,
    #[serde(default)]
    pub withdraw_market_on_stop: bool,
    #[serde(default)]
    pub withdraw_market_on_tick: bool,
    #[serde(default)]
    pub price_strategy: PriceStrategy,
    /// Absent means: try VWAP, then WAP, then SAP, then the ticker.
    #[serde(default)]
    pub middle_price_strategy: Option<MiddlePriceStrategy>,
    #[serde(default)]
    pub kujira_order_type: OrderType,
    pub layers: Vec<Layer>,
}

/// One rung of the ladder: independent bid and ask legs.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    pub bid: LayerSide,
    pub ask: LayerSide,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSide {
    /// Number of identical orders emitted for this leg.
    pub quantity: u32,
    /// Distance from the reference price, in percent.
    pub spread_percentage: Decimal,
    /// Liquidity cap for the whole leg, in quote dollars.
    pub max_liquidity_in_dollars: Decimal,
}

fn default_gateway_url() -> String {
    "http://localhost:15888".into()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.is_empty() {
            return Err(ConfigError::Invalid("wallet must not be empty".into()));
        }
        if self.market.is_empty() {
            return Err(ConfigError::Invalid("market must not be empty".into()));
        }
        if self.strategy.tick_interval == 0 {
            return Err(ConfigError::Invalid(
                "strategy.tick_interval must be positive".into(),
            ));
        }
        if self.strategy.layers.is_empty() {
            return Err(ConfigError::Invalid(
                "strategy.layers must contain at least one layer".into(),
            ));
        }
        for (index, layer) in self.strategy.layers.iter().enumerate() {
            for (leg, side) in [("bid", &layer.bid), ("ask", &layer.ask)] {
                if side.spread_percentage.is_sign_negative() {
                    return Err(ConfigError::Invalid(format!(
                        "layer {} {leg}: spread_percentage must not be negative",
                        index + 1
                    )));
                }
                if side.max_liquidity_in_dollars.is_sign_negative() {
                    return Err(ConfigError::Invalid(format!(
                        "layer {} {leg}: max_liquidity_in_dollars must not be negative",
                        index + 1
                    )));
                }
            }
        }
        Ok(())
    }
}
