use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Constants ───

/// Percentage of each book side (top of book first) kept by the VWAP midpoint.
pub const VWAP_THRESHOLD: f64 = 30.0;

/// Native chain token, included in every balance request alongside base/quote.
pub const NATIVE_TOKEN_ID: &str = "ukuji";

/// Client id the venue assigns to manually created orders. Never touched.
pub const MANUAL_CLIENT_ID: &str = "0";

// ─── Domain enums ───

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

/// How the per-tick reference price is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceStrategy {
    #[default]
    Ticker,
    Middle,
    LastFill,
}

/// Midpoint computation used when [`PriceStrategy::Middle`] is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MiddlePriceStrategy {
    Sap,
    Wap,
    Vwap,
}

// ─── Book & orders ───

/// One price level of a normalized order book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Point-in-time order book: bids sorted descending, asks ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

/// A not-yet-placed limit order produced by the proposal builder.
///
/// `client_id` is a small counter rendered as a string, unique within one
/// proposal batch only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateOrder {
    pub client_id: String,
    pub market_id: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Decimal,
    pub amount: Decimal,
}
