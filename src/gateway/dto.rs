//! Typed wire shapes for the gateway boundary. Decimal fields are parsed
//! once here and never re-parsed downstream.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderSide, OrderStatus, OrderType};

#[derive(Clone, Debug, Deserialize)]
pub struct Token {
    pub id: String,
    pub name: String,
    pub decimals: u32,
}

/// Market descriptor. Immutable after the initialization fetch.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub name: String,
    pub base_token: Token,
    pub quote_token: Token,
    pub minimum_price_increment: Decimal,
    pub minimum_order_size: Decimal,
}

/// Raw book as the venue returns it: levels keyed arbitrarily, unordered.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawOrderBook {
    #[serde(default)]
    pub bids: HashMap<String, RawBookLevel>,
    #[serde(default)]
    pub asks: HashMap<String, RawBookLevel>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawBookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ticker {
    pub price: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub free: Decimal,
    pub locked_in_orders: Decimal,
    pub unsettled: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Balances {
    pub total: TokenBalance,
    pub tokens: HashMap<String, TokenBalance>,
}

/// An order as the venue reports it. `client_id` is echoed back from
/// placement; `"0"` marks a manually created order.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueOrder {
    pub id: String,
    pub client_id: String,
    pub market_id: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
    pub status: OrderStatus,
}

/// Wire shape submitted to `post_orders`. Price and amount travel as
/// strings so the venue parses them at full precision.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacement {
    pub client_id: String,
    pub market_id: String,
    pub owner_address: String,
    pub side: OrderSide,
    pub price: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}
