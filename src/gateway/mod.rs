pub mod client;
pub mod dto;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::GatewayError;
use crate::types::OrderStatus;

use self::dto::{Balances, Market, OrderPlacement, RawOrderBook, Ticker, VenueOrder};

/// Chain/network/connector triple routed to every gateway call.
#[derive(Clone, Debug, Serialize)]
pub struct VenueScope {
    pub chain: String,
    pub network: String,
    pub connector: String,
}

/// Request/response boundary to the venue. Stateless from the caller's
/// view; every call is atomic. The worker is generic over this trait so
/// tick logic runs against an in-memory venue in tests.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_market(&self, scope: &VenueScope, name: &str) -> Result<Market, GatewayError>;

    async fn get_order_book(
        &self,
        scope: &VenueScope,
        market_id: &str,
    ) -> Result<RawOrderBook, GatewayError>;

    async fn get_ticker(&self, scope: &VenueScope, market_id: &str)
        -> Result<Ticker, GatewayError>;

    async fn get_balances(
        &self,
        scope: &VenueScope,
        owner_address: &str,
        token_ids: &[String],
    ) -> Result<Balances, GatewayError>;

    async fn get_orders(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
        status: OrderStatus,
    ) -> Result<HashMap<String, VenueOrder>, GatewayError>;

    async fn post_orders(
        &self,
        scope: &VenueScope,
        orders: &[OrderPlacement],
    ) -> Result<HashMap<String, VenueOrder>, GatewayError>;

    async fn delete_orders(
        &self,
        scope: &VenueScope,
        ids: &[String],
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn delete_all_orders(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError>;

    async fn post_market_withdraw(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError>;
}
