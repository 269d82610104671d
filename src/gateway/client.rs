use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::GatewayError;
use crate::types::OrderStatus;

use super::dto::{Balances, Market, OrderPlacement, RawOrderBook, Ticker, VenueOrder};
use super::{Gateway, VenueScope};

/// Gateway implementation over the venue's HTTP middleware. Every
/// operation is a POST with a JSON body; routes are named after the
/// operation they perform.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        route: &'static str,
        body: serde_json::Value,
    ) -> Result<T, GatewayError> {
        debug!(route, request = %body, "gateway request");

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, route))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                route,
                status,
                body: text,
            });
        }

        debug!(route, response = %text, "gateway response");

        serde_json::from_str(&text).map_err(|source| GatewayError::Decode { route, source })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_market(&self, scope: &VenueScope, name: &str) -> Result<Market, GatewayError> {
        self.post(
            "kujira/market",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "name": name,
            }),
        )
        .await
    }

    async fn get_order_book(
        &self,
        scope: &VenueScope,
        market_id: &str,
    ) -> Result<RawOrderBook, GatewayError> {
        self.post(
            "kujira/orderBook",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "marketId": market_id,
            }),
        )
        .await
    }

    async fn get_ticker(
        &self,
        scope: &VenueScope,
        market_id: &str,
    ) -> Result<Ticker, GatewayError> {
        self.post(
            "kujira/ticker",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "marketId": market_id,
            }),
        )
        .await
    }

    async fn get_balances(
        &self,
        scope: &VenueScope,
        owner_address: &str,
        token_ids: &[String],
    ) -> Result<Balances, GatewayError> {
        self.post(
            "kujira/balances",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "ownerAddress": owner_address,
                "tokenIds": token_ids,
            }),
        )
        .await
    }

    async fn get_orders(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
        status: OrderStatus,
    ) -> Result<HashMap<String, VenueOrder>, GatewayError> {
        self.post(
            "kujira/orders/fetch",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "marketId": market_id,
                "ownerAddress": owner_address,
                "status": status,
            }),
        )
        .await
    }

    async fn post_orders(
        &self,
        scope: &VenueScope,
        orders: &[OrderPlacement],
    ) -> Result<HashMap<String, VenueOrder>, GatewayError> {
        self.post(
            "kujira/orders/place",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "orders": orders,
            }),
        )
        .await
    }

    async fn delete_orders(
        &self,
        scope: &VenueScope,
        ids: &[String],
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        self.post(
            "kujira/orders/cancel",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "ids": ids,
                "marketId": market_id,
                "ownerAddress": owner_address,
            }),
        )
        .await
    }

    async fn delete_all_orders(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        self.post(
            "kujira/orders/cancelAll",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "marketId": market_id,
                "ownerAddress": owner_address,
            }),
        )
        .await
    }

    async fn post_market_withdraw(
        &self,
        scope: &VenueScope,
        market_id: &str,
        owner_address: &str,
    ) -> Result<serde_json::Value, GatewayError> {
        self.post(
            "kujira/market/withdraw",
            json!({
                "chain": scope.chain,
                "network": scope.network,
                "connector": scope.connector,
                "marketId": market_id,
                "ownerAddress": owner_address,
            }),
        )
        .await
    }
}
