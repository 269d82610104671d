//! The market-making worker: one task owning all state, quoting a single
//! market through the gateway on a grid-aligned tick.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::engine::proposal::{adjust_to_budget, build_proposal, ProposalContext};
use crate::engine::reconcile;
use crate::error::TickError;
use crate::gateway::dto::{Balances, Market, OrderPlacement, Ticker, VenueOrder};
use crate::gateway::{Gateway, VenueScope};
use crate::math::{book, midprice};
use crate::types::{CandidateOrder, OrderStatus, PriceStrategy, NATIVE_TOKEN_ID};

/// How often the loop re-checks the tick deadline while idle.
const POLL_INTERVAL_MS: u64 = 10;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Grid-aligned delay until the next tick: `interval − (now mod interval)`.
/// Always in `(0, interval]`, and `now + delay` lands on an interval boundary.
pub fn waiting_time_ms(interval_ms: u64, now_ms: u64) -> u64 {
    interval_ms - (now_ms % interval_ms)
}

pub struct Worker<G> {
    config: Config,
    scope: VenueScope,
    gateway: G,
    shutdown: watch::Receiver<bool>,

    market: Option<Market>,

    // Per-tick caches; the mandatory getters are forced at tick start.
    balances: Option<Balances>,
    ticker: Option<Ticker>,
    open_orders: Option<HashMap<String, VenueOrder>>,
    filled_orders: Option<HashMap<String, VenueOrder>>,

    // Ids from the most recent successful placement, and the cumulative
    // union since worker start. currently_tracked ⊆ tracked always holds.
    currently_tracked: Vec<String>,
    tracked: Vec<String>,

    can_run: bool,
    is_busy: bool,
    refresh_timestamp_ms: i64,
}

impl<G: Gateway> Worker<G> {
    pub fn new(config: Config, gateway: G, shutdown: watch::Receiver<bool>) -> Self {
        let scope = VenueScope {
            chain: config.chain.clone(),
            network: config.network.clone(),
            connector: config.connector.clone(),
        };
        Self {
            config,
            scope,
            gateway,
            shutdown,
            market: None,
            balances: None,
            ticker: None,
            open_orders: None,
            filled_orders: None,
            currently_tracked: Vec::new(),
            tracked: Vec::new(),
            can_run: true,
            is_busy: false,
            refresh_timestamp_ms: 0,
        }
    }

    /// Run the worker to completion: initialize, tick until told to stop,
    /// then run the stop hooks. Only configuration problems prevent the
    /// loop from starting; everything else is retried tick over tick.
    pub async fn run(mut self) {
        let span = info_span!("worker", id = %self.config.id);
        async move {
            if let Err(error) = self.initialize().await {
                error!(%error, "initialization failed, worker exiting");
                return;
            }
            self.run_loop().await;
            self.stop_hooks().await;
            info!("worker exited");
        }
        .instrument(span)
        .await
    }

    async fn initialize(&mut self) -> Result<(), TickError> {
        info!(market = %self.config.market, "initializing");

        let market = self
            .gateway
            .get_market(&self.scope, &self.config.market)
            .await?;
        info!(
            market_id = %market.id,
            base = %market.base_token.name,
            quote = %market.quote_token.name,
            "market resolved"
        );
        self.market = Some(market);

        if self.config.strategy.cancel_all_orders_on_start {
            if let Err(error) = self.cancel_all_orders().await {
                warn!(%error, "cancel-all on start failed");
            }
        }
        if self.config.strategy.withdraw_market_on_start {
            if let Err(error) = self.market_withdraw().await {
                warn!(%error, "market withdraw on start failed");
            }
        }

        let wait = waiting_time_ms(self.config.strategy.tick_interval, now_ms() as u64);
        self.refresh_timestamp_ms = now_ms() + wait as i64;
        debug!(wait_ms = wait, "first tick armed");
        Ok(())
    }

    async fn run_loop(&mut self) {
        let mut shutdown = self.shutdown.clone();

        while self.can_run {
            if *shutdown.borrow() {
                break;
            }
            if self.is_busy || now_ms() < self.refresh_timestamp_ms {
                tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
                continue;
            }

            self.is_busy = true;
            let cancelled = tokio::select! {
                result = self.on_tick() => {
                    match result {
                        Ok(()) => {}
                        Err(TickError::Gateway(error)) => {
                            info!(%error, "tick failed on gateway call, retrying next tick");
                        }
                        Err(error) => warn!(%error, "tick failed"),
                    }
                    false
                }
                Ok(_) = shutdown.wait_for(|stop| *stop) => true,
            };

            // The single finalizer: runs after success, failure, and
            // cancellation alike.
            let wait = waiting_time_ms(self.config.strategy.tick_interval, now_ms() as u64);
            self.refresh_timestamp_ms = now_ms() + wait as i64;
            self.is_busy = false;
            debug!(wait_ms = wait, "next tick armed");

            if cancelled {
                info!("in-flight tick cancelled by shutdown");
                break;
            }
            if self.config.strategy.run_only_once {
                info!("single-run tick complete, stopping");
                self.can_run = false;
            }
        }
    }

    async fn on_tick(&mut self) -> Result<(), TickError> {
        debug!("tick start");

        if self.config.strategy.withdraw_market_on_tick {
            if let Err(error) = self.market_withdraw().await {
                warn!(%error, "market withdraw on tick failed");
            }
        }

        // Mandatory refreshes: the rest of the tick reads these caches.
        let open_orders = self.get_open_orders(false).await?;
        self.get_filled_orders(false).await?;
        self.get_balances(false).await?;

        let open_ids: Vec<String> = open_orders.keys().cloned().collect();
        self.cancel_currently_untracked(&open_ids).await?;

        let proposed = self.create_proposal().await?;
        let candidates = self.adjust_proposal_to_budget(proposed).await?;
        self.replace_orders(&candidates).await?;
        self.cleanup_duplicated_orders().await?;

        debug!("tick end");
        Ok(())
    }

    async fn stop_hooks(&mut self) {
        if self.config.strategy.cancel_all_orders_on_stop {
            if let Err(error) = self.cancel_all_orders().await {
                warn!(%error, "cancel-all on stop failed");
            }
        }
        if self.config.strategy.withdraw_market_on_stop {
            if let Err(error) = self.market_withdraw().await {
                warn!(%error, "market withdraw on stop failed");
            }
        }
    }

    // ─── Proposal pipeline ───

    async fn create_proposal(&mut self) -> Result<Vec<CandidateOrder>, TickError> {
        let market_id = self.market()?.id.clone();
        let raw = self.gateway.get_order_book(&self.scope, &market_id).await?;
        let book = book::normalize(&raw);

        let strategy = self.config.strategy.price_strategy;
        let used_price = match strategy {
            PriceStrategy::Ticker => Some(self.ticker_price().await?),
            PriceStrategy::Middle => match self.config.strategy.middle_price_strategy {
                Some(middle) => Some(midprice::middle_price(&book.bids, &book.asks, middle)),
                None => match midprice::middle_price_chain(&book.bids, &book.asks) {
                    Some(price) => Some(price),
                    None => Some(self.ticker_price().await?),
                },
            },
            PriceStrategy::LastFill => self.last_filled_order_price().await?,
        };

        let used_price = match used_price {
            Some(price) if price > Decimal::ZERO => price,
            other => return Err(TickError::InvalidPrice { price: other }),
        };
        debug!(price = %used_price, ?strategy, "reference price selected");

        let market = self.market()?;
        let context = ProposalContext {
            market_id: &market.id,
            minimum_price_increment: market.minimum_price_increment,
            minimum_order_size: market.minimum_order_size,
            order_type: self.config.strategy.kujira_order_type,
            reference_price: used_price,
            book: &book,
            layers: &self.config.strategy.layers,
        };
        let proposal = build_proposal(&context);
        debug!(orders = proposal.len(), "proposal built");
        Ok(proposal)
    }

    async fn adjust_proposal_to_budget(
        &mut self,
        proposal: Vec<CandidateOrder>,
    ) -> Result<Vec<CandidateOrder>, TickError> {
        let (base_id, quote_id) = {
            let market = self.market()?;
            (market.base_token.id.clone(), market.quote_token.id.clone())
        };
        let balances = self.get_balances(true).await?;
        let free_of = |token_id: &str| {
            balances
                .tokens
                .get(token_id)
                .map(|balance| balance.free)
                .ok_or_else(|| TickError::MissingBalance {
                    token: token_id.to_string(),
                })
        };
        let free_base = free_of(&base_id)?;
        let free_quote = free_of(&quote_id)?;

        let candidates = adjust_to_budget(proposal, free_base, free_quote);
        debug!(admitted = candidates.len(), "proposal adjusted to budget");
        Ok(candidates)
    }

    // ─── Reconciliation ───

    async fn cancel_currently_untracked(&mut self, open_ids: &[String]) -> Result<(), TickError> {
        let stale = reconcile::currently_untracked(&self.tracked, open_ids, &self.currently_tracked);
        if stale.is_empty() {
            debug!("no stale orders to cancel");
            return Ok(());
        }

        let market_id = self.market()?.id.clone();
        info!(count = stale.len(), "cancelling stale orders");
        self.gateway
            .delete_orders(&self.scope, &stale, &market_id, &self.config.wallet)
            .await?;
        Ok(())
    }

    async fn replace_orders(&mut self, candidates: &[CandidateOrder]) -> Result<(), TickError> {
        if candidates.is_empty() {
            warn!("no orders to place this tick, keeping current tracking");
            return Ok(());
        }

        let placements: Vec<OrderPlacement> = candidates
            .iter()
            .map(|candidate| OrderPlacement {
                client_id: candidate.client_id.clone(),
                market_id: candidate.market_id.clone(),
                owner_address: self.config.wallet.clone(),
                side: candidate.side,
                price: candidate.price.to_string(),
                amount: candidate.amount.to_string(),
                order_type: candidate.order_type,
            })
            .collect();

        let response = self.gateway.post_orders(&self.scope, &placements).await?;
        self.currently_tracked = response.keys().cloned().collect();
        self.tracked.extend(self.currently_tracked.iter().cloned());
        info!(placed = response.len(), "orders placed");
        Ok(())
    }

    async fn cleanup_duplicated_orders(&mut self) -> Result<(), TickError> {
        let open_orders = self.get_open_orders(true).await?;
        let duplicated = reconcile::duplicated_order_ids(open_orders.values());
        if duplicated.is_empty() {
            return Ok(());
        }

        let market_id = self.market()?.id.clone();
        info!(count = duplicated.len(), "cancelling duplicated orders");
        self.gateway
            .delete_orders(&self.scope, &duplicated, &market_id, &self.config.wallet)
            .await?;
        Ok(())
    }

    // ─── Lifecycle helpers ───

    async fn cancel_all_orders(&mut self) -> Result<(), TickError> {
        let market_id = self.market()?.id.clone();
        info!("cancelling all orders");
        self.gateway
            .delete_all_orders(&self.scope, &market_id, &self.config.wallet)
            .await?;
        Ok(())
    }

    async fn market_withdraw(&mut self) -> Result<(), TickError> {
        let market_id = self.market()?.id.clone();
        info!("withdrawing market balances");
        self.gateway
            .post_market_withdraw(&self.scope, &market_id, &self.config.wallet)
            .await?;
        Ok(())
    }

    // ─── Prices ───

    async fn ticker_price(&mut self) -> Result<Decimal, TickError> {
        Ok(self.get_ticker(false).await?.price)
    }

    /// Price of the most recent filled order (largest venue id), if any.
    async fn last_filled_order_price(&mut self) -> Result<Option<Decimal>, TickError> {
        let filled = self.get_filled_orders(true).await?;
        Ok(filled
            .values()
            .max_by(|a, b| a.id.cmp(&b.id))
            .map(|order| order.price))
    }

    // ─── Cached getters ───

    fn market(&self) -> Result<&Market, TickError> {
        self.market.as_ref().ok_or(TickError::NotInitialized)
    }

    async fn get_balances(&mut self, use_cache: bool) -> Result<Balances, TickError> {
        if use_cache {
            if let Some(balances) = &self.balances {
                return Ok(balances.clone());
            }
        }
        let (base_id, quote_id) = {
            let market = self.market()?;
            (market.base_token.id.clone(), market.quote_token.id.clone())
        };
        let token_ids = vec![NATIVE_TOKEN_ID.to_string(), base_id, quote_id];
        let balances = self
            .gateway
            .get_balances(&self.scope, &self.config.wallet, &token_ids)
            .await?;
        self.balances = Some(balances.clone());
        Ok(balances)
    }

    async fn get_ticker(&mut self, use_cache: bool) -> Result<Ticker, TickError> {
        if use_cache {
            if let Some(ticker) = &self.ticker {
                return Ok(ticker.clone());
            }
        }
        let market_id = self.market()?.id.clone();
        let ticker = self.gateway.get_ticker(&self.scope, &market_id).await?;
        self.ticker = Some(ticker.clone());
        Ok(ticker)
    }

    async fn get_open_orders(
        &mut self,
        use_cache: bool,
    ) -> Result<HashMap<String, VenueOrder>, TickError> {
        if use_cache {
            if let Some(orders) = &self.open_orders {
                return Ok(orders.clone());
            }
        }
        let market_id = self.market()?.id.clone();
        let orders = self
            .gateway
            .get_orders(&self.scope, &market_id, &self.config.wallet, OrderStatus::Open)
            .await?;
        self.open_orders = Some(orders.clone());
        Ok(orders)
    }

    async fn get_filled_orders(
        &mut self,
        use_cache: bool,
    ) -> Result<HashMap<String, VenueOrder>, TickError> {
        if use_cache {
            if let Some(orders) = &self.filled_orders {
                return Ok(orders.clone());
            }
        }
        let market_id = self.market()?.id.clone();
        let orders = self
            .gateway
            .get_orders(
                &self.scope,
                &market_id,
                &self.config.wallet,
                OrderStatus::Filled,
            )
            .await?;
        self.filled_orders = Some(orders.clone());
        Ok(orders)
    }
}
