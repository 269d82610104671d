//! Midpoint reference-price computations over a normalized book.
//!
//! SAP and WAP stay in decimal arithmetic end to end. VWAP's percentile
//! and cumulative-sum internals run on f64; only the final result is
//! converted back to a decimal.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::types::{BookLevel, MiddlePriceStrategy, VWAP_THRESHOLD};

/// Simple average of best bid and best ask. A missing side counts as zero,
/// so an empty book yields zero and the caller's invalid-price check trips.
pub fn simple_average_price(bids: &[BookLevel], asks: &[BookLevel]) -> Decimal {
    let best_bid = bids.first().map(|l| l.price).unwrap_or(Decimal::ZERO);
    let best_ask = asks.first().map(|l| l.price).unwrap_or(Decimal::ZERO);
    (best_bid + best_ask) / Decimal::TWO
}

/// Best-level weighted average: `(askP·askV + bidP·bidV) / (askV + bidV)`,
/// or zero when the combined best volume is zero.
pub fn weighted_average_price(bids: &[BookLevel], asks: &[BookLevel]) -> Decimal {
    let (bid_price, bid_amount) = bids
        .first()
        .map(|l| (l.price, l.amount))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));
    let (ask_price, ask_amount) = asks
        .first()
        .map(|l| (l.price, l.amount))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    let volume = bid_amount + ask_amount;
    if volume.is_zero() {
        return Decimal::ZERO;
    }
    (ask_price * ask_amount + bid_price * bid_amount) / volume
}

/// Volume-weighted average over the trimmed, outlier-filtered book.
///
/// Each side is cut to its top `VWAP_THRESHOLD` percent of levels
/// (ceiling), asks above `1.5·Q75` and bids below `0.5·Q25` are dropped,
/// and the running `Σ(amount·price) / Σ(amount)` over the concatenation
/// collapses to its final element.
pub fn volume_weighted_average_price(bids: &[BookLevel], asks: &[BookLevel]) -> Decimal {
    let bids = trim_to_threshold(bids);
    let asks = trim_to_threshold(asks);

    let bids = remove_bid_outliers(bids);
    let asks = remove_ask_outliers(asks);

    let mut sum_amount_price = 0.0_f64;
    let mut sum_amount = 0.0_f64;
    for level in bids.iter().chain(asks.iter()) {
        let price = level.price.to_f64().unwrap_or(0.0);
        let amount = level.amount.to_f64().unwrap_or(0.0);
        sum_amount_price += amount * price;
        sum_amount += amount;
    }

    if sum_amount > 0.0 {
        Decimal::from_f64(sum_amount_price / sum_amount).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

pub fn middle_price(
    bids: &[BookLevel],
    asks: &[BookLevel],
    strategy: MiddlePriceStrategy,
) -> Decimal {
    match strategy {
        MiddlePriceStrategy::Sap => simple_average_price(bids, asks),
        MiddlePriceStrategy::Wap => weighted_average_price(bids, asks),
        MiddlePriceStrategy::Vwap => volume_weighted_average_price(bids, asks),
    }
}

/// Fallback chain for when no explicit midpoint strategy is configured:
/// first positive result of VWAP, WAP, SAP wins. `None` sends the caller
/// to the ticker.
pub fn middle_price_chain(bids: &[BookLevel], asks: &[BookLevel]) -> Option<Decimal> {
    [
        MiddlePriceStrategy::Vwap,
        MiddlePriceStrategy::Wap,
        MiddlePriceStrategy::Sap,
    ]
    .into_iter()
    .map(|strategy| middle_price(bids, asks, strategy))
    .find(|price| *price > Decimal::ZERO)
}

/// Keep the top `VWAP_THRESHOLD` percent of a side's levels (ceiling).
fn trim_to_threshold(side: &[BookLevel]) -> &[BookLevel] {
    let keep = ((VWAP_THRESHOLD / 100.0) * side.len() as f64).ceil() as usize;
    &side[..keep.min(side.len())]
}

/// Drop asks priced at or above `1.5·Q75` of the side's prices.
fn remove_ask_outliers(levels: &[BookLevel]) -> Vec<BookLevel> {
    if levels.is_empty() {
        return Vec::new();
    }
    let cutoff = 1.5 * percentile(&prices_of(levels), 75.0);
    levels
        .iter()
        .copied()
        .filter(|l| l.price.to_f64().unwrap_or(f64::INFINITY) < cutoff)
        .collect()
}

/// Drop bids priced at or below `0.5·Q25` of the side's prices.
fn remove_bid_outliers(levels: &[BookLevel]) -> Vec<BookLevel> {
    if levels.is_empty() {
        return Vec::new();
    }
    let cutoff = 0.5 * percentile(&prices_of(levels), 25.0);
    levels
        .iter()
        .copied()
        .filter(|l| l.price.to_f64().unwrap_or(0.0) > cutoff)
        .collect()
}

fn prices_of(levels: &[BookLevel]) -> Vec<f64> {
    levels
        .iter()
        .map(|l| l.price.to_f64().unwrap_or(0.0))
        .collect()
}

/// Linearly interpolated percentile over a non-empty sample.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
