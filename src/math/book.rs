use crate::gateway::dto::RawOrderBook;
use crate::types::{BookLevel, OrderBook};

/// Project a raw venue book onto sorted `{price, amount}` sequences:
/// bids descending, asks ascending. Pure; the snapshot is never mutated
/// after this point.
pub fn normalize(raw: &RawOrderBook) -> OrderBook {
    let mut bids: Vec<BookLevel> = raw
        .bids
        .values()
        .map(|level| BookLevel {
            price: level.price,
            amount: level.amount,
        })
        .collect();
    let mut asks: Vec<BookLevel> = raw
        .asks
        .values()
        .map(|level| BookLevel {
            price: level.price,
            amount: level.amount,
        })
        .collect();

    bids.sort_by(|a, b| b.price.cmp(&a.price));
    asks.sort_by(|a, b| a.price.cmp(&b.price));

    OrderBook { bids, asks }
}
