//! Proposal construction: the symmetric per-layer ladder and the budget
//! filter that prunes it to what free balances afford. Both are pure
//! functions of their inputs; the worker supplies venue state.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::{Layer, LayerSide};
use crate::types::{CandidateOrder, OrderBook, OrderSide, OrderType};

pub struct ProposalContext<'a> {
    pub market_id: &'a str,
    pub minimum_price_increment: Decimal,
    pub minimum_order_size: Decimal,
    pub order_type: OrderType,
    pub reference_price: Decimal,
    pub book: &'a OrderBook,
    pub layers: &'a [Layer],
}

/// Build the ladder around the reference price.
///
/// Bid prices anchor on `min(reference, bestAsk)` and ask prices on
/// `max(reference, bestBid)`, so a drifted reference never crosses the
/// book. A layer side that fails a viability gate (price below the
/// minimum increment, size below the minimum order size) is skipped
/// whole. Client ids count up from 1, bids from all layers first.
pub fn build_proposal(ctx: &ProposalContext) -> Vec<CandidateOrder> {
    let mut client_id = 1u32;
    let mut orders = Vec::new();

    for (index, layer) in ctx.layers.iter().enumerate() {
        let anchor = match ctx.book.best_ask() {
            Some(best_ask) => ctx.reference_price.min(best_ask.price),
            None => ctx.reference_price,
        };
        let price = (Decimal::ONE_HUNDRED - layer.bid.spread_percentage) / Decimal::ONE_HUNDRED
            * anchor;
        emit_layer_side(
            ctx,
            index + 1,
            OrderSide::Buy,
            price,
            &layer.bid,
            &mut client_id,
            &mut orders,
        );
    }

    for (index, layer) in ctx.layers.iter().enumerate() {
        let anchor = match ctx.book.best_bid() {
            Some(best_bid) => ctx.reference_price.max(best_bid.price),
            None => ctx.reference_price,
        };
        let price = (Decimal::ONE_HUNDRED + layer.ask.spread_percentage) / Decimal::ONE_HUNDRED
            * anchor;
        emit_layer_side(
            ctx,
            index + 1,
            OrderSide::Sell,
            price,
            &layer.ask,
            &mut client_id,
            &mut orders,
        );
    }

    orders
}

fn emit_layer_side(
    ctx: &ProposalContext,
    layer_no: usize,
    side: OrderSide,
    price: Decimal,
    leg: &LayerSide,
    client_id: &mut u32,
    orders: &mut Vec<CandidateOrder>,
) {
    let size = if leg.quantity > 0 {
        leg.max_liquidity_in_dollars
            .checked_div(price)
            .and_then(|per_dollar| per_dollar.checked_div(Decimal::from(leg.quantity)))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    if price < ctx.minimum_price_increment {
        warn!(
            layer = layer_no,
            %side,
            %price,
            "skipping layer side, price below minimum increment"
        );
        return;
    }
    if size < ctx.minimum_order_size {
        warn!(
            layer = layer_no,
            %side,
            %size,
            "skipping layer side, size below minimum order size"
        );
        return;
    }

    for _ in 0..leg.quantity {
        orders.push(CandidateOrder {
            client_id: client_id.to_string(),
            market_id: ctx.market_id.to_string(),
            side,
            order_type: ctx.order_type,
            price,
            amount: size,
        });
        *client_id += 1;
    }
}

/// Walk the proposal in order, admitting each order only while the free
/// balance of its spending side holds out. BUY admission debits the quote
/// balance by the order's base amount; SELL debits the base balance.
/// Output is an order-preserving subset of the input.
pub fn adjust_to_budget(
    proposal: Vec<CandidateOrder>,
    free_base: Decimal,
    free_quote: Decimal,
) -> Vec<CandidateOrder> {
    let mut base = free_base;
    let mut quote = free_quote;
    let mut admitted = Vec::with_capacity(proposal.len());

    for order in proposal {
        match order.side {
            OrderSide::Buy => {
                if quote > order.amount {
                    quote -= order.amount;
                    admitted.push(order);
                }
            }
            OrderSide::Sell => {
                if base > order.amount {
                    base -= order.amount;
                    admitted.push(order);
                }
            }
        }
    }

    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerSide;
    use crate::types::BookLevel;
    use rust_decimal_macros::dec;

    fn layer(
        bid: (u32, Decimal, Decimal),
        ask: (u32, Decimal, Decimal),
    ) -> Layer {
        let leg = |(quantity, spread_percentage, max_liquidity_in_dollars): (
            u32,
            Decimal,
            Decimal,
        )| LayerSide {
            quantity,
            spread_percentage,
            max_liquidity_in_dollars,
        };
        Layer {
            bid: leg(bid),
            ask: leg(ask),
        }
    }

    fn book(bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) -> OrderBook {
        let to_levels = |pairs: &[(Decimal, Decimal)]| {
            pairs
                .iter()
                .map(|&(price, amount)| BookLevel { price, amount })
                .collect()
        };
        OrderBook {
            bids: to_levels(bids),
            asks: to_levels(asks),
        }
    }

    fn ctx<'a>(book: &'a OrderBook, layers: &'a [Layer], reference: Decimal) -> ProposalContext<'a> {
        ProposalContext {
            market_id: "kujira1market",
            minimum_price_increment: dec!(0.001),
            minimum_order_size: dec!(0.1),
            order_type: OrderType::Limit,
            reference_price: reference,
            book,
            layers,
        }
    }

    fn candidate(client_id: &str, side: OrderSide, amount: Decimal, price: Decimal) -> CandidateOrder {
        CandidateOrder {
            client_id: client_id.into(),
            market_id: "kujira1market".into(),
            side,
            order_type: OrderType::Limit,
            price,
            amount,
        }
    }

    /// Scenario: Book bids=[{10,1}], asks=[{12,1}], reference 11 (SAP), one
    /// layer with qty 1, 10% spread, $100 liquidity per side.
    /// Expected: Bid at 0.90·min(11,12)=9.9 sized 100/9.9, ask at
    /// 1.10·max(11,10)=12.1 sized 100/12.1, in bid-then-ask order.
    #[test]
    fn test_single_layer_two_sides() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((1, dec!(10), dec!(100)), (1, dec!(10), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(11)));

        assert_eq!(proposal.len(), 2);
        assert_eq!(proposal[0].side, OrderSide::Buy);
        assert_eq!(proposal[0].price, dec!(9.9));
        assert_eq!(proposal[0].amount, dec!(100) / dec!(9.9));
        assert_eq!(proposal[1].side, OrderSide::Sell);
        assert_eq!(proposal[1].price, dec!(12.1));
        assert_eq!(proposal[1].amount, dec!(100) / dec!(12.1));
    }

    /// Scenario: Two layers, each emitting two bids and two asks.
    /// Expected: Client ids run 1..8, all bids before all asks, layers in
    /// declared order on each side.
    #[test]
    fn test_client_ids_bids_before_asks() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [
            layer((2, dec!(1), dec!(100)), (2, dec!(1), dec!(100))),
            layer((2, dec!(2), dec!(100)), (2, dec!(2), dec!(100))),
        ];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(11)));

        let ids: Vec<&str> = proposal.iter().map(|o| o.client_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
        assert!(proposal[..4].iter().all(|o| o.side == OrderSide::Buy));
        assert!(proposal[4..].iter().all(|o| o.side == OrderSide::Sell));
        // Second bid layer is wider than the first.
        assert!(proposal[2].price < proposal[0].price);
    }

    /// Scenario: Reference price 15 drifted above the best ask of 12; zero
    /// spread so the clamp is directly observable.
    /// Expected: The bid anchors on the best ask, never crossing the book;
    /// the ask anchors on the reference.
    #[test]
    fn test_bid_clamped_to_best_ask() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((1, dec!(0), dec!(100)), (1, dec!(0), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(15)));

        assert_eq!(proposal[0].price, dec!(12));
        assert!(proposal[0].price <= book.best_ask().unwrap().price);
        assert_eq!(proposal[1].price, dec!(15));
    }

    /// Scenario: Reference price 8 drifted below the best bid of 10.
    /// Expected: The ask anchors on the best bid so it stays at or above it.
    #[test]
    fn test_ask_clamped_to_best_bid() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((1, dec!(0), dec!(100)), (1, dec!(0), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(8)));

        assert_eq!(proposal[0].price, dec!(8));
        assert_eq!(proposal[1].price, dec!(10));
        assert!(proposal[1].price >= book.best_bid().unwrap().price);
    }

    /// Scenario: Empty book on both sides, reference 11.
    /// Expected: No clamping anchors exist, so both sides price straight off
    /// the reference.
    #[test]
    fn test_empty_book_uses_reference() {
        let book = OrderBook::default();
        let layers = [layer((1, dec!(10), dec!(100)), (1, dec!(10), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(11)));

        assert_eq!(proposal[0].price, dec!(9.9));
        assert_eq!(proposal[1].price, dec!(12.1));
    }

    /// Scenario: Minimum price increment of 10 sits above the computed bid
    /// price of 9.9 but below the ask price of 12.1.
    /// Expected: The whole bid side of the layer is skipped; the ask survives.
    #[test]
    fn test_price_gate_skips_layer_side() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((2, dec!(10), dec!(100)), (1, dec!(10), dec!(100)))];
        let mut ctx = ctx(&book, &layers, dec!(11));
        ctx.minimum_price_increment = dec!(10);
        let proposal = build_proposal(&ctx);

        assert_eq!(proposal.len(), 1);
        assert_eq!(proposal[0].side, OrderSide::Sell);
        // Skipped legs consume no ids: the surviving ask opens the batch.
        assert_eq!(proposal[0].client_id, "1");
    }

    /// Scenario: Layer liquidity so small the per-order size lands below the
    /// minimum order size.
    /// Expected: That side is skipped entirely.
    #[test]
    fn test_size_gate_skips_layer_side() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((1, dec!(10), dec!(0.5)), (1, dec!(10), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(11)));

        assert_eq!(proposal.len(), 1);
        assert_eq!(proposal[0].side, OrderSide::Sell);
    }

    /// Scenario: A layer leg with quantity 0.
    /// Expected: Size degenerates to zero, the size gate trips, nothing is
    /// emitted for that side and no division by zero occurs.
    #[test]
    fn test_zero_quantity_emits_nothing() {
        let book = book(&[(dec!(10), dec!(1))], &[(dec!(12), dec!(1))]);
        let layers = [layer((0, dec!(10), dec!(100)), (1, dec!(10), dec!(100)))];
        let proposal = build_proposal(&ctx(&book, &layers, dec!(11)));

        assert_eq!(proposal.len(), 1);
        assert_eq!(proposal[0].side, OrderSide::Sell);
    }

    /// Scenario: Proposal [BUY 5@9, BUY 5@8, SELL 3@12] against free quote 7
    /// and free base 4.
    /// Expected: First BUY admitted (5 < 7), second dropped (5 > remaining 2),
    /// SELL admitted (3 < 4) — [BUY 5@9, SELL 3@12].
    #[test]
    fn test_budget_scenario() {
        let proposal = vec![
            candidate("1", OrderSide::Buy, dec!(5), dec!(9)),
            candidate("2", OrderSide::Buy, dec!(5), dec!(8)),
            candidate("3", OrderSide::Sell, dec!(3), dec!(12)),
        ];
        let admitted = adjust_to_budget(proposal, dec!(4), dec!(7));

        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted[0].client_id, "1");
        assert_eq!(admitted[0].side, OrderSide::Buy);
        assert_eq!(admitted[1].client_id, "3");
        assert_eq!(admitted[1].side, OrderSide::Sell);
    }

    /// Scenario: An order whose amount exactly equals the remaining balance.
    /// Expected: Dropped — admission requires the balance to strictly exceed
    /// the amount.
    #[test]
    fn test_budget_strict_comparison() {
        let proposal = vec![candidate("1", OrderSide::Sell, dec!(4), dec!(12))];
        assert!(adjust_to_budget(proposal, dec!(4), dec!(0)).is_empty());
    }

    /// Scenario: A mixed proposal filtered against partial balances.
    /// Expected: The output is an order-preserving subsequence of the input —
    /// dropped orders never reorder the survivors.
    #[test]
    fn test_budget_preserves_order() {
        let proposal = vec![
            candidate("1", OrderSide::Buy, dec!(2), dec!(9)),
            candidate("2", OrderSide::Sell, dec!(9), dec!(12)),
            candidate("3", OrderSide::Buy, dec!(2), dec!(9)),
            candidate("4", OrderSide::Sell, dec!(2), dec!(12)),
        ];
        let admitted = adjust_to_budget(proposal.clone(), dec!(3), dec!(10));

        let admitted_ids: Vec<&str> = admitted.iter().map(|o| o.client_id.as_str()).collect();
        assert_eq!(admitted_ids, vec!["1", "3", "4"]);

        // Subsequence check against the input.
        let mut cursor = proposal.iter();
        for order in &admitted {
            assert!(cursor.any(|p| p == order));
        }
    }
}
