//! Pure set computations behind order reconciliation. The worker feeds
//! these from its tracking sets and the venue's open orders and performs
//! the actual cancellations.

use std::collections::{BTreeMap, HashSet};

use crate::gateway::dto::VenueOrder;
use crate::types::MANUAL_CLIENT_ID;

/// Ids this worker placed at some point, still open on the venue, but not
/// part of the most recent placement: `tracked ∩ open ∖ currentlyTracked`.
/// Foreign ids (never tracked) can never appear in the result.
pub fn currently_untracked(
    tracked: &[String],
    open: &[String],
    currently_tracked: &[String],
) -> Vec<String> {
    let open: HashSet<&str> = open.iter().map(String::as_str).collect();
    let current: HashSet<&str> = currently_tracked.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    tracked
        .iter()
        .filter(|id| {
            open.contains(id.as_str())
                && !current.contains(id.as_str())
                && seen.insert(id.as_str())
        })
        .cloned()
        .collect()
}

/// Open orders sharing a client id, all but the newest (largest venue id)
/// per group. Orders with the manual client id are never considered.
pub fn duplicated_order_ids<'a>(
    open_orders: impl IntoIterator<Item = &'a VenueOrder>,
) -> Vec<String> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for order in open_orders {
        if order.client_id == MANUAL_CLIENT_ID {
            continue;
        }
        groups
            .entry(order.client_id.as_str())
            .or_default()
            .push(order.id.as_str());
    }

    let mut duplicated = Vec::new();
    for mut ids in groups.into_values() {
        ids.sort_unstable();
        duplicated.extend(ids[..ids.len() - 1].iter().map(|id| id.to_string()));
    }
    duplicated
}
