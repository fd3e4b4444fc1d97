//! Order number generation.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use eazyy_core::OrderNumber;
use eazyy_core::types::order_number::{RANDOM_MAX, RANDOM_MIN};

use crate::db::OrderStore;

/// Random candidates tried before falling back to the clock.
pub const MAX_ATTEMPTS: u32 = 10;

/// Pick an order number no existing order uses.
///
/// Tries up to [`MAX_ATTEMPTS`] random six-digit suffixes. If every candidate
/// is taken, or the lookup itself fails, the suffix is the last six digits of
/// the millisecond clock instead. The result is only a reservation; the
/// unique constraint on `orders.order_number` is the final arbiter.
pub async fn generate_order_number(store: &dyn OrderStore, prefix: &str) -> OrderNumber {
    for attempt in 1..=MAX_ATTEMPTS {
        let suffix = rand::rng().random_range(RANDOM_MIN..=RANDOM_MAX);
        let candidate = OrderNumber::from_parts(prefix, u64::from(suffix));

        match store.order_number_exists(&candidate).await {
            Ok(false) => return candidate,
            Ok(true) => debug!(%candidate, attempt, "Order number taken"),
            Err(e) => {
                warn!(error = %e, "Order number lookup failed, using clock");
                return timestamp_number(prefix);
            }
        }
    }

    warn!(attempts = MAX_ATTEMPTS, "No free random order number, using clock");
    timestamp_number(prefix)
}

fn timestamp_number(prefix: &str) -> OrderNumber {
    OrderNumber::from_timestamp_millis(prefix, Utc::now().timestamp_millis())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::testing::MemoryOrderStore;

    #[tokio::test]
    async fn test_generated_numbers_avoid_taken_ones() {
        let taken: HashSet<OrderNumber> = (0..500u64)
            .map(|n| OrderNumber::from_parts("EZY", 100_000 + n * 1_799))
            .collect();
        assert_eq!(taken.len(), 500);
        let store = MemoryOrderStore::with_taken_numbers(taken.iter().cloned());

        for _ in 0..1000 {
            let number = generate_order_number(&store, "EZY").await;
            assert!(!taken.contains(&number), "collided with {number}");
            assert!(OrderNumber::parse(number.as_str()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_clock() {
        let store = MemoryOrderStore::new();
        store.fail_lookups(true);

        let before = Utc::now().timestamp_millis().unsigned_abs() % 1_000_000;
        let number = generate_order_number(&store, "EZY").await;
        let after = Utc::now().timestamp_millis().unsigned_abs() % 1_000_000;

        let suffix: u64 = number.as_str().strip_prefix("EZY").unwrap().parse().unwrap();
        // One lookup, then straight to the clock.
        assert_eq!(store.lookups(), 1);
        if before <= after {
            assert!((before..=after).contains(&suffix));
        }
    }

    #[tokio::test]
    async fn test_prefix_is_applied() {
        let store = MemoryOrderStore::new();
        let number = generate_order_number(&store, "TST").await;
        assert!(number.as_str().starts_with("TST"));
        assert_eq!(number.as_str().len(), 9);
    }
}
