//! Property-based tests for future-ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Summary consistency: count/total always match the reachable ticks
//! - Ordering: reachable ticks strictly increase in maturity day
//! - Order independence: any insertion order yields the same final state
//! - Conservation: withdraw moves value, never creates or destroys it

use chrono::{DateTime, Utc};
use future_ledger::{AccountId, AssetId, Config, Ledger, MaturityDay};
use proptest::prelude::*;
use std::collections::BTreeMap;

const DAY_MS: i64 = 86_400_000;

fn at_day(day: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(day * DAY_MS + DAY_MS / 2).unwrap()
}

/// Create test ledger with temp directory
fn create_test_ledger() -> (Ledger, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (Ledger::open(config).unwrap(), temp_dir)
}

/// Strategy for generating schedule requests as (day, amount) pairs
fn inserts_strategy() -> impl Strategy<Value = Vec<(i64, u64)>> {
    prop::collection::vec((-5i64..40, 1u64..1_000_000), 1..25)
}

/// Expected per-day aggregation of a request sequence
fn expected_buckets(inserts: &[(i64, u64)]) -> BTreeMap<i64, u64> {
    let mut buckets = BTreeMap::new();
    for (day, amount) in inserts {
        *buckets.entry(*day).or_insert(0u64) += amount;
    }
    buckets
}

/// Full forward walk through pagination
fn walk_all(ledger: &Ledger, owner: &AccountId, asset: &AssetId) -> Vec<(i64, u64)> {
    let page = ledger.query_page(owner, asset, 0, 1_000).unwrap();
    assert!(page.count <= 1_000, "test walks assume a single page");
    page.items
        .iter()
        .map(|item| (item.day.index(), item.balance))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: after every insert, the summary matches the reachable ticks
    /// and their days strictly increase
    #[test]
    fn prop_summary_matches_reachable_ticks(inserts in inserts_strategy()) {
        let (ledger, _temp) = create_test_ledger();
        let owner = AccountId::new("alice");
        let asset = AssetId::Coin;

        for (i, (day, amount)) in inserts.iter().enumerate() {
            ledger.schedule_credit(&owner, &asset, *amount, at_day(*day)).unwrap();

            let expected = expected_buckets(&inserts[..=i]);
            let summary = ledger.future_summary(&owner, &asset).unwrap().unwrap();
            prop_assert_eq!(summary.count, expected.len() as u64);
            prop_assert_eq!(summary.total_value, expected.values().sum::<u64>());
            prop_assert_eq!(summary.lower_bound.index(), *expected.keys().next().unwrap());
            prop_assert_eq!(summary.upper_bound.index(), *expected.keys().last().unwrap());

            let walked = walk_all(&ledger, &owner, &asset);
            prop_assert!(
                walked.windows(2).all(|w| w[0].0 < w[1].0),
                "maturity days must strictly increase"
            );
            prop_assert_eq!(
                walked,
                expected.into_iter().collect::<Vec<_>>()
            );
        }
    }

    /// Property: insertion order does not affect the final state
    #[test]
    fn prop_insertion_order_independent(
        (inserts, shuffled) in inserts_strategy()
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let (ledger_a, _temp_a) = create_test_ledger();
        let (ledger_b, _temp_b) = create_test_ledger();
        let owner = AccountId::new("alice");
        let asset = AssetId::token("gold");

        for (day, amount) in &inserts {
            ledger_a.schedule_credit(&owner, &asset, *amount, at_day(*day)).unwrap();
        }
        for (day, amount) in &shuffled {
            ledger_b.schedule_credit(&owner, &asset, *amount, at_day(*day)).unwrap();
        }

        let summary_a = ledger_a.future_summary(&owner, &asset).unwrap().unwrap();
        let summary_b = ledger_b.future_summary(&owner, &asset).unwrap().unwrap();
        prop_assert_eq!(summary_a.count, summary_b.count);
        prop_assert_eq!(summary_a.total_value, summary_b.total_value);
        prop_assert_eq!(summary_a.lower_bound, summary_b.lower_bound);
        prop_assert_eq!(summary_a.upper_bound, summary_b.upper_bound);

        prop_assert_eq!(
            walk_all(&ledger_a, &owner, &asset),
            walk_all(&ledger_b, &owner, &asset)
        );
    }

    /// Property: withdraw releases exactly the matured value and credits it
    /// to the spendable balance; the rest stays scheduled
    #[test]
    fn prop_withdraw_conserves_value(
        inserts in inserts_strategy(),
        now_day in -10i64..50,
    ) {
        let (ledger, _temp) = create_test_ledger();
        let owner = AccountId::new("alice");
        let asset = AssetId::Coin;

        for (day, amount) in &inserts {
            ledger.schedule_credit(&owner, &asset, *amount, at_day(*day)).unwrap();
        }

        let expected = expected_buckets(&inserts);
        let total_before: u64 = expected.values().sum();
        let expected_released: u64 = expected
            .iter()
            .filter(|(day, _)| **day <= now_day)
            .map(|(_, amount)| *amount)
            .sum();

        let released = ledger.withdraw_matured(&owner, &asset, at_day(now_day)).unwrap();
        prop_assert_eq!(released, expected_released);
        prop_assert_eq!(ledger.spendable_balance(&owner, &asset).unwrap(), released);

        let remaining = ledger
            .future_summary(&owner, &asset)
            .unwrap()
            .map(|s| s.total_value)
            .unwrap_or(0);
        prop_assert_eq!(released + remaining, total_before);

        // Released ticks no longer exist: a second withdrawal is a no-op.
        let again = ledger.withdraw_matured(&owner, &asset, at_day(now_day)).unwrap();
        prop_assert_eq!(again, 0);
    }

    /// Property: pages concatenate to the exact forward traversal,
    /// no gaps or duplicates
    #[test]
    fn prop_pagination_concatenates(
        inserts in inserts_strategy(),
        page_size in 1u64..8,
    ) {
        let (ledger, _temp) = create_test_ledger();
        let owner = AccountId::new("alice");
        let asset = AssetId::Coin;

        for (day, amount) in &inserts {
            ledger.schedule_credit(&owner, &asset, *amount, at_day(*day)).unwrap();
        }

        let full = walk_all(&ledger, &owner, &asset);

        let mut concatenated = Vec::new();
        let mut page_index = 0u64;
        loop {
            let page = ledger.query_page(&owner, &asset, page_index, page_size).unwrap();
            if page.items.is_empty() {
                // Past-the-end pages still report the real aggregates.
                prop_assert_eq!(page.count, full.len() as u64);
                break;
            }
            concatenated.extend(
                page.items.iter().map(|item| (item.day.index(), item.balance)),
            );
            page_index += 1;
        }

        prop_assert_eq!(concatenated, full);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_interleaved_schedule_and_withdraw() {
        let (ledger, _temp) = create_test_ledger();
        let alice = AccountId::new("alice");
        let coin = AssetId::Coin;

        ledger.schedule_credit(&alice, &coin, 100, at_day(5)).unwrap();
        ledger.schedule_credit(&alice, &coin, 200, at_day(15)).unwrap();

        assert_eq!(ledger.withdraw_matured(&alice, &coin, at_day(10)).unwrap(), 100);

        // Scheduling after a partial withdrawal keeps the chain sound.
        ledger.schedule_credit(&alice, &coin, 50, at_day(12)).unwrap();
        ledger.schedule_credit(&alice, &coin, 25, at_day(20)).unwrap();

        let summary = ledger.future_summary(&alice, &coin).unwrap().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_value, 275);
        assert_eq!(summary.lower_bound, MaturityDay::from_index(12));
        assert_eq!(summary.upper_bound, MaturityDay::from_index(20));

        assert_eq!(ledger.withdraw_matured(&alice, &coin, at_day(30)).unwrap(), 275);
        assert!(ledger.future_summary(&alice, &coin).unwrap().is_none());
        assert_eq!(ledger.spendable_balance(&alice, &coin).unwrap(), 375);
    }

    #[test]
    fn test_many_owners_do_not_interfere() {
        let (ledger, _temp) = create_test_ledger();
        let coin = AssetId::Coin;

        for i in 0u64..10 {
            let owner = AccountId::new(format!("owner-{}", i));
            ledger.schedule_credit(&owner, &coin, (i + 1) * 10, at_day(5)).unwrap();
        }

        for i in 0u64..10 {
            let owner = AccountId::new(format!("owner-{}", i));
            let released = ledger.withdraw_matured(&owner, &coin, at_day(6)).unwrap();
            assert_eq!(released, (i + 1) * 10);
        }
    }
}
