//! Core future-ledger algorithms: insert, withdraw, paginate
//!
//! Ticks form a doubly linked list ordered by maturity day, but the links
//! are storage keys, not references: each tick stores its neighbors' keys
//! and every hop is a point lookup. The key-value store is the arena, the
//! deterministic key derivation is the index. The per-account summary is
//! maintained on every mutation so existence and aggregate queries never
//! walk the chain.
//!
//! One generic component serves both asset kinds; the coin and token
//! ledgers are the same code over different [`TickStore`] handles.

use crate::{
    account::Account,
    storage::{LedgerBatch, Storage, TickStore},
    types::{
        AccountId, AssetId, FuturePage, FutureSummary, MaturityDay, ScheduledCredit, Tick, TickKey,
    },
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Deferred-credit ledger for one asset kind
pub struct FutureLedger<S: TickStore> {
    /// Tick store backing this instantiation
    ticks: S,

    /// Shared storage (account records live here)
    storage: Arc<Storage>,

    /// Maturity bucket granularity (milliseconds)
    granularity_ms: i64,

    /// Maximum page size accepted by paginate
    max_page_size: u64,
}

fn checked_add(a: u64, b: u64, what: &str) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| Error::InvalidAmount(format!("{} overflow", what)))
}

impl<S: TickStore> FutureLedger<S> {
    /// Create a ledger over a tick store and shared storage
    ///
    /// # Panics
    ///
    /// Panics if `granularity_ms` is not positive; day bucketing divides
    /// by it.
    pub fn new(ticks: S, storage: Arc<Storage>, granularity_ms: i64, max_page_size: u64) -> Self {
        assert!(
            granularity_ms > 0,
            "bucket granularity must be positive, got {}",
            granularity_ms
        );
        Self {
            ticks,
            storage,
            granularity_ms,
            max_page_size,
        }
    }

    /// Schedule a credit that matures at `available_at`
    ///
    /// Merges into the existing tick when one exists for the bucketed day,
    /// otherwise links a new tick at the head, tail, or spliced in between.
    /// All writes commit atomically.
    pub fn insert(
        &self,
        owner: &AccountId,
        asset: &AssetId,
        amount: u64,
        available_at: DateTime<Utc>,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidAmount(
                "scheduled amount must be positive".to_string(),
            ));
        }

        let day = MaturityDay::bucket(available_at, self.granularity_ms);
        let key = TickKey::derive(owner, asset, day)?;

        let mut account = self
            .storage
            .get_account(owner)?
            .unwrap_or_else(|| Account::new(owner.clone()));
        let mut batch = LedgerBatch::new();

        if let Some(mut tick) = self.ticks.get(&key)? {
            // Same-day merge: at most one tick per (owner, asset, day).
            tick.balance = checked_add(tick.balance, amount, "tick balance")?;
            self.ticks.stage_put(&mut batch, &key, &tick)?;

            let mut summary = account
                .future_summary(asset)
                .cloned()
                .ok_or_else(|| Error::Corrupt(format!("tick {} exists without a summary", key)))?;
            summary.total_value = checked_add(summary.total_value, amount, "summary total")?;
            account.set_future_summary(asset, Some(summary));
        } else {
            let summary = match account.future_summary(asset).cloned() {
                None => {
                    // First scheduled credit for this (owner, asset).
                    let tick = Tick {
                        day,
                        balance: amount,
                        prev: None,
                        next: None,
                    };
                    self.ticks.stage_put(&mut batch, &key, &tick)?;
                    FutureSummary {
                        count: 1,
                        total_value: amount,
                        lower_bound: day,
                        upper_bound: day,
                        lower_key: key.clone(),
                        upper_key: key.clone(),
                    }
                }
                Some(mut summary) => {
                    if day < summary.lower_bound {
                        // New head.
                        let head_key = summary.lower_key.clone();
                        let mut head = self.require_tick(&head_key)?;
                        head.prev = Some(key.clone());
                        let tick = Tick {
                            day,
                            balance: amount,
                            prev: None,
                            next: Some(head_key.clone()),
                        };
                        self.ticks.stage_put(&mut batch, &key, &tick)?;
                        self.ticks.stage_put(&mut batch, &head_key, &head)?;
                        summary.lower_bound = day;
                        summary.lower_key = key.clone();
                    } else if day > summary.upper_bound {
                        // New tail.
                        let tail_key = summary.upper_key.clone();
                        let mut tail = self.require_tick(&tail_key)?;
                        tail.next = Some(key.clone());
                        let tick = Tick {
                            day,
                            balance: amount,
                            prev: Some(tail_key.clone()),
                            next: None,
                        };
                        self.ticks.stage_put(&mut batch, &key, &tick)?;
                        self.ticks.stage_put(&mut batch, &tail_key, &tail)?;
                        summary.upper_bound = day;
                        summary.upper_key = key.clone();
                    } else {
                        // Strictly between the bounds: the exact-day tick is
                        // absent, so a straddling neighbor pair must exist.
                        self.splice(&mut batch, &summary, &key, day, amount)?;
                    }
                    summary.count = checked_add(summary.count, 1, "summary count")?;
                    summary.total_value = checked_add(summary.total_value, amount, "summary total")?;
                    summary
                }
            };
            account.set_future_summary(asset, Some(summary));
        }

        self.storage.stage_account(&mut batch, &account)?;
        self.storage.commit(batch)?;

        tracing::debug!(
            owner = %owner,
            asset = %asset,
            day = day.index(),
            amount,
            "future credit scheduled"
        );

        Ok(())
    }

    /// Splice a new tick between the neighbors straddling `day`
    ///
    /// Walks forward from the lower bound. Termination is guaranteed by
    /// day ∈ (lower_bound, upper_bound); anything that breaks the walk is
    /// corruption, never silently repaired.
    fn splice(
        &self,
        batch: &mut LedgerBatch,
        summary: &FutureSummary,
        key: &TickKey,
        day: MaturityDay,
        amount: u64,
    ) -> Result<()> {
        let mut pred_key = summary.lower_key.clone();
        let mut pred = self.require_tick(&pred_key)?;
        if pred.day >= day {
            return Err(Error::Corrupt(format!(
                "head day {} not below spliced day {}",
                pred.day, day
            )));
        }

        loop {
            let succ_key = pred.next.clone().ok_or_else(|| {
                Error::Corrupt(format!("chain ended before upper bound at {}", pred_key))
            })?;
            let mut succ = self.require_tick(&succ_key)?;
            if succ.prev.as_ref() != Some(&pred_key) {
                return Err(Error::Corrupt(format!(
                    "direction mismatch between {} and {}",
                    pred_key, succ_key
                )));
            }
            if succ.day == day {
                // The point lookup at this exact key found nothing, so a
                // reachable equal-day tick means chain and index disagree.
                return Err(Error::Corrupt(format!(
                    "reachable tick duplicates day {}",
                    day
                )));
            }
            if succ.day > day {
                pred.next = Some(key.clone());
                succ.prev = Some(key.clone());
                let tick = Tick {
                    day,
                    balance: amount,
                    prev: Some(pred_key.clone()),
                    next: Some(succ_key.clone()),
                };
                self.ticks.stage_put(batch, key, &tick)?;
                self.ticks.stage_put(batch, &pred_key, &pred)?;
                self.ticks.stage_put(batch, &succ_key, &succ)?;
                return Ok(());
            }
            pred_key = succ_key;
            pred = succ;
        }
    }

    /// Release every credit matured at or before `now`
    ///
    /// Walks forward from the head deleting matured ticks, credits the sum
    /// to the owner's spendable balance, and either advances the summary to
    /// the first unmatured tick or removes it entirely. Returns the amount
    /// released; calling with nothing matured is a no-op returning 0.
    pub fn withdraw(&self, owner: &AccountId, asset: &AssetId, now: DateTime<Utc>) -> Result<u64> {
        let now_day = MaturityDay::bucket(now, self.granularity_ms);

        let Some(mut account) = self.storage.get_account(owner)? else {
            return Ok(0);
        };
        let Some(summary) = account.future_summary(asset).cloned() else {
            return Ok(0);
        };
        if summary.count == 0 || now_day < summary.lower_bound {
            return Ok(0);
        }

        let mut batch = LedgerBatch::new();
        let mut released: u64 = 0;
        let mut released_count: u64 = 0;
        let mut prev_key: Option<TickKey> = None;
        let mut cursor = Some(summary.lower_key.clone());
        let mut remainder: Option<(TickKey, Tick)> = None;

        while let Some(key) = cursor {
            let tick = self.require_tick(&key)?;
            if tick.prev != prev_key {
                return Err(Error::Corrupt(format!("direction mismatch at {}", key)));
            }
            if tick.day > now_day {
                remainder = Some((key, tick));
                break;
            }
            released = checked_add(released, tick.balance, "released total")?;
            released_count += 1;
            self.ticks.stage_delete(&mut batch, &key)?;
            prev_key = Some(key);
            cursor = tick.next;
        }

        match remainder {
            None => {
                // Everything matured; the summary goes away with the ticks.
                account.set_future_summary(asset, None);
            }
            Some((head_key, mut head)) => {
                head.prev = None;
                self.ticks.stage_put(&mut batch, &head_key, &head)?;

                let mut summary = summary;
                summary.count = summary.count.checked_sub(released_count).ok_or_else(|| {
                    Error::Corrupt("summary count below released count".to_string())
                })?;
                summary.total_value = summary.total_value.checked_sub(released).ok_or_else(|| {
                    Error::Corrupt("summary total below released value".to_string())
                })?;
                summary.lower_bound = head.day;
                summary.lower_key = head_key;
                account.set_future_summary(asset, Some(summary));
            }
        }

        account.credit_spendable(asset, released)?;
        self.storage.stage_account(&mut batch, &account)?;
        self.storage.commit(batch)?;

        tracing::info!(
            owner = %owner,
            asset = %asset,
            now_day = now_day.index(),
            released,
            released_count,
            "matured credits released"
        );

        Ok(released)
    }

    /// Read one page of scheduled credits, in maturity order
    ///
    /// Cost is O(end of page): the walk starts at the head every time, a
    /// deliberate trade-off for a store without range scans.
    pub fn paginate(
        &self,
        owner: &AccountId,
        asset: &AssetId,
        page_index: u64,
        page_size: u64,
    ) -> Result<FuturePage> {
        if page_size == 0 || page_size > self.max_page_size {
            return Err(Error::InvalidPage(format!(
                "page size must be in 1..={}",
                self.max_page_size
            )));
        }

        let account = self.storage.get_account(owner)?;
        let Some(summary) = account.as_ref().and_then(|a| a.future_summary(asset)) else {
            return Ok(FuturePage::empty());
        };
        if summary.count == 0 {
            return Ok(FuturePage::empty());
        }

        let mut page = FuturePage {
            items: Vec::new(),
            count: summary.count,
            total_value: summary.total_value,
            lower_bound: Some(summary.lower_bound),
            upper_bound: Some(summary.upper_bound),
        };

        // Past-the-end pages keep the real aggregates but carry no items,
        // distinguishing "nothing on this page" from "nothing at all".
        let start = match page_index.checked_mul(page_size) {
            Some(start) if start < summary.count => start,
            _ => return Ok(page),
        };
        let end = start
            .checked_add(page_size)
            .map(|end| end.min(summary.count))
            .unwrap_or(summary.count);

        let mut cursor = Some(summary.lower_key.clone());
        let mut index = 0u64;
        while index < end {
            let key = cursor.ok_or_else(|| {
                Error::Corrupt(format!(
                    "chain ended at position {} of {}",
                    index, summary.count
                ))
            })?;
            let tick = self.require_tick(&key)?;
            if index >= start {
                page.items.push(ScheduledCredit {
                    day: tick.day,
                    available_at: tick.day.start(self.granularity_ms),
                    balance: tick.balance,
                });
            }
            cursor = tick.next;
            index += 1;
        }

        Ok(page)
    }

    fn require_tick(&self, key: &TickKey) -> Result<Tick> {
        self.ticks
            .get(key)?
            .ok_or_else(|| Error::Corrupt(format!("dangling tick reference {}", key)))
    }
}
