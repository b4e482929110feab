//! Account record with spendable balances and embedded future summaries
//!
//! The account store is the collaborator that ultimately receives released
//! funds. Each account embeds at most one [`FutureSummary`] per asset, so
//! existence and aggregate queries are a single account read.

use crate::{
    types::{AccountId, AssetId, FutureSummary, TokenId},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address
    pub address: AccountId,

    /// Spendable native coin balance
    pub balance: u64,

    /// Spendable token balances
    #[serde(default)]
    pub token_balances: HashMap<TokenId, u64>,

    /// Summary of scheduled coin credits, present only while ticks exist
    pub coin_future: Option<FutureSummary>,

    /// Summaries of scheduled token credits, keyed by token
    #[serde(default)]
    pub token_futures: HashMap<TokenId, FutureSummary>,
}

impl Account {
    /// Create an empty account
    pub fn new(address: AccountId) -> Self {
        Self {
            address,
            balance: 0,
            token_balances: HashMap::new(),
            coin_future: None,
            token_futures: HashMap::new(),
        }
    }

    /// Spendable balance for one asset
    pub fn spendable_balance(&self, asset: &AssetId) -> u64 {
        match asset {
            AssetId::Coin => self.balance,
            AssetId::Token(id) => self.token_balances.get(id).copied().unwrap_or(0),
        }
    }

    /// Increase the spendable balance for one asset (checked)
    pub fn credit_spendable(&mut self, asset: &AssetId, amount: u64) -> Result<()> {
        match asset {
            AssetId::Coin => {
                self.balance = self.balance.checked_add(amount).ok_or_else(|| {
                    Error::InvalidAmount(format!("coin balance overflow for {}", self.address))
                })?;
            }
            AssetId::Token(id) => {
                let entry = self.token_balances.entry(id.clone()).or_insert(0);
                *entry = entry.checked_add(amount).ok_or_else(|| {
                    Error::InvalidAmount(format!(
                        "token {} balance overflow for {}",
                        id, self.address
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Future summary for one asset, if any ticks exist
    pub fn future_summary(&self, asset: &AssetId) -> Option<&FutureSummary> {
        match asset {
            AssetId::Coin => self.coin_future.as_ref(),
            AssetId::Token(id) => self.token_futures.get(id),
        }
    }

    /// Replace (or remove) the future summary for one asset
    pub fn set_future_summary(&mut self, asset: &AssetId, summary: Option<FutureSummary>) {
        match asset {
            AssetId::Coin => self.coin_future = summary,
            AssetId::Token(id) => match summary {
                Some(summary) => {
                    self.token_futures.insert(id.clone(), summary);
                }
                None => {
                    self.token_futures.remove(id);
                }
            },
        }
    }
}
