//! Core types for the future ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (u64 with checked operations)
//! - Point-addressable storage (every tick key is derivable without scans)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier (address on the hosting chain)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fungible token identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Create new token ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset scoping every ledger operation: the native coin or one token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    /// The chain's native coin
    Coin,
    /// A fungible token
    Token(TokenId),
}

impl AssetId {
    /// Shorthand for a token asset
    pub fn token(id: impl Into<String>) -> Self {
        AssetId::Token(TokenId::new(id))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Coin => write!(f, "coin"),
            AssetId::Token(id) => write!(f, "{}", id),
        }
    }
}

/// A timestamp truncated to the configured bucket granularity
///
/// Stored as the bucket index, not the timestamp, so equality of days is
/// equality of integers. Euclidean division keeps the mapping total and
/// monotonic for pre-epoch timestamps too.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MaturityDay(i64);

impl MaturityDay {
    /// Truncate a timestamp down to its maturity bucket
    pub fn bucket(at: DateTime<Utc>, granularity_ms: i64) -> Self {
        Self(at.timestamp_millis().div_euclid(granularity_ms))
    }

    /// Construct from a raw bucket index
    pub fn from_index(index: i64) -> Self {
        Self(index)
    }

    /// Raw bucket index
    pub fn index(&self) -> i64 {
        self.0
    }

    /// Start of this bucket as a timestamp
    pub fn start(&self, granularity_ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0.saturating_mul(granularity_ms))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl fmt::Display for MaturityDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage key of one tick
///
/// Layout: `[u16 be owner_len][owner][asset tag][i64 be day]` where the
/// asset tag is `0x00` for the coin and `0x01 [u16 be len][token]` for a
/// token. Length prefixes make the encoding prefix-free, so distinct
/// (owner, asset, day) triples can never collide. Identifiers longer than
/// a u16 length prefix can encode are rejected, never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickKey(#[serde(with = "serde_bytes")] Vec<u8>);

const ASSET_TAG_COIN: u8 = 0x00;
const ASSET_TAG_TOKEN: u8 = 0x01;

/// Longest owner or token identifier the key encoding can hold
pub const MAX_IDENTIFIER_LEN: usize = u16::MAX as usize;

fn length_prefix(bytes: &[u8], what: &str) -> crate::Result<[u8; 2]> {
    if bytes.len() > MAX_IDENTIFIER_LEN {
        return Err(crate::Error::InvalidIdentifier(format!(
            "{} is {} bytes, limit {}",
            what,
            bytes.len(),
            MAX_IDENTIFIER_LEN
        )));
    }
    Ok((bytes.len() as u16).to_be_bytes())
}

impl TickKey {
    /// Derive the key for (owner, asset, day)
    ///
    /// Fails on identifiers longer than [`MAX_IDENTIFIER_LEN`]: a wrapped
    /// length prefix could alias another (owner, asset) pair's key.
    pub fn derive(owner: &AccountId, asset: &AssetId, day: MaturityDay) -> crate::Result<Self> {
        let owner_bytes = owner.as_str().as_bytes();
        let mut key = Vec::with_capacity(owner_bytes.len() + 16);
        key.extend_from_slice(&length_prefix(owner_bytes, "owner id")?);
        key.extend_from_slice(owner_bytes);
        match asset {
            AssetId::Coin => key.push(ASSET_TAG_COIN),
            AssetId::Token(id) => {
                let token_bytes = id.as_str().as_bytes();
                key.push(ASSET_TAG_TOKEN);
                key.extend_from_slice(&length_prefix(token_bytes, "token id")?);
                key.extend_from_slice(token_bytes);
            }
        }
        key.extend_from_slice(&day.index().to_be_bytes());
        Ok(Self(key))
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TickKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One maturity bucket: the aggregate credit scheduled for one
/// (owner, asset, day), linked to its neighbors by key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Maturity bucket this tick belongs to
    pub day: MaturityDay,

    /// Aggregate scheduled balance; always positive for a live tick
    pub balance: u64,

    /// Key of the previous (earlier) tick, none for the head
    pub prev: Option<TickKey>,

    /// Key of the next (later) tick, none for the tail
    pub next: Option<TickKey>,
}

/// Cached aggregate over all of one (owner, asset)'s ticks
///
/// Present only while at least one tick exists. Kept consistent by every
/// insert/withdraw so existence and aggregate queries never touch a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureSummary {
    /// Number of live ticks
    pub count: u64,

    /// Sum of all tick balances
    pub total_value: u64,

    /// Earliest maturity day
    pub lower_bound: MaturityDay,

    /// Latest maturity day
    pub upper_bound: MaturityDay,

    /// Key of the earliest tick
    pub lower_key: TickKey,

    /// Key of the latest tick
    pub upper_key: TickKey,
}

/// One entry of a paginated query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCredit {
    /// Maturity bucket
    pub day: MaturityDay,

    /// Start of the bucket as a timestamp
    pub available_at: DateTime<Utc>,

    /// Scheduled balance in this bucket
    pub balance: u64,
}

/// Result of a paginated query
///
/// `items` may be empty while the aggregates are non-zero: that is a page
/// past the end of a non-empty ledger. A ledger with no entries at all
/// reports zeroed aggregates and absent bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturePage {
    /// Entries on this page, in maturity order
    pub items: Vec<ScheduledCredit>,

    /// Total number of live ticks for this (owner, asset)
    pub count: u64,

    /// Total scheduled value for this (owner, asset)
    pub total_value: u64,

    /// Earliest maturity day, if any ticks exist
    pub lower_bound: Option<MaturityDay>,

    /// Latest maturity day, if any ticks exist
    pub upper_bound: Option<MaturityDay>,
}

impl FuturePage {
    /// The page returned when no ticks exist at all
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            total_value: 0,
            lower_bound: None,
            upper_bound: None,
        }
    }
}
