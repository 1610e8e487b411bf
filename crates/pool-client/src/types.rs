//! Type definitions for pool API responses
//!
//! These mirror the JSON documents served by the pool's REST API. Slates are
//! deliberately absent: they travel as raw text and are never decoded here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pool login used for HTTP basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct PoolCredentials {
    pub username: String,
    pub password: String,
}

impl PoolCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PoolCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Account record returned by `GET /pool/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: u64,
}

/// Unpaid balance returned by `GET /worker/utxo/{user_id}`, in nano-units.
/// The pool answers `null` for accounts that never earned anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoBalance {
    pub amount: i64,
}

// ============= Public statistics =============

/// Current chain tip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainHeight {
    pub height: u64,
}

/// A block found by the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolBlock {
    pub height: u64,
}

/// Per-block chain data needed to value a graph rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStats {
    pub height: u64,
    pub secondary_scaling: u64,
    /// Transaction fees included in the block reward, in nano-units
    pub fee: u64,
}

/// Graph rate for one cuckoo cycle size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRate {
    pub edge_bits: u32,
    pub gps: f64,
}

/// Pool-wide graph rates at a given height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolGraphRates {
    pub gps: Vec<GraphRate>,
}
