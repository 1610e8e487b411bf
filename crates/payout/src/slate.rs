//! Value types shared by every payout step

use std::fmt;

use tracing::warn;

const NANO_PER_COIN: u64 = 1_000_000_000;

/// Opaque transaction-negotiation document.
///
/// Only checked for JSON well-formedness; the text itself is kept exactly as
/// received so it can be forwarded byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slate(String);

impl Slate {
    /// Accept `text` if it is a well-formed JSON document
    pub fn parse(text: impl Into<String>) -> Result<Self, serde_json::Error> {
        let text = text.into();
        serde_json::from_str::<serde::de::IgnoredAny>(&text)?;
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unpaid pool balance, never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Balance {
    nano: u64,
}

impl Balance {
    pub fn from_nano(nano: u64) -> Self {
        Self { nano }
    }

    /// Convert the pool's signed nano-unit amount. A negative amount is an
    /// upstream bug; it is reported and treated as nothing to pay.
    pub fn from_pool_amount(amount: i64) -> Self {
        if amount < 0 {
            warn!("Pool reported a negative balance ({} nano), treating it as 0", amount);
        }
        Self::from_nano(amount.max(0) as u64)
    }

    /// Whole-coin amount as written in configuration (e.g. `0.1`)
    pub fn from_coins(coins: f64) -> Self {
        Self::from_nano((coins.max(0.0) * NANO_PER_COIN as f64).round() as u64)
    }

    pub fn as_coins(&self) -> f64 {
        self.nano as f64 / NANO_PER_COIN as f64
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.nano / NANO_PER_COIN;
        let frac = self.nano % NANO_PER_COIN;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:09}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

/// Pool account resolved at the start of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub user_id: u64,
}
