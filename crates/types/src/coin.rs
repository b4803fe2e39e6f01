//! Denominated token amounts.
//!
//! [`Coin`] is a single `(denom, amount)` pair; [`Coins`] is a normalized
//! multiset of coins: sorted by denomination, duplicates merged, zero
//! amounts dropped. The normalization makes balance comparisons and event
//! rendering deterministic regardless of how a set was assembled.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single denominated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `"atide"`.
    pub denom: String,
    /// Amount in base units.
    pub amount: u128,
}

impl Coin {
    /// Creates a coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Whether the amount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A normalized set of coins: sorted by denom, unique, no zero amounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// The empty set.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a normalized set from arbitrary coins.
    ///
    /// Duplicated denominations are summed with saturating addition; zero
    /// amounts are dropped; the result is sorted by denomination.
    pub fn from_vec(coins: Vec<Coin>) -> Self {
        let mut out = Self::new();
        for coin in coins {
            out.add(coin);
        }
        out
    }

    /// Adds a coin into the set, merging with an existing denomination.
    pub fn add(&mut self, coin: Coin) {
        if coin.is_zero() {
            return;
        }
        match self.0.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
            Ok(idx) => {
                self.0[idx].amount = self.0[idx].amount.saturating_add(coin.amount);
            }
            Err(idx) => self.0.insert(idx, coin),
        }
    }

    /// Removes `coin.amount` of `coin.denom`; `None` if the set holds less.
    ///
    /// On success the entry is dropped entirely when it reaches zero.
    #[must_use]
    pub fn checked_sub(&mut self, coin: &Coin) -> Option<()> {
        if coin.is_zero() {
            return Some(());
        }
        let idx = self
            .0
            .binary_search_by(|c| c.denom.cmp(&coin.denom))
            .ok()?;
        let remaining = self.0[idx].amount.checked_sub(coin.amount)?;
        if remaining == 0 {
            self.0.remove(idx);
        } else {
            self.0[idx].amount = remaining;
        }
        Some(())
    }

    /// Amount held of `denom`, zero if absent.
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|idx| self.0[idx].amount)
            .unwrap_or(0)
    }

    /// Returns the set without any entry for `denom`.
    pub fn without(&self, denom: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter(|c| c.denom != denom)
                .cloned()
                .collect(),
        )
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates coins in denomination order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    /// Consumes the set into its sorted vector.
    pub fn into_vec(self) -> Vec<Coin> {
        self.0
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self::from_vec(vec![coin])
    }
}

impl FromIterator<Coin> for Coins {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl fmt::Display for Coins {
    /// Comma-separated coin list: `100atide,5btoken`. Empty set renders as `[]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "[]");
        }
        let mut first = true;
        for coin in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{coin}")?;
            first = false;
        }
        Ok(())
    }
}
