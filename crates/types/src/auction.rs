//! Auction records and parameters.
//!
//! The burn auction escrows the highest bid in a module account and, at the
//! end of every weekly epoch, burns the winning bid and pays the accumulated
//! basket out to the winner.

use serde::{Deserialize, Serialize};

use crate::{Address, Coin};

/// Name of the auction module account holding the escrowed bid and the
/// basket currently up for auction.
pub const AUCTIONS_MODULE_NAME: &str = "auctions";

/// Name of the collector module account accumulating assets for the *next*
/// auction round.
pub const AUCTION_COLLECTOR_NAME: &str = "auctions_collector";

/// The current highest bid. Singleton record.
///
/// `sender: None` with a zero amount is the canonical "no bid" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Bidder; `None` when no bid has been placed this round.
    pub sender: Option<Address>,
    /// Escrowed amount, always in the auction denomination.
    pub amount: Coin,
}

impl Bid {
    /// The empty bid for a given auction denomination.
    pub fn none(denom: impl Into<String>) -> Self {
        Self {
            sender: None,
            amount: Coin::new(denom, 0),
        }
    }

    /// Whether this record carries a payable bid: a known sender and a
    /// positive amount.
    pub fn is_payable(&self) -> bool {
        self.sender.is_some() && self.amount.amount > 0
    }
}

/// Governance-controlled auction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Master switch; all auction operations fail while disabled.
    pub enable_auction: bool,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            enable_auction: true,
        }
    }
}
