//! Events emitted by the settlement engines.
//!
//! Events are append-only and observable externally (indexers, clients);
//! nothing in the engine ever reads them back. Attribute order is fixed by
//! the emitter, so event streams are deterministic across validators.

use serde::{Deserialize, Serialize};

/// Event type names.
pub mod event_type {
    /// A tracked epoch began a new interval.
    pub const EPOCH_START: &str = "epoch_start";
    /// A tracked epoch completed an interval.
    pub const EPOCH_END: &str = "epoch_end";
    /// A bid was accepted.
    pub const BID: &str = "bid";
    /// Assets were deposited for the next auction round.
    pub const DEPOSIT: &str = "deposit";
    /// A weekly auction round settled.
    pub const AUCTION_END: &str = "auction_end";
    /// An incentive was registered.
    pub const REGISTER_INCENTIVE: &str = "register_incentive";
    /// An incentive was cancelled.
    pub const CANCEL_INCENTIVE: &str = "cancel_incentive";
    /// An incentive completed a distribution pass.
    pub const DISTRIBUTE_INCENTIVES: &str = "distribute_incentives";
}

/// Attribute keys.
pub mod attr {
    /// Epoch identifier.
    pub const EPOCH_IDENTIFIER: &str = "epoch_identifier";
    /// Epoch counter value.
    pub const EPOCH_NUMBER: &str = "epoch_number";
    /// Operation signer.
    pub const SENDER: &str = "sender";
    /// Coin or coin-set amount.
    pub const AMOUNT: &str = "amount";
    /// Auction winner.
    pub const WINNER: &str = "winner";
    /// Amount burned at settlement.
    pub const BURNED: &str = "burned";
    /// Auction round counter.
    pub const ROUND: &str = "round";
    /// Incentivized contract.
    pub const CONTRACT: &str = "contract";
    /// Remaining incentive epochs.
    pub const EPOCHS: &str = "epochs";
    /// Allocation list rendering.
    pub const ALLOCATIONS: &str = "allocations";
}

/// One emitted event: a type name plus ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, one of the [`event_type`] constants.
    pub kind: String,
    /// Ordered `(key, value)` attributes.
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Starts an event of the given type.
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute, preserving insertion order.
    #[must_use]
    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the first attribute with the given key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
