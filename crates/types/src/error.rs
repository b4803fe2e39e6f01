//! Error types for the settlement engine.
//!
//! One unified enum covers the whole taxonomy:
//!
//! - **Validation errors** reject a user operation synchronously with a named
//!   reason and guarantee no state was touched.
//! - **Resource errors** ([`SettleError::InsufficientFunds`],
//!   [`SettleError::Overflow`]) abort the operation that triggered them.
//! - **Settlement-time errors** are never surfaced to users; the settlement
//!   passes log them and apply their atomicity/skip policies.
//! - **Genesis errors** ([`SettleError::InvalidGenesis`]) are fatal at startup.

use snafu::Snafu;

use crate::{Address, CodecError, Fraction};

/// Unified result type for settlement operations.
pub type Result<T, E = SettleError> = std::result::Result<T, E>;

/// Top-level error type for the settlement engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SettleError {
    /// A feature-gated module received an operation while disabled.
    #[snafu(display("Module '{module}' is disabled"))]
    ModuleDisabled {
        /// Module name.
        module: String,
    },

    /// A coin was submitted in a denomination the operation does not accept.
    #[snafu(display("Invalid denom: expected '{expected}', got '{got}'"))]
    InvalidDenom {
        /// Required denomination.
        expected: String,
        /// Submitted denomination.
        got: String,
    },

    /// A bid did not strictly exceed the current highest bid.
    #[snafu(display("Bid of {bid} does not exceed the current highest bid of {highest}"))]
    BidTooLow {
        /// Submitted amount.
        bid: u128,
        /// Current highest amount.
        highest: u128,
    },

    /// A contract attempted to register a second live incentive.
    #[snafu(display("Incentive already registered for contract {contract}"))]
    IncentiveExists {
        /// Contract address.
        contract: Address,
    },

    /// No live incentive exists for the contract.
    #[snafu(display("No incentive registered for contract {contract}"))]
    IncentiveNotFound {
        /// Contract address.
        contract: Address,
    },

    /// An allocation names a denomination with no circulating supply.
    #[snafu(display("Denom '{denom}' has no circulating supply"))]
    NoSupply {
        /// Offending denomination.
        denom: String,
    },

    /// A single allocation fraction exceeds the configured per-incentive limit.
    #[snafu(display("Allocation {fraction} for '{denom}' exceeds the limit of {limit}"))]
    AllocationOverLimit {
        /// Offending denomination.
        denom: String,
        /// Requested fraction.
        fraction: Fraction,
        /// Configured per-incentive limit.
        limit: Fraction,
    },

    /// Applying an allocation would push a denom's committed total above one.
    #[snafu(display(
        "Allocation for '{denom}' would exceed 100%: {current} committed, {requested} requested"
    ))]
    AllocationOverflow {
        /// Offending denomination.
        denom: String,
        /// Fraction already committed across live incentives.
        current: Fraction,
        /// Fraction requested by the registration.
        requested: Fraction,
    },

    /// An account holds less than an operation needs to move.
    #[snafu(display(
        "Insufficient funds: {address} holds {available} '{denom}', needs {needed}"
    ))]
    InsufficientFunds {
        /// Debited account.
        address: Address,
        /// Denomination.
        denom: String,
        /// Amount required.
        needed: u128,
        /// Amount held.
        available: u128,
    },

    /// Checked arithmetic failed (amount or meter overflow).
    #[snafu(display("Arithmetic overflow: {message}"))]
    Overflow {
        /// Description of the failed computation.
        message: String,
    },

    /// A request was malformed (empty allocation list, zero epochs, duplicate
    /// allocation denom).
    #[snafu(display("Invalid request: {message}"))]
    InvalidRequest {
        /// Description of the malformed field.
        message: String,
    },

    /// The operation's signer is not the configured authority.
    #[snafu(display("Unauthorized: expected {expected}, got {got}"))]
    Unauthorized {
        /// Configured authority address.
        expected: Address,
        /// Submitted signer.
        got: Address,
    },

    /// Serialization or deserialization of a persisted record failed.
    #[snafu(display("Codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
        /// Source code location for debugging.
        #[snafu(implicit)]
        location: snafu::Location,
    },

    /// Genesis state failed validation. Fatal: abort startup.
    #[snafu(display("Invalid genesis: {message}"))]
    InvalidGenesis {
        /// Description of the violated constraint.
        message: String,
    },
}

impl From<CodecError> for SettleError {
    #[track_caller]
    fn from(source: CodecError) -> Self {
        let loc = std::panic::Location::caller();
        SettleError::Codec {
            source,
            location: snafu::Location::new(loc.file(), loc.line(), loc.column()),
        }
    }
}
