//! Epoch scheduler and settlement engines for the Tideflow chain core.
//!
//! This crate is the business-logic layer of the settlement engine. It sits
//! between the ordered key-value store (`tideflow-store`) and the surrounding
//! runtime that drives state transitions, providing:
//!
//! - [`Context`] - per-transition execution context with block time/height,
//!   an append-only event log, and the shadow-commit discipline
//! - [`BankKeeper`] + [`LedgerBank`] - account/transfer primitives over the
//!   context's store
//! - [`EpochsKeeper`] - recurring-interval scheduler with an ordered
//!   [`EpochHooks`] subscriber chain
//! - [`AuctionsKeeper`] - weekly burn auction with atomic settlement
//! - [`IncentivesKeeper`] - gas-metered proportional reward distribution
//! - genesis initialization and export
//!
//! Everything runs single-threaded inside one state transition and is a pure
//! function of store contents, block time, and block height.

mod auctions;
mod bank;
mod context;
mod epochs;
mod genesis;
mod incentives;
pub mod keys;

pub use auctions::AuctionsKeeper;
pub use bank::{BankKeeper, LedgerBank};
pub use context::Context;
pub use epochs::{EpochHooks, EpochsKeeper};
pub use genesis::{export_genesis, init_genesis};
pub use incentives::{AccountClassifier, IncentivesKeeper};
