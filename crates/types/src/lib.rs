//! Core domain types for the Tideflow settlement engine.
//!
//! This crate defines the value types shared by every layer of the engine:
//!
//! - Identifier and asset types ([`Address`], [`Coin`], [`Coins`], [`Fraction`])
//! - Domain records ([`EpochInfo`], [`Bid`], [`Incentive`], [`GasMeter`])
//! - Module parameters and genesis state with validation
//! - Centralized serialization via [`encode`] / [`decode`]
//! - The unified [`SettleError`] taxonomy
//! - Event definitions emitted by the settlement engines
//!
//! Everything here is deterministic by construction: no floats, no wall-clock
//! reads, no hash-map iteration. Replicated state machines depend on it.

mod address;
mod auction;
mod codec;
mod coin;
mod epoch;
mod error;
mod events;
mod fraction;
mod genesis;
mod incentive;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use auction::{AuctionParams, Bid, AUCTIONS_MODULE_NAME, AUCTION_COLLECTOR_NAME};
pub use codec::{decode, encode, CodecError};
pub use coin::{Coin, Coins};
pub use epoch::{EpochGenesis, EpochInfo, DAY_EPOCH_ID, WEEK_EPOCH_ID};
pub use error::{Result, SettleError};
pub use events::{attr, event_type, Event};
pub use fraction::{Fraction, FractionError};
pub use genesis::{AuctionGenesis, GenesisState, IncentivesGenesis};
pub use incentive::{
    Allocation, GasMeter, Incentive, IncentiveParams, INCENTIVES_MODULE_NAME,
};
