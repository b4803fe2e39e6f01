//! Incentive records, gas meters, and parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Fraction, WEEK_EPOCH_ID};

/// Name of the incentives module account funding reward payouts.
pub const INCENTIVES_MODULE_NAME: &str = "incentives";

/// One allocation inside an incentive: a share of the module account's
/// balance of `denom` reserved for the incentive's participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Rewarded denomination.
    pub denom: String,
    /// Share of the module balance, in `(0, 1]`.
    pub fraction: Fraction,
}

impl Allocation {
    /// Creates an allocation.
    pub fn new(denom: impl Into<String>, fraction: Fraction) -> Self {
        Self {
            denom: denom.into(),
            fraction,
        }
    }
}

/// A live incentive for one contract.
///
/// Created by registration, charged by the per-transaction gas hook, paid and
/// decremented by the epoch-end distribution pass, deleted when
/// `remaining_epochs` reaches zero or the incentive is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incentive {
    /// Incentivized contract.
    pub contract: Address,
    /// Reward allocations, in registration order.
    pub allocations: Vec<Allocation>,
    /// Distribution passes left before the incentive expires.
    pub remaining_epochs: u32,
    /// Time the incentive was registered.
    pub start_time: DateTime<Utc>,
    /// Gas accumulated by all participants during the current epoch.
    pub total_gas: u64,
}

/// Cumulative gas one participant spent on one contract this epoch.
///
/// Keyed by `(contract, participant)`; deleted after each distribution pass
/// unless the participant's payout failed and is left for retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMeter {
    /// Incentivized contract.
    pub contract: Address,
    /// Transaction originator.
    pub participant: Address,
    /// Metered gas.
    pub cumulative_gas: u64,
}

/// Governance-controlled incentive parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveParams {
    /// Master switch; registration, metering, and distribution are inert
    /// while disabled.
    pub enable_incentives: bool,
    /// Upper bound for any single allocation fraction.
    pub allocation_limit: Fraction,
    /// Epoch identifier whose end triggers distribution.
    pub incentives_epoch_identifier: String,
}

impl Default for IncentiveParams {
    fn default() -> Self {
        Self {
            enable_incentives: true,
            // 5%, the original chain default.
            allocation_limit: Fraction::from_raw(50_000_000_000_000_000)
                .unwrap_or(Fraction::ZERO),
            incentives_epoch_identifier: WEEK_EPOCH_ID.to_string(),
        }
    }
}
