//! Genesis state for the settlement engine.
//!
//! Validation here is fatal by design: a chain must refuse to start from an
//! inconsistent initial state rather than diverge later.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AuctionParams, Bid, EpochGenesis, Fraction, GasMeter, Incentive, IncentiveParams,
    SettleError,
};

/// Auction module genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuctionGenesis {
    /// Module parameters.
    pub params: AuctionParams,
    /// Initial round counter.
    pub round: u64,
    /// Initial highest bid; `None` means no bid.
    pub highest_bid: Option<Bid>,
}

/// Incentives module genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IncentivesGenesis {
    /// Module parameters.
    pub params: IncentiveParams,
    /// Live incentives to restore.
    pub incentives: Vec<Incentive>,
    /// In-flight gas meters to restore.
    pub gas_meters: Vec<GasMeter>,
}

/// Full settlement-engine genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    /// Tracked recurring intervals.
    pub epochs: Vec<EpochGenesis>,
    /// Auction module genesis.
    pub auction: AuctionGenesis,
    /// Incentives module genesis.
    pub incentives: IncentivesGenesis,
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            epochs: vec![EpochGenesis::day(), EpochGenesis::week()],
            auction: AuctionGenesis::default(),
            incentives: IncentivesGenesis::default(),
        }
    }
}

impl GenesisState {
    /// Validates the genesis state.
    ///
    /// # Errors
    ///
    /// Returns [`SettleError::InvalidGenesis`] naming the first violated
    /// constraint. Callers must treat any error as fatal.
    pub fn validate(&self, auction_denom: &str) -> Result<(), SettleError> {
        let mut seen = std::collections::BTreeSet::new();
        for epoch in &self.epochs {
            if epoch.identifier.is_empty() {
                return invalid("epoch identifier must not be empty");
            }
            if epoch.duration_secs == 0 {
                return invalid(format!(
                    "epoch '{}' has zero duration",
                    epoch.identifier
                ));
            }
            if !seen.insert(epoch.identifier.clone()) {
                return invalid(format!(
                    "duplicate epoch identifier '{}'",
                    epoch.identifier
                ));
            }
        }

        if let Some(bid) = &self.auction.highest_bid {
            if bid.amount.denom != auction_denom {
                return invalid(format!(
                    "genesis bid denom '{}' does not match auction denom '{auction_denom}'",
                    bid.amount.denom
                ));
            }
            if bid.amount.amount > 0 && bid.sender.is_none() {
                return invalid("genesis bid has a positive amount but no sender");
            }
        }

        let params = &self.incentives.params;
        if params.allocation_limit.is_zero() {
            return invalid("allocation limit must be positive");
        }
        if params.incentives_epoch_identifier.is_empty() {
            return invalid("incentives epoch identifier must not be empty");
        }
        if !seen.contains(&params.incentives_epoch_identifier) {
            return invalid(format!(
                "incentives epoch identifier '{}' is not a tracked epoch",
                params.incentives_epoch_identifier
            ));
        }

        // Rebuildable allocation meters must respect both caps, and gas
        // meters may only reference live incentives.
        let mut totals: BTreeMap<&str, Fraction> = BTreeMap::new();
        let mut contracts = std::collections::BTreeSet::new();
        for incentive in &self.incentives.incentives {
            if !contracts.insert(incentive.contract) {
                return invalid(format!(
                    "duplicate incentive for contract {}",
                    incentive.contract
                ));
            }
            if incentive.remaining_epochs == 0 {
                return invalid(format!(
                    "incentive for {} has zero remaining epochs",
                    incentive.contract
                ));
            }
            for alloc in &incentive.allocations {
                if alloc.fraction.is_zero() {
                    return invalid(format!(
                        "zero allocation for '{}' on {}",
                        alloc.denom, incentive.contract
                    ));
                }
                if alloc.fraction > params.allocation_limit {
                    return invalid(format!(
                        "allocation {} for '{}' exceeds the limit {}",
                        alloc.fraction, alloc.denom, params.allocation_limit
                    ));
                }
                let total = totals.entry(alloc.denom.as_str()).or_default();
                *total = total.checked_add(alloc.fraction).ok_or_else(|| {
                    SettleError::InvalidGenesis {
                        message: format!(
                            "allocations for '{}' exceed 100%",
                            alloc.denom
                        ),
                    }
                })?;
            }
        }
        for meter in &self.incentives.gas_meters {
            if !contracts.contains(&meter.contract) {
                return invalid(format!(
                    "gas meter references contract {} with no live incentive",
                    meter.contract
                ));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), SettleError> {
    Err(SettleError::InvalidGenesis {
        message: message.into(),
    })
}
