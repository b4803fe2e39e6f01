//! Genesis initialization and export.
//!
//! Initialization is all-or-nothing: the genesis state is validated up front
//! and any violation aborts startup before a single record is written.

use tideflow_types::{
    AuctionGenesis, EpochInfo, Fraction, GenesisState, IncentivesGenesis, Result,
};

use crate::{
    keys, AccountClassifier, AuctionsKeeper, BankKeeper, Context, EpochsKeeper,
    IncentivesKeeper,
};

/// Materializes the genesis state into the store.
///
/// Epoch records adopt the genesis block time when no start time was
/// configured; allocation meters are rebuilt from the live incentives rather
/// than trusted from input.
///
/// # Errors
///
/// Returns [`tideflow_types::SettleError::InvalidGenesis`] (fatal) if the
/// state fails validation. Nothing is written on the error path.
pub fn init_genesis<B: BankKeeper, C: AccountClassifier>(
    ctx: &mut Context<'_>,
    epochs: &EpochsKeeper,
    auctions: &AuctionsKeeper<B>,
    incentives: &IncentivesKeeper<B, C>,
    genesis: &GenesisState,
) -> Result<()> {
    genesis.validate(auctions.base_denom())?;

    for epoch in &genesis.epochs {
        let start_time = epoch.start_time.unwrap_or_else(|| ctx.time());
        let info = EpochInfo {
            identifier: epoch.identifier.clone(),
            start_time,
            duration_secs: epoch.duration_secs,
            current_epoch: 0,
            current_epoch_start_time: start_time,
            epoch_counting_started: false,
            current_epoch_start_height: ctx.height(),
        };
        epochs.set_epoch_info(ctx, &info)?;
    }

    auctions.set_params(ctx, &genesis.auction.params)?;
    auctions.set_round(ctx, genesis.auction.round);
    if let Some(bid) = &genesis.auction.highest_bid {
        auctions.set_highest_bid(ctx, bid)?;
    }

    incentives.set_params(ctx, &genesis.incentives.params)?;
    let mut totals: std::collections::BTreeMap<String, Fraction> =
        std::collections::BTreeMap::new();
    for incentive in &genesis.incentives.incentives {
        incentives.set_incentive(ctx, incentive)?;
        for alloc in &incentive.allocations {
            let total = totals.entry(alloc.denom.clone()).or_default();
            // Validation already proved the sum stays within one.
            *total = total.checked_add(alloc.fraction).unwrap_or(Fraction::ONE);
        }
    }
    for (denom, total) in totals {
        ctx.set_value(keys::allocation_meter_key(&denom), &total)?;
    }
    for meter in &genesis.incentives.gas_meters {
        ctx.set_raw(
            keys::gas_meter_key(&meter.contract, &meter.participant),
            meter.cumulative_gas.to_be_bytes().to_vec(),
        );
    }

    Ok(())
}

/// Reads the full settlement state back out of the store.
pub fn export_genesis<B: BankKeeper, C: AccountClassifier>(
    ctx: &Context<'_>,
    epochs: &EpochsKeeper,
    auctions: &AuctionsKeeper<B>,
    incentives: &IncentivesKeeper<B, C>,
) -> Result<GenesisState> {
    let epoch_entries = epochs
        .all_epoch_infos(ctx)?
        .into_iter()
        .map(|info| tideflow_types::EpochGenesis {
            identifier: info.identifier,
            start_time: Some(info.start_time),
            duration_secs: info.duration_secs,
        })
        .collect();

    let highest_bid = ctx.get_value(&keys::BID_KEY)?;

    let live = incentives.all_incentives(ctx)?;
    let mut gas_meters = Vec::new();
    for incentive in &live {
        gas_meters.extend(incentives.gas_meters(ctx, &incentive.contract));
    }

    Ok(GenesisState {
        epochs: epoch_entries,
        auction: AuctionGenesis {
            params: auctions.params(ctx)?,
            round: auctions.round(ctx),
            highest_bid,
        },
        incentives: IncentivesGenesis {
            params: incentives.params(ctx)?,
            incentives: live,
            gas_meters,
        },
    })
}
