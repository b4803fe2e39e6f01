//! Gas-metered incentive distribution.
//!
//! Contracts register incentives reserving fractional shares of the module
//! account's balances. A per-transaction hook meters gas spent by externally
//! owned accounts against incentivized contracts; at the end of every
//! configured epoch the module pays each participant a reward proportional
//! to their share of the contract's metered gas.
//!
//! Two caps guard the reserve: no single allocation may exceed the
//! per-incentive limit, and the committed fractions per denomination may
//! never sum above one. Allocation meters track the committed sums.

use tideflow_types::{
    attr, event_type, Address, Allocation, Coin, Coins, Event, Fraction, GasMeter, Incentive,
    IncentiveParams, Result, SettleError, INCENTIVES_MODULE_NAME,
};

use crate::{keys, BankKeeper, Context, EpochHooks};

/// Distinguishes externally owned accounts from contract accounts.
///
/// The interpreter module owns this knowledge; the engine only consumes it
/// to keep contract-to-contract traffic out of the reward pool.
pub trait AccountClassifier {
    /// Whether `address` is an externally owned account.
    fn is_externally_owned(&self, ctx: &Context<'_>, address: &Address) -> bool;
}

/// Keeper for the incentives module.
///
/// Stateless over the store; safe to clone for hook registration.
#[derive(Debug, Clone)]
pub struct IncentivesKeeper<B, C> {
    bank: B,
    classifier: C,
    /// The protocol's native mint denomination; exempt from the supply check
    /// because it always circulates.
    mint_denom: String,
    /// Address allowed to update parameters.
    authority: Address,
    /// Incentives module account, derived once at construction.
    module_address: Address,
}

impl<B: BankKeeper, C: AccountClassifier> IncentivesKeeper<B, C> {
    /// Creates the keeper.
    pub fn new(
        bank: B,
        classifier: C,
        mint_denom: impl Into<String>,
        authority: Address,
    ) -> Self {
        Self {
            bank,
            classifier,
            mint_denom: mint_denom.into(),
            authority,
            module_address: Address::from_module_name(INCENTIVES_MODULE_NAME),
        }
    }

    /// The incentives module account address.
    pub fn module_address(&self) -> Address {
        self.module_address
    }

    /// Current parameters; defaults apply before genesis wrote any.
    pub fn params(&self, ctx: &Context<'_>) -> Result<IncentiveParams> {
        Ok(ctx
            .get_value(&keys::INCENTIVE_PARAMS_KEY)?
            .unwrap_or_default())
    }

    /// Writes parameters.
    pub fn set_params(&self, ctx: &mut Context<'_>, params: &IncentiveParams) -> Result<()> {
        ctx.set_value(keys::INCENTIVE_PARAMS_KEY.to_vec(), params)
    }

    /// Authority-gated parameter update.
    pub fn update_params(
        &self,
        ctx: &mut Context<'_>,
        signer: &Address,
        params: &IncentiveParams,
    ) -> Result<()> {
        if *signer != self.authority {
            return Err(SettleError::Unauthorized {
                expected: self.authority,
                got: *signer,
            });
        }
        self.set_params(ctx, params)
    }

    /// Reads one incentive.
    pub fn incentive(&self, ctx: &Context<'_>, contract: &Address) -> Result<Option<Incentive>> {
        ctx.get_value(&keys::incentive_key(contract))
    }

    /// Writes one incentive.
    pub fn set_incentive(&self, ctx: &mut Context<'_>, incentive: &Incentive) -> Result<()> {
        ctx.set_value(keys::incentive_key(&incentive.contract), incentive)
    }

    /// Deletes one incentive record (no rebate; see [`Self::cancel_incentive`]).
    pub fn delete_incentive(&self, ctx: &mut Context<'_>, contract: &Address) {
        ctx.delete_raw(&keys::incentive_key(contract));
    }

    /// All live incentives, in contract-address order.
    pub fn all_incentives(&self, ctx: &Context<'_>) -> Result<Vec<Incentive>> {
        ctx.prefix_scan(&keys::incentive_prefix())
            .into_iter()
            .map(|(_, bytes)| tideflow_types::decode(&bytes).map_err(Into::into))
            .collect()
    }

    /// Committed allocation total for a denom; zero when no meter exists.
    pub fn allocation_meter(&self, ctx: &Context<'_>, denom: &str) -> Result<Fraction> {
        Ok(ctx
            .get_value(&keys::allocation_meter_key(denom))?
            .unwrap_or(Fraction::ZERO))
    }

    /// Writes an allocation meter, deleting the record at zero.
    fn set_allocation_meter(
        &self,
        ctx: &mut Context<'_>,
        denom: &str,
        total: Fraction,
    ) -> Result<()> {
        let key = keys::allocation_meter_key(denom);
        if total.is_zero() {
            ctx.delete_raw(&key);
            Ok(())
        } else {
            ctx.set_value(key, &total)
        }
    }

    /// Metered gas for `(contract, participant)`; zero when absent.
    pub fn gas_meter(
        &self,
        ctx: &Context<'_>,
        contract: &Address,
        participant: &Address,
    ) -> u64 {
        match ctx.get_raw(&keys::gas_meter_key(contract, participant)) {
            Some(bytes) => {
                let mut buf = [0u8; 8];
                let len = bytes.len().min(8);
                buf[8 - len..].copy_from_slice(&bytes[..len]);
                u64::from_be_bytes(buf)
            }
            None => 0,
        }
    }

    fn set_gas_meter(
        &self,
        ctx: &mut Context<'_>,
        contract: &Address,
        participant: &Address,
        gas: u64,
    ) {
        ctx.set_raw(
            keys::gas_meter_key(contract, participant),
            gas.to_be_bytes().to_vec(),
        );
    }

    fn delete_gas_meter(&self, ctx: &mut Context<'_>, contract: &Address, participant: &Address) {
        ctx.delete_raw(&keys::gas_meter_key(contract, participant));
    }

    /// All gas meters of one contract, in participant-address order.
    pub fn gas_meters(&self, ctx: &Context<'_>, contract: &Address) -> Vec<GasMeter> {
        let prefix = keys::gas_meter_contract_prefix(contract);
        ctx.prefix_scan(&prefix)
            .into_iter()
            .filter_map(|(key, bytes)| {
                let suffix = key.get(prefix.len()..)?;
                let participant: [u8; 20] = suffix.try_into().ok()?;
                let mut buf = [0u8; 8];
                let len = bytes.len().min(8);
                buf[8 - len..].copy_from_slice(&bytes[..len]);
                Some(GasMeter {
                    contract: *contract,
                    participant: Address::new(participant),
                    cumulative_gas: u64::from_be_bytes(buf),
                })
            })
            .collect()
    }

    /// Registers an incentive for `contract`.
    ///
    /// Validated eagerly: module enabled, no duplicate registration, every
    /// allocation positive and within the per-incentive limit, non-mint
    /// denominations backed by circulating supply, and no denomination's
    /// committed total pushed above one. Nothing is written until every
    /// check passes.
    pub fn register_incentive(
        &self,
        ctx: &mut Context<'_>,
        contract: Address,
        allocations: Vec<Allocation>,
        epochs: u32,
    ) -> Result<Incentive> {
        let params = self.params(ctx)?;
        if !params.enable_incentives {
            return Err(SettleError::ModuleDisabled {
                module: INCENTIVES_MODULE_NAME.to_string(),
            });
        }
        if self.incentive(ctx, &contract)?.is_some() {
            return Err(SettleError::IncentiveExists { contract });
        }
        if epochs == 0 {
            return Err(SettleError::InvalidRequest {
                message: "incentive must run for at least one epoch".to_string(),
            });
        }
        if allocations.is_empty() {
            return Err(SettleError::InvalidRequest {
                message: "incentive needs at least one allocation".to_string(),
            });
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut updated_meters = Vec::with_capacity(allocations.len());
        for alloc in &allocations {
            if !seen.insert(alloc.denom.clone()) {
                return Err(SettleError::InvalidRequest {
                    message: format!("duplicate allocation denom '{}'", alloc.denom),
                });
            }
            if alloc.fraction.is_zero() {
                return Err(SettleError::InvalidRequest {
                    message: format!("zero allocation for denom '{}'", alloc.denom),
                });
            }
            if alloc.denom != self.mint_denom && !self.bank.has_supply(ctx, &alloc.denom)? {
                return Err(SettleError::NoSupply {
                    denom: alloc.denom.clone(),
                });
            }
            if alloc.fraction > params.allocation_limit {
                return Err(SettleError::AllocationOverLimit {
                    denom: alloc.denom.clone(),
                    fraction: alloc.fraction,
                    limit: params.allocation_limit,
                });
            }
            let committed = self.allocation_meter(ctx, &alloc.denom)?;
            let total = committed.checked_add(alloc.fraction).ok_or_else(|| {
                SettleError::AllocationOverflow {
                    denom: alloc.denom.clone(),
                    current: committed,
                    requested: alloc.fraction,
                }
            })?;
            updated_meters.push((alloc.denom.clone(), total));
        }

        let incentive = Incentive {
            contract,
            allocations,
            remaining_epochs: epochs,
            start_time: ctx.time(),
            total_gas: 0,
        };
        self.set_incentive(ctx, &incentive)?;
        for (denom, total) in updated_meters {
            self.set_allocation_meter(ctx, &denom, total)?;
        }
        ctx.emit(
            Event::new(event_type::REGISTER_INCENTIVE)
                .attr(attr::CONTRACT, contract)
                .attr(attr::EPOCHS, epochs)
                .attr(attr::ALLOCATIONS, render_allocations(&incentive.allocations)),
        );
        Ok(incentive)
    }

    /// Cancels a live incentive: deletes it, rebates its fractions from the
    /// allocation meters, and drops any residual gas meters.
    pub fn cancel_incentive(&self, ctx: &mut Context<'_>, contract: &Address) -> Result<()> {
        let params = self.params(ctx)?;
        if !params.enable_incentives {
            return Err(SettleError::ModuleDisabled {
                module: INCENTIVES_MODULE_NAME.to_string(),
            });
        }
        let incentive = self
            .incentive(ctx, contract)?
            .ok_or(SettleError::IncentiveNotFound {
                contract: *contract,
            })?;

        self.remove_incentive(ctx, &incentive)?;
        ctx.emit(Event::new(event_type::CANCEL_INCENTIVE).attr(attr::CONTRACT, contract));
        Ok(())
    }

    /// Deletes an incentive together with its meter rebate and gas meters.
    fn remove_incentive(&self, ctx: &mut Context<'_>, incentive: &Incentive) -> Result<()> {
        self.delete_incentive(ctx, &incentive.contract);
        self.rebate_allocations(ctx, &incentive.allocations)?;
        for meter in self.gas_meters(ctx, &incentive.contract) {
            self.delete_gas_meter(ctx, &incentive.contract, &meter.participant);
        }
        Ok(())
    }

    /// Subtracts an incentive's fractions back out of the allocation meters.
    fn rebate_allocations(
        &self,
        ctx: &mut Context<'_>,
        allocations: &[Allocation],
    ) -> Result<()> {
        for alloc in allocations {
            let committed = self.allocation_meter(ctx, &alloc.denom)?;
            let rebated = committed.checked_sub(alloc.fraction).unwrap_or_else(|| {
                tracing::warn!(
                    denom = %alloc.denom,
                    committed = %committed,
                    rebate = %alloc.fraction,
                    "allocation meter underflow; clamping to zero"
                );
                Fraction::ZERO
            });
            self.set_allocation_meter(ctx, &alloc.denom, rebated)?;
        }
        Ok(())
    }

    /// Effect of the per-transaction hook: meters `gas` against `contract`.
    ///
    /// Inert unless the module is enabled, the contract has a live
    /// incentive, and the participant is an externally owned account.
    /// Counters saturate rather than wrap; a saturated meter is a bounded
    /// accounting loss, never a consensus fault.
    pub fn record_usage(
        &self,
        ctx: &mut Context<'_>,
        contract: &Address,
        participant: &Address,
        gas: u64,
    ) -> Result<()> {
        let params = self.params(ctx)?;
        if !params.enable_incentives {
            return Ok(());
        }
        let mut incentive = match self.incentive(ctx, contract)? {
            Some(incentive) => incentive,
            None => return Ok(()),
        };
        if !self.classifier.is_externally_owned(ctx, participant) {
            return Ok(());
        }

        incentive.total_gas = incentive.total_gas.saturating_add(gas);
        self.set_incentive(ctx, &incentive)?;
        let metered = self.gas_meter(ctx, contract, participant).saturating_add(gas);
        self.set_gas_meter(ctx, contract, participant, metered);
        tracing::debug!(
            contract = %contract,
            participant = %participant,
            gas,
            metered,
            "metered incentivized usage"
        );
        Ok(())
    }

    /// Pays one incentive's participants and advances its lifecycle.
    ///
    /// Allocated amounts are snapshotted against the module balance before
    /// any payout, so earlier participants do not shrink later rewards. A
    /// failed participant transfer is logged and skipped with the gas meter
    /// left intact for retry; everyone else still gets paid.
    fn distribute_for(&self, ctx: &mut Context<'_>, mut incentive: Incentive) -> Result<()> {
        let contract = incentive.contract;
        let total_gas = incentive.total_gas;

        let mut allocated = Vec::with_capacity(incentive.allocations.len());
        for alloc in &incentive.allocations {
            let balance = self.bank.balance(ctx, &self.module_address, &alloc.denom)?;
            allocated.push((alloc.denom.clone(), alloc.fraction.mul_floor(balance)));
        }

        // Gas retained by participants whose payout failed. Carrying it into
        // the next interval's total keeps every meter <= the total, so a
        // retried payout stays proportional instead of over-paying.
        let mut retained: u64 = 0;
        if total_gas > 0 {
            for meter in self.gas_meters(ctx, &contract) {
                let mut reward = Coins::new();
                for (denom, amount) in &allocated {
                    reward.add(Coin::new(
                        denom.clone(),
                        prorate(*amount, meter.cumulative_gas, total_gas),
                    ));
                }
                if !reward.is_empty() {
                    if let Err(err) = self.bank.send_from_module_to_account(
                        ctx,
                        INCENTIVES_MODULE_NAME,
                        &meter.participant,
                        &reward,
                    ) {
                        tracing::warn!(
                            contract = %contract,
                            participant = %meter.participant,
                            reward = %reward,
                            error = %err,
                            "reward transfer failed; gas meter retained for retry"
                        );
                        retained = retained.saturating_add(meter.cumulative_gas);
                        continue;
                    }
                }
                self.delete_gas_meter(ctx, &contract, &meter.participant);
            }
        }

        incentive.remaining_epochs = incentive.remaining_epochs.saturating_sub(1);
        if incentive.remaining_epochs == 0 {
            self.remove_incentive(ctx, &incentive)?;
        } else {
            incentive.total_gas = retained;
            self.set_incentive(ctx, &incentive)?;
        }
        ctx.emit(
            Event::new(event_type::DISTRIBUTE_INCENTIVES)
                .attr(attr::CONTRACT, contract)
                .attr(attr::EPOCHS, incentive.remaining_epochs),
        );
        Ok(())
    }

    /// Runs the distribution pass for every live incentive.
    ///
    /// Incentives process in contract-address order. An error inside one
    /// incentive is logged and skipped; the remaining incentives still run.
    fn distribute_rewards(&self, ctx: &mut Context<'_>) -> Result<()> {
        for incentive in self.all_incentives(ctx)? {
            let contract = incentive.contract;
            if let Err(err) = self.distribute_for(ctx, incentive) {
                tracing::error!(
                    contract = %contract,
                    error = %err,
                    "incentive distribution failed; continuing with remaining incentives"
                );
            }
        }
        Ok(())
    }
}

impl<B: BankKeeper, C: AccountClassifier> EpochHooks for IncentivesKeeper<B, C> {
    /// Distribution trigger: fires only for the configured identifier while
    /// the module is enabled. The pass runs in one shadow committed at the
    /// end; per-participant failures are handled inside the pass.
    fn after_epoch_end(
        &self,
        ctx: &mut Context<'_>,
        identifier: &str,
        _epoch: u64,
    ) -> Result<()> {
        let params = match self.params(ctx) {
            Ok(params) => params,
            Err(err) => {
                tracing::error!(error = %err, "failed to read incentive params; skipping distribution");
                return Ok(());
            }
        };
        if identifier != params.incentives_epoch_identifier || !params.enable_incentives {
            return Ok(());
        }
        if let Err(err) = ctx.with_shadow(|shadow| self.distribute_rewards(shadow)) {
            tracing::error!(error = %err, "incentive distribution pass failed; state rolled back");
        }
        Ok(())
    }
}

/// Exact `floor(amount * part / total)` without overflow, for `part <= total`.
fn prorate(amount: u128, part: u64, total: u64) -> u128 {
    debug_assert!(part <= total, "participant gas cannot exceed the total");
    if total == 0 {
        return 0;
    }
    let total = u128::from(total);
    let part = u128::from(part);
    let q = amount / total;
    let m = amount % total;
    q * part + m * part / total
}

fn render_allocations(allocations: &[Allocation]) -> String {
    allocations
        .iter()
        .map(|a| format!("{}:{}", a.denom, a.fraction))
        .collect::<Vec<_>>()
        .join(",")
}
