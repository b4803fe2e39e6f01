//! Weekly burn auction.
//!
//! Users escrow increasing bids in the auction denomination against a basket
//! of assets held by the auction module account. At the end of every weekly
//! epoch the winning bid is burned, the basket is paid to the winner, and the
//! collector account's accumulated deposits roll over into the next round's
//! basket.

use tideflow_types::{
    attr, event_type, Address, AuctionParams, Bid, Coin, Coins, Event, Result, SettleError,
    AUCTIONS_MODULE_NAME, AUCTION_COLLECTOR_NAME, WEEK_EPOCH_ID,
};

use crate::{keys, BankKeeper, Context, EpochHooks};

/// Keeper for the auction module.
///
/// Stateless over the store; safe to clone for hook registration.
#[derive(Debug, Clone)]
pub struct AuctionsKeeper<B> {
    bank: B,
    /// Denomination bids must be placed in; the burned denom at settlement.
    base_denom: String,
    /// Address allowed to update parameters.
    authority: Address,
    /// Auction module account, derived once at construction.
    module_address: Address,
    /// Collector module account, derived once at construction.
    collector_address: Address,
}

impl<B: BankKeeper> AuctionsKeeper<B> {
    /// Creates the keeper.
    pub fn new(bank: B, base_denom: impl Into<String>, authority: Address) -> Self {
        Self {
            bank,
            base_denom: base_denom.into(),
            authority,
            module_address: Address::from_module_name(AUCTIONS_MODULE_NAME),
            collector_address: Address::from_module_name(AUCTION_COLLECTOR_NAME),
        }
    }

    /// The auction denomination.
    pub fn base_denom(&self) -> &str {
        &self.base_denom
    }

    /// The auction module account address.
    pub fn module_address(&self) -> Address {
        self.module_address
    }

    /// The collector module account address.
    pub fn collector_address(&self) -> Address {
        self.collector_address
    }

    /// Current parameters; defaults apply before genesis wrote any.
    pub fn params(&self, ctx: &Context<'_>) -> Result<AuctionParams> {
        Ok(ctx
            .get_value(&keys::AUCTION_PARAMS_KEY)?
            .unwrap_or_default())
    }

    /// Writes parameters.
    pub fn set_params(&self, ctx: &mut Context<'_>, params: &AuctionParams) -> Result<()> {
        ctx.set_value(keys::AUCTION_PARAMS_KEY.to_vec(), params)
    }

    /// Authority-gated parameter update.
    pub fn update_params(
        &self,
        ctx: &mut Context<'_>,
        signer: &Address,
        params: &AuctionParams,
    ) -> Result<()> {
        if *signer != self.authority {
            return Err(SettleError::Unauthorized {
                expected: self.authority,
                got: *signer,
            });
        }
        self.set_params(ctx, params)
    }

    /// Current round counter; zero before the first settlement.
    pub fn round(&self, ctx: &Context<'_>) -> u64 {
        match ctx.get_raw(&keys::AUCTION_ROUND_KEY) {
            Some(bytes) => {
                let mut buf = [0u8; 8];
                let len = bytes.len().min(8);
                buf[8 - len..].copy_from_slice(&bytes[..len]);
                u64::from_be_bytes(buf)
            }
            None => 0,
        }
    }

    /// Writes the round counter.
    pub fn set_round(&self, ctx: &mut Context<'_>, round: u64) {
        ctx.set_raw(keys::AUCTION_ROUND_KEY.to_vec(), round.to_be_bytes().to_vec());
    }

    /// Current highest bid; the empty bid when none is stored.
    pub fn highest_bid(&self, ctx: &Context<'_>) -> Result<Bid> {
        Ok(ctx
            .get_value(&keys::BID_KEY)?
            .unwrap_or_else(|| Bid::none(self.base_denom.as_str())))
    }

    /// Writes the highest bid.
    pub fn set_highest_bid(&self, ctx: &mut Context<'_>, bid: &Bid) -> Result<()> {
        ctx.set_value(keys::BID_KEY.to_vec(), bid)
    }

    /// Deletes the highest bid, returning the store to the "no bid" state.
    pub fn delete_highest_bid(&self, ctx: &mut Context<'_>) {
        ctx.delete_raw(&keys::BID_KEY);
    }

    /// Places a bid.
    ///
    /// Validated eagerly: the module must be enabled, the denomination must
    /// match, and the amount must strictly exceed the current highest bid.
    /// On success the new bid is escrowed before the previous bidder is
    /// refunded, so the module account never owes more than it holds. The
    /// escrow/refund/record sequence runs in a shadow: a failure anywhere
    /// leaves no partial effect.
    pub fn bid(&self, ctx: &mut Context<'_>, sender: &Address, amount: Coin) -> Result<()> {
        let params = self.params(ctx)?;
        if !params.enable_auction {
            return Err(SettleError::ModuleDisabled {
                module: AUCTIONS_MODULE_NAME.to_string(),
            });
        }
        if amount.denom != self.base_denom {
            return Err(SettleError::InvalidDenom {
                expected: self.base_denom.clone(),
                got: amount.denom,
            });
        }
        let current = self.highest_bid(ctx)?;
        if amount.amount <= current.amount.amount {
            return Err(SettleError::BidTooLow {
                bid: amount.amount,
                highest: current.amount.amount,
            });
        }

        ctx.with_shadow(|shadow| {
            self.bank.send_from_account_to_module(
                shadow,
                sender,
                AUCTIONS_MODULE_NAME,
                &Coins::from(amount.clone()),
            )?;
            if let Some(previous) = current.sender {
                self.bank.send_from_module_to_account(
                    shadow,
                    AUCTIONS_MODULE_NAME,
                    &previous,
                    &Coins::from(current.amount.clone()),
                )?;
            }
            self.set_highest_bid(
                shadow,
                &Bid {
                    sender: Some(*sender),
                    amount: amount.clone(),
                },
            )?;
            shadow.emit(
                Event::new(event_type::BID)
                    .attr(attr::SENDER, sender)
                    .attr(attr::AMOUNT, &amount),
            );
            Ok(())
        })
    }

    /// Deposits assets for the *next* auction round.
    ///
    /// Funds go to the collector module account and only enter the auctioned
    /// basket when settlement sweeps the collector.
    pub fn deposit(&self, ctx: &mut Context<'_>, sender: &Address, amount: Coin) -> Result<()> {
        let params = self.params(ctx)?;
        if !params.enable_auction {
            return Err(SettleError::ModuleDisabled {
                module: AUCTIONS_MODULE_NAME.to_string(),
            });
        }
        self.bank.send_from_account_to_module(
            ctx,
            sender,
            AUCTION_COLLECTOR_NAME,
            &Coins::from(amount.clone()),
        )?;
        ctx.emit(
            Event::new(event_type::DEPOSIT)
                .attr(attr::SENDER, sender)
                .attr(attr::AMOUNT, &amount),
        );
        Ok(())
    }

    /// Settles the current round inside an already-open shadow.
    ///
    /// Step order matters: the payout reads the module balance after the
    /// burn, and the collector sweep lands after the payout so swept funds
    /// belong to the next round.
    fn settle(&self, ctx: &mut Context<'_>) -> Result<()> {
        let bid = self.highest_bid(ctx)?;
        let round = self.round(ctx);

        if let (true, Some(winner)) = (bid.is_payable(), bid.sender) {
            self.bank.burn_from_module(
                ctx,
                AUCTIONS_MODULE_NAME,
                &Coins::from(bid.amount.clone()),
            )?;
            let basket = self
                .bank
                .all_balances(ctx, &self.module_address)?
                .without(&self.base_denom);
            if !basket.is_empty() {
                self.bank.send_from_module_to_account(
                    ctx,
                    AUCTIONS_MODULE_NAME,
                    &winner,
                    &basket,
                )?;
            }
            self.delete_highest_bid(ctx);
            ctx.emit(
                Event::new(event_type::AUCTION_END)
                    .attr(attr::WINNER, winner)
                    .attr(attr::AMOUNT, &basket)
                    .attr(attr::BURNED, &bid.amount)
                    .attr(attr::ROUND, round),
            );
            tracing::debug!(
                winner = %winner,
                burned = %bid.amount,
                basket = %basket,
                round,
                "auction settled"
            );
        }

        // Round advance and collector sweep happen every weekly boundary,
        // with or without a payable bid.
        self.set_round(ctx, round + 1);
        let collected = self.bank.all_balances(ctx, &self.collector_address)?;
        if !collected.is_empty() {
            self.bank.send_from_module_to_module(
                ctx,
                AUCTION_COLLECTOR_NAME,
                AUCTIONS_MODULE_NAME,
                &collected,
            )?;
        }
        Ok(())
    }
}

impl<B: BankKeeper> EpochHooks for AuctionsKeeper<B> {
    /// Settlement trigger: fires only for the weekly identifier while the
    /// module is enabled. The whole pass runs in one shadow whose commit is
    /// the final operation; any failure rolls back burn, payout, bid
    /// deletion, round advance, and sweep together.
    fn after_epoch_end(
        &self,
        ctx: &mut Context<'_>,
        identifier: &str,
        _epoch: u64,
    ) -> Result<()> {
        if identifier != WEEK_EPOCH_ID {
            return Ok(());
        }
        match self.params(ctx) {
            Ok(params) if params.enable_auction => {}
            Ok(_) => return Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "failed to read auction params; skipping settlement");
                return Ok(());
            }
        }
        if let Err(err) = ctx.with_shadow(|shadow| self.settle(shadow)) {
            let round = self.round(ctx);
            tracing::error!(
                round,
                error = %err,
                "auction settlement failed; round left unsettled"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tideflow_store::MemStore;

    use crate::LedgerBank;

    const DENOM: &str = "atide";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn keeper() -> AuctionsKeeper<LedgerBank> {
        AuctionsKeeper::new(LedgerBank, DENOM, Address::from_module_name("gov"))
    }

    fn fund_account(ctx: &mut Context<'_>, address: &Address, coin: Coin) {
        let coins = Coins::from(coin);
        LedgerBank
            .mint_to_module(ctx, "faucet", &coins)
            .expect("mint");
        LedgerBank
            .send_from_module_to_account(ctx, "faucet", address, &coins)
            .expect("fund");
    }

    fn fund_module(ctx: &mut Context<'_>, module: &str, coin: Coin) {
        LedgerBank
            .mint_to_module(ctx, module, &Coins::from(coin))
            .expect("mint to module");
    }

    #[test]
    fn test_bid_rejected_when_disabled() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let alice = Address::new([1; 20]);
        fund_account(&mut ctx, &alice, Coin::new(DENOM, 100));
        keeper
            .set_params(&mut ctx, &AuctionParams {
                enable_auction: false,
            })
            .expect("params");

        let err = keeper
            .bid(&mut ctx, &alice, Coin::new(DENOM, 100))
            .expect_err("disabled");
        assert!(matches!(err, SettleError::ModuleDisabled { .. }));
        // No escrow, no stored bid.
        assert_eq!(
            LedgerBank.balance(&ctx, &alice, DENOM).unwrap(),
            100,
            "balance must be untouched"
        );
        assert_eq!(keeper.highest_bid(&ctx).unwrap(), Bid::none(DENOM));
    }

    #[test]
    fn test_bid_rejected_wrong_denom() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let alice = Address::new([1; 20]);
        let err = keeper
            .bid(&mut ctx, &alice, Coin::new("btoken", 100))
            .expect_err("wrong denom");
        assert!(matches!(err, SettleError::InvalidDenom { .. }));
    }

    #[test]
    fn test_sequential_bids_refund_previous_bidder() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let alice = Address::new([1; 20]);
        let bob = Address::new([2; 20]);
        fund_account(&mut ctx, &alice, Coin::new(DENOM, 100));
        fund_account(&mut ctx, &bob, Coin::new(DENOM, 150));

        keeper
            .bid(&mut ctx, &alice, Coin::new(DENOM, 100))
            .expect("first bid");
        assert_eq!(LedgerBank.balance(&ctx, &alice, DENOM).unwrap(), 0);

        // Equal bid is rejected: strictly greater required.
        let err = keeper
            .bid(&mut ctx, &bob, Coin::new(DENOM, 100))
            .expect_err("equal bid");
        assert!(matches!(
            err,
            SettleError::BidTooLow {
                bid: 100,
                highest: 100
            }
        ));

        keeper
            .bid(&mut ctx, &bob, Coin::new(DENOM, 150))
            .expect("outbid");
        // Alice got her escrow back; the module holds only Bob's bid.
        assert_eq!(LedgerBank.balance(&ctx, &alice, DENOM).unwrap(), 100);
        assert_eq!(LedgerBank.balance(&ctx, &bob, DENOM).unwrap(), 0);
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), DENOM)
                .unwrap(),
            150
        );
        let highest = keeper.highest_bid(&ctx).unwrap();
        assert_eq!(highest.sender, Some(bob));
        assert_eq!(highest.amount, Coin::new(DENOM, 150));
    }

    #[test]
    fn test_bid_without_funds_leaves_no_partial_state() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let charlie = Address::new([3; 20]);

        let err = keeper
            .bid(&mut ctx, &charlie, Coin::new(DENOM, 50))
            .expect_err("no funds");
        assert!(matches!(err, SettleError::InsufficientFunds { .. }));
        assert_eq!(keeper.highest_bid(&ctx).unwrap(), Bid::none(DENOM));
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), DENOM)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_deposit_accumulates_in_collector() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let alice = Address::new([1; 20]);
        fund_account(&mut ctx, &alice, Coin::new("btoken", 40));

        keeper
            .deposit(&mut ctx, &alice, Coin::new("btoken", 40))
            .expect("deposit");
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.collector_address(), "btoken")
                .unwrap(),
            40
        );
        // Deposits never touch the live auction basket.
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), "btoken")
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_deposit_rejected_when_disabled() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        keeper
            .set_params(&mut ctx, &AuctionParams {
                enable_auction: false,
            })
            .expect("params");
        let err = keeper
            .deposit(&mut ctx, &Address::new([1; 20]), Coin::new(DENOM, 1))
            .expect_err("disabled");
        assert!(matches!(err, SettleError::ModuleDisabled { .. }));
    }

    #[test]
    fn test_weekly_settlement_pays_winner() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 10, t0());
        let bob = Address::new([2; 20]);
        fund_account(&mut ctx, &bob, Coin::new(DENOM, 150));
        keeper
            .bid(&mut ctx, &bob, Coin::new(DENOM, 150))
            .expect("bid");
        // The basket up for auction and some accrued fees for next round.
        fund_module(&mut ctx, AUCTIONS_MODULE_NAME, Coin::new("btoken", 5));
        fund_module(&mut ctx, AUCTION_COLLECTOR_NAME, Coin::new("fee", 1));

        keeper
            .after_epoch_end(&mut ctx, WEEK_EPOCH_ID, 2)
            .expect("hook");

        // Winning bid burned, basket paid out, bid cleared, round advanced.
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), DENOM)
                .unwrap(),
            0
        );
        assert!(!LedgerBank.has_supply(&ctx, DENOM).unwrap(), "bid must be burned");
        assert_eq!(LedgerBank.balance(&ctx, &bob, "btoken").unwrap(), 5);
        assert_eq!(keeper.highest_bid(&ctx).unwrap(), Bid::none(DENOM));
        assert_eq!(keeper.round(&ctx), 1);
        // Collector swept into the module for the next round.
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.collector_address(), "fee")
                .unwrap(),
            0
        );
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), "fee")
                .unwrap(),
            1
        );
        assert!(ctx
            .events()
            .iter()
            .any(|e| e.kind == event_type::AUCTION_END));
    }

    #[test]
    fn test_non_weekly_epoch_is_noop() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 10, t0());
        let bob = Address::new([2; 20]);
        fund_account(&mut ctx, &bob, Coin::new(DENOM, 150));
        keeper
            .bid(&mut ctx, &bob, Coin::new(DENOM, 150))
            .expect("bid");

        keeper.after_epoch_end(&mut ctx, "day", 2).expect("hook");

        assert_eq!(keeper.round(&ctx), 0);
        assert_eq!(keeper.highest_bid(&ctx).unwrap().sender, Some(bob));
    }

    #[test]
    fn test_disabled_module_skips_settlement() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 10, t0());
        keeper
            .set_params(&mut ctx, &AuctionParams {
                enable_auction: false,
            })
            .expect("params");
        keeper
            .after_epoch_end(&mut ctx, WEEK_EPOCH_ID, 2)
            .expect("hook");
        assert_eq!(keeper.round(&ctx), 0);
    }

    #[test]
    fn test_settlement_without_bid_still_advances_round() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 10, t0());
        fund_module(&mut ctx, AUCTION_COLLECTOR_NAME, Coin::new("fee", 7));

        keeper
            .after_epoch_end(&mut ctx, WEEK_EPOCH_ID, 2)
            .expect("hook");

        assert_eq!(keeper.round(&ctx), 1);
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.module_address(), "fee")
                .unwrap(),
            7
        );
    }

    #[test]
    fn test_failed_settlement_rolls_back_completely() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 10, t0());
        // A recorded bid with no matching escrow: the burn must fail.
        let bob = Address::new([2; 20]);
        keeper
            .set_highest_bid(&mut ctx, &Bid {
                sender: Some(bob),
                amount: Coin::new(DENOM, 150),
            })
            .expect("seed bid");
        fund_module(&mut ctx, AUCTION_COLLECTOR_NAME, Coin::new("fee", 7));

        keeper
            .after_epoch_end(&mut ctx, WEEK_EPOCH_ID, 2)
            .expect("hook never propagates settlement errors");

        // Everything identical to the pre-settlement state.
        assert_eq!(keeper.round(&ctx), 0, "round must not advance");
        assert_eq!(keeper.highest_bid(&ctx).unwrap().sender, Some(bob));
        assert_eq!(
            LedgerBank
                .balance(&ctx, &keeper.collector_address(), "fee")
                .unwrap(),
            7,
            "sweep must be rolled back"
        );
        assert!(ctx.events().is_empty(), "no settlement event may leak");
    }

    #[test]
    fn test_update_params_requires_authority() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, 1, t0());
        let mallory = Address::new([7; 20]);
        let err = keeper
            .update_params(&mut ctx, &mallory, &AuctionParams {
                enable_auction: false,
            })
            .expect_err("not the authority");
        assert!(matches!(err, SettleError::Unauthorized { .. }));

        let gov = Address::from_module_name("gov");
        keeper
            .update_params(&mut ctx, &gov, &AuctionParams {
                enable_auction: false,
            })
            .expect("authority may update");
        assert!(!keeper.params(&ctx).unwrap().enable_auction);
    }
}
