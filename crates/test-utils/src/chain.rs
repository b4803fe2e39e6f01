//! A fully wired settlement engine for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use tideflow_state::{
    init_genesis, AccountClassifier, AuctionsKeeper, BankKeeper, Context, EpochsKeeper,
    IncentivesKeeper, LedgerBank,
};
use tideflow_store::MemStore;
use tideflow_types::{
    Address, Allocation, Bid, Coin, Coins, Event, GenesisState, Incentive, Result,
};

/// Block height of the genesis transition.
pub const GENESIS_HEIGHT: u64 = 1;

/// Classifier treating every address as an externally owned account.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllExternal;

impl AccountClassifier for AllExternal {
    fn is_externally_owned(&self, _ctx: &Context<'_>, _address: &Address) -> bool {
        true
    }
}

/// A complete engine instance over an in-memory store.
///
/// Keepers are wired the way a chain application wires them: the auction
/// keeper subscribes to the scheduler first, the incentives keeper second,
/// and genesis is applied at construction. Events from every tick accumulate
/// in [`TestChain::events`].
pub struct TestChain {
    /// Backing store.
    pub store: MemStore,
    /// Current block height.
    pub height: u64,
    /// Current block time.
    pub time: DateTime<Utc>,
    /// Scheduler with both settlement keepers registered.
    pub epochs: EpochsKeeper,
    /// Auction keeper (same wiring as the registered hook).
    pub auctions: AuctionsKeeper<LedgerBank>,
    /// Incentives keeper (same wiring as the registered hook).
    pub incentives: IncentivesKeeper<LedgerBank, AllExternal>,
    /// Events emitted by all ticks and operations so far.
    pub events: Vec<Event>,
}

impl TestChain {
    /// Deterministic genesis block time shared by all tests.
    pub fn genesis_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    /// Builds a chain with the default genesis and the given base denom.
    pub fn new(base_denom: &str) -> Self {
        Self::with_genesis(base_denom, &GenesisState::default())
    }

    /// Builds a chain from an explicit genesis state.
    pub fn with_genesis(base_denom: &str, genesis: &GenesisState) -> Self {
        let authority = Address::from_module_name("gov");
        let auctions = AuctionsKeeper::new(LedgerBank, base_denom, authority);
        let incentives = IncentivesKeeper::new(LedgerBank, AllExternal, base_denom, authority);

        let mut epochs = EpochsKeeper::new();
        epochs.register_hook(Box::new(auctions.clone()));
        epochs.register_hook(Box::new(incentives.clone()));

        let mut chain = Self {
            store: MemStore::new(),
            height: GENESIS_HEIGHT,
            time: Self::genesis_time(),
            epochs,
            auctions,
            incentives,
            events: Vec::new(),
        };
        {
            let Self {
                store,
                epochs,
                auctions,
                incentives,
                height,
                time,
                ..
            } = &mut chain;
            let mut ctx = Context::new(store, *height, *time);
            init_genesis(&mut ctx, epochs, auctions, incentives, genesis)
                .expect("genesis must be valid");
        }
        // The genesis transition itself runs a scheduler tick, starting any
        // epoch whose start time has already arrived.
        chain.tick();
        chain
    }

    /// Runs the scheduler for the current block position.
    pub fn tick(&mut self) {
        let Self {
            store,
            epochs,
            height,
            time,
            events,
            ..
        } = self;
        let mut ctx = Context::new(store, *height, *time);
        epochs.begin_tick(&mut ctx).expect("tick must not fail");
        events.extend(ctx.take_events());
    }

    /// Advances one block by `secs` seconds and ticks the scheduler.
    pub fn advance_secs(&mut self, secs: i64) {
        self.height += 1;
        self.time = self.time + Duration::seconds(secs);
        self.tick();
    }

    /// Advances one block past the end of a `duration_secs` interval.
    pub fn advance_past(&mut self, duration_secs: u64) {
        self.advance_secs(duration_secs as i64 + 1);
    }

    /// Runs `f` against a fresh context, accumulating emitted events.
    pub fn with_ctx<R>(&mut self, f: impl FnOnce(&mut Context<'_>) -> R) -> R {
        let mut ctx = Context::new(&mut self.store, self.height, self.time);
        let result = f(&mut ctx);
        self.events.extend(ctx.take_events());
        result
    }

    /// Mints `coin` straight into a module account.
    pub fn fund_module(&mut self, module: &str, coin: Coin) {
        self.with_ctx(|ctx| {
            LedgerBank
                .mint_to_module(ctx, module, &Coins::from(coin))
                .expect("mint")
        });
    }

    /// Funds a user account through a faucet module.
    pub fn fund_account(&mut self, address: Address, coin: Coin) {
        self.with_ctx(|ctx| {
            let coins = Coins::from(coin);
            LedgerBank.mint_to_module(ctx, "faucet", &coins).expect("mint");
            LedgerBank
                .send_from_module_to_account(ctx, "faucet", &address, &coins)
                .expect("fund")
        });
    }

    /// Balance of `denom` held by `address`.
    pub fn balance(&mut self, address: Address, denom: &str) -> u128 {
        self.with_ctx(|ctx| {
            LedgerBank
                .balance(ctx, &address, denom)
                .expect("balance read")
        })
    }

    /// Places a bid as `sender`.
    pub fn bid(&mut self, sender: Address, amount: Coin) -> Result<()> {
        let auctions = self.auctions.clone();
        self.with_ctx(|ctx| auctions.bid(ctx, &sender, amount))
    }

    /// Deposits assets for the next auction round.
    pub fn deposit(&mut self, sender: Address, amount: Coin) -> Result<()> {
        let auctions = self.auctions.clone();
        self.with_ctx(|ctx| auctions.deposit(ctx, &sender, amount))
    }

    /// Current auction round.
    pub fn round(&mut self) -> u64 {
        let auctions = self.auctions.clone();
        self.with_ctx(|ctx| auctions.round(ctx))
    }

    /// Current highest bid.
    pub fn highest_bid(&mut self) -> Bid {
        let auctions = self.auctions.clone();
        self.with_ctx(|ctx| auctions.highest_bid(ctx).expect("bid read"))
    }

    /// Registers an incentive.
    pub fn register_incentive(
        &mut self,
        contract: Address,
        allocations: Vec<Allocation>,
        epochs: u32,
    ) -> Result<Incentive> {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| incentives.register_incentive(ctx, contract, allocations, epochs))
    }

    /// Cancels an incentive.
    pub fn cancel_incentive(&mut self, contract: Address) -> Result<()> {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| incentives.cancel_incentive(ctx, &contract))
    }

    /// Meters gas as the per-transaction hook would.
    pub fn record_usage(&mut self, contract: Address, participant: Address, gas: u64) {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| {
            incentives
                .record_usage(ctx, &contract, &participant, gas)
                .expect("metering")
        });
    }

    /// Reads a live incentive.
    pub fn incentive(&mut self, contract: Address) -> Option<Incentive> {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| incentives.incentive(ctx, &contract).expect("read"))
    }

    /// Committed allocation total for `denom`.
    pub fn allocation_meter(&mut self, denom: &str) -> tideflow_types::Fraction {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| incentives.allocation_meter(ctx, denom).expect("read"))
    }

    /// Metered gas for `(contract, participant)`.
    pub fn gas_meter(&mut self, contract: Address, participant: Address) -> u64 {
        let incentives = self.incentives.clone();
        self.with_ctx(|ctx| incentives.gas_meter(ctx, &contract, &participant))
    }
}
