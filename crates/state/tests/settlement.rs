//! Scheduler-driven settlement scenarios.
//!
//! These tests exercise the full wiring: user operations land between
//! blocks, and settlement happens only because the scheduler crossed an
//! epoch boundary and notified the registered hooks.

use tideflow_test_utils::TestChain;
use tideflow_types::{
    event_type, Address, Allocation, Coin, Fraction, AUCTIONS_MODULE_NAME,
    AUCTION_COLLECTOR_NAME, INCENTIVES_MODULE_NAME,
};

const DENOM: &str = "atide";
const DAY: u64 = 86_400;
const WEEK: u64 = 7 * DAY;

fn addr(tag: u8) -> Address {
    Address::new([tag; 20])
}

#[test]
fn weekly_boundary_settles_the_auction() {
    let mut chain = TestChain::new(DENOM);
    let bob = addr(2);
    chain.fund_account(bob, Coin::new(DENOM, 150));
    chain.bid(bob, Coin::new(DENOM, 150)).expect("bid");
    chain.fund_module(AUCTIONS_MODULE_NAME, Coin::new("btoken", 5));

    chain.advance_past(WEEK);

    assert_eq!(chain.round(), 1);
    assert_eq!(chain.highest_bid().sender, None);
    assert_eq!(chain.balance(bob, "btoken"), 5);
    assert_eq!(chain.balance(bob, DENOM), 0, "the winning bid is burned, not returned");
    assert!(chain
        .events
        .iter()
        .any(|e| e.kind == event_type::AUCTION_END));
}

#[test]
fn daily_boundary_does_not_settle() {
    let mut chain = TestChain::new(DENOM);
    let bob = addr(2);
    chain.fund_account(bob, Coin::new(DENOM, 150));
    chain.bid(bob, Coin::new(DENOM, 150)).expect("bid");

    chain.advance_past(DAY);

    assert_eq!(chain.round(), 0);
    assert_eq!(chain.highest_bid().sender, Some(bob));
}

#[test]
fn ticks_inside_an_interval_are_noops() {
    let mut chain = TestChain::new(DENOM);
    let before = chain.round();
    chain.advance_secs(60);
    chain.advance_secs(60);
    assert_eq!(chain.round(), before);
    assert_eq!(chain.highest_bid().sender, None);
}

#[test]
fn deposits_roll_into_the_next_round() {
    let mut chain = TestChain::new(DENOM);
    let alice = addr(1);
    let bob = addr(2);
    chain.fund_account(alice, Coin::new("fee", 40));
    chain.fund_account(bob, Coin::new(DENOM, 100));

    chain.deposit(alice, Coin::new("fee", 40)).expect("deposit");
    chain.bid(bob, Coin::new(DENOM, 100)).expect("bid");

    // First settlement: the deposit was in the collector, so it is not part
    // of the basket Bob wins; the sweep moves it into the next basket.
    chain.advance_past(WEEK);
    assert_eq!(chain.balance(bob, "fee"), 0);
    assert_eq!(
        chain.balance(Address::from_module_name(AUCTION_COLLECTOR_NAME), "fee"),
        0
    );
    assert_eq!(
        chain.balance(Address::from_module_name(AUCTIONS_MODULE_NAME), "fee"),
        40
    );

    // Second round: a new winner takes the swept deposit.
    let carol = addr(3);
    chain.fund_account(carol, Coin::new(DENOM, 10));
    chain.bid(carol, Coin::new(DENOM, 10)).expect("bid");
    chain.advance_past(WEEK);
    assert_eq!(chain.round(), 2);
    assert_eq!(chain.balance(carol, "fee"), 40);
}

#[test]
fn incentive_lifecycle_across_epochs() {
    let mut chain = TestChain::new(DENOM);
    let contract = addr(0xC0);
    let alice = addr(1);
    chain.fund_module(INCENTIVES_MODULE_NAME, Coin::new(DENOM, 1000));

    let five_pct = Fraction::from_percent(5).expect("5%");
    chain
        .register_incentive(contract, vec![Allocation::new(DENOM, five_pct)], 2)
        .expect("register");
    chain.record_usage(contract, alice, 400);

    // First weekly pass: alice is the only participant, so she takes the
    // whole 5% allocation of the module balance.
    chain.advance_past(WEEK);
    assert_eq!(chain.balance(alice, DENOM), 50);
    let live = chain.incentive(contract).expect("still live");
    assert_eq!(live.remaining_epochs, 1);
    assert_eq!(live.total_gas, 0);
    assert_eq!(chain.gas_meter(contract, alice), 0);

    // Second pass exhausts the incentive: deleted, meters rebated.
    chain.record_usage(contract, alice, 100);
    chain.advance_past(WEEK);
    assert!(chain.incentive(contract).is_none());
    assert_eq!(chain.allocation_meter(DENOM), Fraction::ZERO);
}

#[test]
fn settlements_compose_on_the_same_boundary() {
    // Both hooks fire on the weekly boundary, auction first (registration
    // order). Each settles independently.
    let mut chain = TestChain::new(DENOM);
    let bob = addr(2);
    let contract = addr(0xC0);
    chain.fund_account(bob, Coin::new(DENOM, 100));
    chain.bid(bob, Coin::new(DENOM, 100)).expect("bid");
    chain.fund_module(INCENTIVES_MODULE_NAME, Coin::new(DENOM, 200));
    chain
        .register_incentive(
            contract,
            vec![Allocation::new(DENOM, Fraction::from_percent(5).expect("5%"))],
            3,
        )
        .expect("register");
    chain.record_usage(contract, bob, 10);

    chain.advance_past(WEEK);

    assert_eq!(chain.round(), 1);
    assert_eq!(chain.incentive(contract).expect("live").remaining_epochs, 2);
    // 200 * 5% = 10 to the only participant.
    assert_eq!(chain.balance(bob, DENOM), 10);
}
