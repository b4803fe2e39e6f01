//! Proptest strategies for Tideflow domain types.
//!
//! Reusable generators for property-based testing across crates. Strategies
//! produce well-formed domain values while exploring edge cases through
//! random variation.

use proptest::prelude::*;

use tideflow_types::{Address, Allocation, Coin, Fraction};

/// Generates an arbitrary 20-byte address.
pub fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::new)
}

/// Generates an arbitrary denomination of 3-8 lowercase letters.
pub fn arb_denom() -> impl Strategy<Value = String> {
    "[a-z]{3,8}"
}

/// Generates a coin in `denom` with an amount in `1..1_000_000`.
pub fn arb_coin(denom: &'static str) -> impl Strategy<Value = Coin> {
    (1u128..1_000_000).prop_map(move |amount| Coin::new(denom, amount))
}

/// Generates a fraction between 1% and `max_percent`.
pub fn arb_fraction(max_percent: u64) -> impl Strategy<Value = Fraction> {
    (1..=max_percent).prop_map(|pct| {
        Fraction::from_percent(pct).unwrap_or(Fraction::ONE)
    })
}

/// Generates an allocation in `denom` within the given percent cap.
pub fn arb_allocation(
    denom: &'static str,
    max_percent: u64,
) -> impl Strategy<Value = Allocation> {
    arb_fraction(max_percent).prop_map(move |fraction| Allocation::new(denom, fraction))
}

/// Generates a sequence of 1-30 bid amounts in `1..10_000`.
pub fn arb_bid_amounts() -> impl Strategy<Value = Vec<u128>> {
    proptest::collection::vec(1u128..10_000, 1..30)
}

/// Generates a gas amount in `1..1_000_000`.
pub fn arb_gas() -> impl Strategy<Value = u64> {
    1u64..1_000_000
}
