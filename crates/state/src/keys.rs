//! Key encoding for persisted settlement records.
//!
//! Single-byte prefixes partition the store; composite keys append
//! fixed-width address bytes so that lexicographic order over raw keys is
//! exactly (contract, participant) order. Distribution iterates these scans,
//! so the encoding is consensus-critical.

use tideflow_types::Address;

/// Prefix for [`EpochInfo`](tideflow_types::EpochInfo) records, keyed by identifier.
pub const EPOCH_INFO_PREFIX: u8 = 0x01;

/// Singleton key for the auction round counter (big-endian `u64` value).
pub const AUCTION_ROUND_KEY: [u8; 1] = [0x02];

/// Singleton key for the highest bid.
pub const BID_KEY: [u8; 1] = [0x03];

/// Singleton key for auction parameters.
pub const AUCTION_PARAMS_KEY: [u8; 1] = [0x04];

/// Prefix for incentive records, keyed by contract address.
pub const INCENTIVE_PREFIX: u8 = 0x05;

/// Prefix for gas meters, keyed by contract ++ participant (big-endian `u64` value).
pub const GAS_METER_PREFIX: u8 = 0x06;

/// Prefix for allocation meters, keyed by denom.
pub const ALLOCATION_METER_PREFIX: u8 = 0x07;

/// Singleton key for incentive parameters.
pub const INCENTIVE_PARAMS_KEY: [u8; 1] = [0x08];

/// Prefix for bank balances, keyed by address ++ denom (big-endian `u128` value).
pub const BANK_BALANCE_PREFIX: u8 = 0x10;

/// Prefix for per-denom supply, keyed by denom (big-endian `u128` value).
pub const BANK_SUPPLY_PREFIX: u8 = 0x11;

/// Key of one epoch record.
pub fn epoch_info_key(identifier: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + identifier.len());
    key.push(EPOCH_INFO_PREFIX);
    key.extend_from_slice(identifier.as_bytes());
    key
}

/// Prefix scanning all epoch records.
pub fn epoch_info_prefix() -> Vec<u8> {
    vec![EPOCH_INFO_PREFIX]
}

/// Key of one incentive record.
pub fn incentive_key(contract: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(INCENTIVE_PREFIX);
    key.extend_from_slice(contract.as_ref());
    key
}

/// Prefix scanning all incentive records.
pub fn incentive_prefix() -> Vec<u8> {
    vec![INCENTIVE_PREFIX]
}

/// Key of one gas meter.
pub fn gas_meter_key(contract: &Address, participant: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(41);
    key.push(GAS_METER_PREFIX);
    key.extend_from_slice(contract.as_ref());
    key.extend_from_slice(participant.as_ref());
    key
}

/// Prefix scanning all gas meters of one contract.
pub fn gas_meter_contract_prefix(contract: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(GAS_METER_PREFIX);
    key.extend_from_slice(contract.as_ref());
    key
}

/// Key of one allocation meter.
pub fn allocation_meter_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + denom.len());
    key.push(ALLOCATION_METER_PREFIX);
    key.extend_from_slice(denom.as_bytes());
    key
}

/// Key of one account balance.
pub fn balance_key(address: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(21 + denom.len());
    key.push(BANK_BALANCE_PREFIX);
    key.extend_from_slice(address.as_ref());
    key.extend_from_slice(denom.as_bytes());
    key
}

/// Prefix scanning all balances of one account.
pub fn balance_prefix(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(21);
    key.push(BANK_BALANCE_PREFIX);
    key.extend_from_slice(address.as_ref());
    key
}

/// Key of one denom's circulating supply.
pub fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + denom.len());
    key.push(BANK_SUPPLY_PREFIX);
    key.extend_from_slice(denom.as_bytes());
    key
}
