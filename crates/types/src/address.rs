//! Account and contract addresses.
//!
//! An [`Address`] is a fixed 20-byte identifier shared by user accounts,
//! contracts, and module accounts. Module accounts are protocol-owned
//! escrow/collector accounts derived deterministically from a module name,
//! so every validator computes the same address with no coordination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use snafu::Snafu;

/// Byte length of an [`Address`].
pub const ADDRESS_LEN: usize = 20;

/// Errors produced when parsing an [`Address`] from text.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum AddressError {
    /// The input was not valid hexadecimal.
    #[snafu(display("Invalid hex in address '{input}'"))]
    InvalidHex {
        /// The rejected input.
        input: String,
    },

    /// The decoded byte length was not [`ADDRESS_LEN`].
    #[snafu(display("Address '{input}' has length {len}, expected {ADDRESS_LEN} bytes"))]
    InvalidLength {
        /// The rejected input.
        input: String,
        /// Decoded byte length.
        len: usize,
    },
}

/// A 20-byte account, contract, or module-account address.
///
/// # Display
///
/// Formats as `0x`-prefixed lowercase hex: `0x00000000000000000000000000000000000000ff`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derives the protocol-owned account address for a named module.
    ///
    /// Pure function of the name: the first 20 bytes of
    /// `SHA-256("tideflow/module/" ++ name)`. No private key corresponds to
    /// the result, so module balances can only move through module logic.
    pub fn from_module_name(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"tideflow/module/");
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| AddressError::InvalidHex {
            input: s.to_string(),
        })?;
        let len = bytes.len();
        let arr: [u8; ADDRESS_LEN] =
            bytes
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    input: s.to_string(),
                    len,
                })?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let addr = Address::new([0xAB; ADDRESS_LEN]);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        let parsed: Address = text.parse().expect("parse displayed address");
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_without_prefix() {
        let addr = Address::new([0x01; ADDRESS_LEN]);
        let bare = hex::encode(addr.as_bytes());
        let parsed: Address = bare.parse().expect("parse bare hex");
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let err = "0xzz".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidHex { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "0x0102".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { len: 2, .. }));
    }

    #[test]
    fn test_module_derivation_is_stable() {
        let a = Address::from_module_name("auctions");
        let b = Address::from_module_name("auctions");
        assert_eq!(a, b, "same name must derive the same address");
    }

    #[test]
    fn test_module_derivation_distinct_names() {
        let a = Address::from_module_name("auctions");
        let b = Address::from_module_name("auctions_collector");
        assert_ne!(a, b);
    }
}
