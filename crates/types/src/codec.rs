//! Centralized serialization for persisted records.
//!
//! Every record written to the ledger store round-trips through this module,
//! so the wire format (postcard) is decided exactly once. Postcard is
//! non-self-describing: decoding with the wrong type or truncated input fails
//! loudly instead of producing garbage.

use serde::{de::DeserializeOwned, Serialize};
use snafu::Snafu;

/// Error type for codec operations.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Encoding failed.
    #[snafu(display("Encoding failed: {source}"))]
    Encode {
        /// The underlying postcard error.
        source: postcard::Error,
    },

    /// Decoding failed.
    #[snafu(display("Decoding failed: {source}"))]
    Decode {
        /// The underlying postcard error.
        source: postcard::Error,
    },
}

/// Encodes a value to bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|source| CodecError::Encode { source })
}

/// Decodes bytes into a value.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if deserialization fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).map_err(|source| CodecError::Decode { source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{Address, Coin};

    #[test]
    fn test_round_trip_domain_value() {
        let coin = Coin::new("atide", 1_000_000);
        let bytes = encode(&coin).expect("encode coin");
        let back: Coin = decode(&bytes).expect("decode coin");
        assert_eq!(coin, back);
    }

    #[test]
    fn test_round_trip_address() {
        let addr = Address::from_module_name("auctions");
        let bytes = encode(&addr).expect("encode address");
        let back: Address = decode(&bytes).expect("decode address");
        assert_eq!(addr, back);
    }

    #[test]
    fn test_decode_truncated_fails() {
        let coin = Coin::new("atide", 77);
        let bytes = encode(&coin).expect("encode");
        let result: Result<Coin, _> = decode(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn test_decode_wrong_type_fails() {
        let bytes = encode(&"just a string").expect("encode");
        let result: Result<Coin, _> = decode(&bytes);
        assert!(result.is_err());
    }
}
