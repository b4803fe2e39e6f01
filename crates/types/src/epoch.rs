//! Epoch records tracked by the scheduler.
//!
//! An [`EpochInfo`] describes one named recurring interval: when counting
//! begins, how long each epoch lasts, and where the currently running epoch
//! started. Records are created at genesis and mutated only by the scheduler.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{decode, CodecError};

/// Identifier of the built-in weekly epoch.
pub const WEEK_EPOCH_ID: &str = "week";

/// Identifier of the built-in daily epoch.
pub const DAY_EPOCH_ID: &str = "day";

/// Seconds per week.
const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

/// Seconds per day.
const DAY_SECS: u64 = 24 * 60 * 60;

/// State of one tracked recurring interval.
///
/// Field order is part of the storage format: `current_epoch_start_height`
/// is serialized last so records written before the field existed decode via
/// [`EpochInfo::decode_compat`] with the height defaulted to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    /// Unique name of the interval, e.g. `"week"`.
    pub identifier: String,
    /// Earliest time at which counting may start.
    pub start_time: DateTime<Utc>,
    /// Epoch length in seconds.
    pub duration_secs: u64,
    /// Counter of the currently running epoch; zero until counting starts.
    pub current_epoch: u64,
    /// Scheduled start time of the currently running epoch.
    pub current_epoch_start_time: DateTime<Utc>,
    /// Whether counting has started (time reached `start_time`).
    pub epoch_counting_started: bool,
    /// Block height at which the current epoch started.
    pub current_epoch_start_height: u64,
}

/// Storage layout of epoch records written before start heights were tracked.
#[derive(Debug, Deserialize)]
struct LegacyEpochInfo {
    identifier: String,
    start_time: DateTime<Utc>,
    duration_secs: u64,
    current_epoch: u64,
    current_epoch_start_time: DateTime<Utc>,
    epoch_counting_started: bool,
}

impl EpochInfo {
    /// Epoch length as a signed interval for time arithmetic.
    ///
    /// Durations beyond `i64` seconds are clamped; at that magnitude the
    /// interval can never elapse within a chain's lifetime anyway.
    pub fn interval(&self) -> Duration {
        Duration::seconds(i64::try_from(self.duration_secs).unwrap_or(i64::MAX))
    }

    /// Scheduled end of the currently running epoch, `None` on overflow.
    pub fn current_epoch_end(&self) -> Option<DateTime<Utc>> {
        self.current_epoch_start_time.checked_add_signed(self.interval())
    }

    /// Decodes a stored epoch record, accepting the legacy layout.
    ///
    /// Records serialized without `current_epoch_start_height` decode with
    /// the height defaulted to zero rather than failing.
    pub fn decode_compat(bytes: &[u8]) -> Result<Self, CodecError> {
        match decode::<EpochInfo>(bytes) {
            Ok(info) => Ok(info),
            Err(full_err) => match decode::<LegacyEpochInfo>(bytes) {
                Ok(legacy) => Ok(Self {
                    identifier: legacy.identifier,
                    start_time: legacy.start_time,
                    duration_secs: legacy.duration_secs,
                    current_epoch: legacy.current_epoch,
                    current_epoch_start_time: legacy.current_epoch_start_time,
                    epoch_counting_started: legacy.epoch_counting_started,
                    current_epoch_start_height: 0,
                }),
                Err(_) => Err(full_err),
            },
        }
    }
}

/// Genesis description of a tracked interval.
///
/// A `None` start time adopts the genesis block time when the record is
/// materialized, matching the common case of "start counting immediately".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochGenesis {
    /// Unique name of the interval.
    pub identifier: String,
    /// Earliest counting start; `None` means the genesis block time.
    pub start_time: Option<DateTime<Utc>>,
    /// Epoch length in seconds.
    pub duration_secs: u64,
}

impl EpochGenesis {
    /// The built-in daily interval.
    pub fn day() -> Self {
        Self {
            identifier: DAY_EPOCH_ID.to_string(),
            start_time: None,
            duration_secs: DAY_SECS,
        }
    }

    /// The built-in weekly interval.
    pub fn week() -> Self {
        Self {
            identifier: WEEK_EPOCH_ID.to_string(),
            start_time: None,
            duration_secs: WEEK_SECS,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::encode;
    use chrono::TimeZone;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let info = EpochInfo {
            identifier: "week".to_string(),
            start_time: sample_time(),
            duration_secs: WEEK_SECS,
            current_epoch: 3,
            current_epoch_start_time: sample_time(),
            epoch_counting_started: true,
            current_epoch_start_height: 42,
        };
        let bytes = encode(&info).expect("encode");
        let back = EpochInfo::decode_compat(&bytes).expect("decode");
        assert_eq!(info, back);
    }

    #[test]
    fn test_legacy_record_defaults_height() {
        // A record serialized before start heights existed: same layout
        // minus the trailing field.
        #[derive(Serialize)]
        struct OldLayout {
            identifier: String,
            start_time: DateTime<Utc>,
            duration_secs: u64,
            current_epoch: u64,
            current_epoch_start_time: DateTime<Utc>,
            epoch_counting_started: bool,
        }
        let old = OldLayout {
            identifier: "month".to_string(),
            start_time: sample_time(),
            duration_secs: 31 * DAY_SECS,
            current_epoch: 7,
            current_epoch_start_time: sample_time(),
            epoch_counting_started: true,
        };
        let bytes = encode(&old).expect("encode legacy");
        let info = EpochInfo::decode_compat(&bytes).expect("decode legacy");
        assert_eq!(info.identifier, "month");
        assert_eq!(info.current_epoch, 7);
        assert_eq!(info.current_epoch_start_height, 0);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(EpochInfo::decode_compat(&[0xFF, 0x02]).is_err());
    }

    #[test]
    fn test_current_epoch_end() {
        let info = EpochInfo {
            identifier: "day".to_string(),
            start_time: sample_time(),
            duration_secs: DAY_SECS,
            current_epoch: 1,
            current_epoch_start_time: sample_time(),
            epoch_counting_started: true,
            current_epoch_start_height: 1,
        };
        let end = info.current_epoch_end().expect("no overflow");
        assert_eq!(end - info.current_epoch_start_time, Duration::days(1));
    }
}
