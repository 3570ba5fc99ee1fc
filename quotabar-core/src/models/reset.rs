//! Reset timestamp handling.
//!
//! Providers report window resets as ISO-8601 strings, epoch milliseconds or
//! seconds-until-reset. All of them are turned into an absolute UTC instant
//! first, and [`ResetEta`] is derived from that instant and a reference time.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Reset ETA
// ============================================================================

/// Time remaining until a quota window resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResetEta {
    /// Resets after the given number of seconds.
    In {
        /// Seconds until the reset.
        seconds: i64,
    },
    /// The reset time has already passed.
    Now,
    /// The provider did not report a reset time.
    #[default]
    NotAvailable,
}

impl ResetEta {
    /// Computes the ETA for an optional reset instant relative to `now`.
    pub fn until(resets_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match resets_at {
            Some(reset) => Self::from_seconds((reset - now).num_seconds()),
            None => Self::NotAvailable,
        }
    }

    /// Builds an ETA from a signed number of seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds <= 0 {
            Self::Now
        } else {
            Self::In { seconds }
        }
    }
}

impl fmt::Display for ResetEta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailable => f.write_str("N/A"),
            Self::Now => f.write_str("Now"),
            Self::In { seconds } => {
                let days = seconds / SECONDS_PER_DAY;
                let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
                let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
                if days > 0 {
                    write!(f, "{days}d {hours}h")
                } else if hours > 0 {
                    write!(f, "{hours}h {minutes}m")
                } else {
                    write!(f, "{minutes}m")
                }
            }
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses an ISO-8601 reset timestamp.
///
/// Accepts RFC 3339 with any offset, and naive timestamps which are taken
/// as UTC. Returns `None` for empty or unparseable input.
pub fn parse_reset_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Converts an epoch-milliseconds reset time.
pub fn reset_from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

/// Converts a seconds-until-reset value relative to `now`.
///
/// Non-positive values mean the provider has no pending reset. Offsets past
/// the representable range yield `None`.
pub fn reset_from_relative_seconds(seconds: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(ResetEta::NotAvailable.to_string(), "N/A");
        assert_eq!(ResetEta::Now.to_string(), "Now");
        assert_eq!(ResetEta::In { seconds: 45 * 60 }.to_string(), "45m");
        assert_eq!(ResetEta::In { seconds: 2 * 3600 + 30 * 60 }.to_string(), "2h 30m");
        assert_eq!(ResetEta::In { seconds: 3 * 86_400 + 4 * 3600 }.to_string(), "3d 4h");
    }

    #[test]
    fn test_until_past_is_now() {
        let past = now() - Duration::minutes(5);
        assert_eq!(ResetEta::until(Some(past), now()), ResetEta::Now);
        assert_eq!(ResetEta::until(None, now()), ResetEta::NotAvailable);
    }

    #[test]
    fn test_three_encodings_agree() {
        let target = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();

        let iso = parse_reset_timestamp("2025-01-03T12:00:00Z");
        let offset = parse_reset_timestamp("2025-01-03T13:00:00+01:00");
        let millis = reset_from_epoch_millis(target.timestamp_millis());
        let relative = reset_from_relative_seconds(7200, now());

        for parsed in [iso, offset, millis, relative] {
            assert_eq!(parsed, Some(target));
            assert_eq!(ResetEta::until(parsed, now()), ResetEta::In { seconds: 7200 });
        }
    }

    #[test]
    fn test_parse_fractional_and_naive() {
        let frac = parse_reset_timestamp("2025-01-03T12:00:00.123456+00:00").unwrap();
        assert_eq!(frac.timestamp(), 1_735_905_600);

        let naive = parse_reset_timestamp("2025-01-03T12:00:00").unwrap();
        assert_eq!(naive.timestamp(), 1_735_905_600);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_reset_timestamp("").is_none());
        assert!(parse_reset_timestamp("   ").is_none());
        assert!(parse_reset_timestamp("next tuesday").is_none());
        assert!(reset_from_epoch_millis(0).is_none());
        assert!(reset_from_relative_seconds(0, now()).is_none());
        assert!(reset_from_relative_seconds(-10, now()).is_none());
    }

    #[test]
    fn test_relative_seconds_out_of_range() {
        assert!(reset_from_relative_seconds(i64::MAX, now()).is_none());
        assert!(reset_from_relative_seconds(i64::MAX / 1_000, now()).is_none());
        assert_eq!(
            ResetEta::until(reset_from_relative_seconds(i64::MAX, now()), now()),
            ResetEta::NotAvailable
        );
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(ResetEta::In { seconds: 60 }).unwrap();
        assert_eq!(json, serde_json::json!({"state": "in", "seconds": 60}));
        let json = serde_json::to_value(ResetEta::NotAvailable).unwrap();
        assert_eq!(json, serde_json::json!({"state": "not_available"}));
    }
}
