// pressline-core/src/core/time.rs
// ============================================================================
// Module: Timestamp
// Description: Wall-clock timestamp newtype used across all persisted records.
// Purpose: Give every event/task/agent record a single, serde-stable time type.
// Dependencies: time, serde
// ============================================================================

//! ## Overview
//! Timestamps are RFC3339 wall-clock values. Ordering within a story relies
//! on `(created_at, event_seq)` per spec; this type only carries the wall
//! clock half of that pair.

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;
use time::format_description::well_known::Rfc3339;

/// Wall-clock timestamp, serialized as RFC3339.
///
/// # Invariants
/// - Always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing `OffsetDateTime`, normalizing to UTC.
    #[must_use]
    pub fn from_offset(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the underlying `OffsetDateTime`.
    #[must_use]
    pub const fn as_offset(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the duration elapsed since `self`, saturating at zero for
    /// future timestamps.
    #[must_use]
    pub fn elapsed_since(&self, now: Self) -> time::Duration {
        let delta = now.0 - self.0;
        if delta.is_negative() { time::Duration::ZERO } else { delta }
    }

    /// Parses `raw` as RFC3339 or, failing that, RFC2822 (the format feed
    /// `pubDate` fields commonly use), returning `None` rather than an error
    /// for anything else. Feed ingestion treats a missing publish time as
    /// absent data, not a fatal parse failure (spec §4.7 "Scout").
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        OffsetDateTime::parse(raw, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(raw, &Rfc2822))
            .map(Self::from_offset)
            .ok()
    }
}

/// Error returned when parsing a timestamp from its string form.
#[derive(Debug, thiserror::Error)]
#[error("invalid timestamp: {0}")]
pub struct TimestampParseError(String);

impl TryFrom<String> for Timestamp {
    type Error = TimestampParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OffsetDateTime::parse(&value, &Rfc3339)
            .map(Self::from_offset)
            .map_err(|err| TimestampParseError(err.to_string()))
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.0.format(&Rfc3339).unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }
}
