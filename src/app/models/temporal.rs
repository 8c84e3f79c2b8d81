//! Temporal primitives: item acquisition times and extents

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acquisition or observation time of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTime {
    /// A single timestamp
    Instant(DateTime<Utc>),
    /// An observation window
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl ItemTime {
    /// Create a range, rejecting `start > end`
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!(
                "Invalid time range: start {} is after end {}",
                start, end
            )));
        }
        Ok(ItemTime::Range { start, end })
    }

    /// Start of the window (the instant itself for single timestamps)
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            ItemTime::Instant(t) => *t,
            ItemTime::Range { start, .. } => *start,
        }
    }

    /// End of the window (the instant itself for single timestamps)
    pub fn end(&self) -> DateTime<Utc> {
        match self {
            ItemTime::Instant(t) => *t,
            ItemTime::Range { end, .. } => *end,
        }
    }

    /// Validate a range built without [`ItemTime::range`]
    pub fn validate(&self) -> Result<()> {
        match self {
            ItemTime::Instant(_) => Ok(()),
            ItemTime::Range { start, end } => Self::range(*start, *end).map(|_| ()),
        }
    }

    /// Half-open overlap with a query window
    ///
    /// Ranges match when `start < window.end && end > window.start`. An
    /// instant `t` matches when `window.start <= t < window.end`. Missing
    /// window bounds are unbounded. A zero-width window `[t, t]` matches
    /// anything covering `t`.
    pub fn overlaps(&self, window: &TemporalExtent) -> bool {
        if let Some(instant) = window.as_instant() {
            return self.start() <= instant && instant <= self.end();
        }

        match self {
            ItemTime::Instant(t) => {
                window.start.is_none_or(|start| *t >= start)
                    && window.end.is_none_or(|end| *t < end)
            }
            ItemTime::Range { start, end } => {
                window.end.is_none_or(|window_end| *start < window_end)
                    && window.start.is_none_or(|window_start| *end > window_start)
            }
        }
    }
}

/// Start/end bounds where `None` means unbounded on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TemporalExtent {
    /// Create an extent, rejecting `start > end`
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(Error::validation(format!(
                    "Invalid time range: start {} is after end {}",
                    s, e
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Fully unbounded extent
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The single timestamp of a zero-width extent
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start == end => Some(start),
            _ => None,
        }
    }

    /// True when neither side is bounded
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Closed overlap test between two extents, unbounded sides always overlap
    pub fn intersects(&self, other: &TemporalExtent) -> bool {
        let starts_before_other_ends = match (self.start, other.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        };
        let ends_after_other_starts = match (self.end, other.start) {
            (Some(end), Some(start)) => end >= start,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }
}

impl std::str::FromStr for TemporalExtent {
    type Err = Error;

    /// Parse `start/end` where either side may be `..` or empty (STAC API style)
    fn from_str(s: &str) -> Result<Self> {
        let parse_side = |side: &str| -> Result<Option<DateTime<Utc>>> {
            let side = side.trim();
            if side.is_empty() || side == ".." {
                return Ok(None);
            }
            parse_datetime(side).map(Some)
        };

        match s.split_once('/') {
            Some((start, end)) => Self::new(parse_side(start)?, parse_side(end)?),
            None => {
                let instant = parse_datetime(s.trim())?;
                Self::new(Some(instant), Some(instant))
            }
        }
    }
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date at midnight UTC
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::validation(format!("Invalid timestamp '{}'", value)))
}
