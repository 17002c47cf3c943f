//! Clock synchronization for the announcement display.
//!
//! The displayed clock is local time shifted by a [`ClockOffset`] measured
//! once per session against a public [`TimeSource`]. A failed measurement
//! is never an error: it yields [`OffsetReading::Unavailable`] and the clock
//! runs on local time.

mod display;
mod source;

use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta, Utc};
use tracing::{debug, warn};

pub use display::{ClockRenderer, DisplayClock};
pub use source::{parse_time_payload, HttpTimeSource, TimeSource};

/// Source of local "now".
pub trait LocalClock: Send + Sync + fmt::Debug {
    /// The current local instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Signed difference between public time and the local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ClockOffset(TimeDelta);

impl ClockOffset {
    /// No correction.
    #[must_use]
    pub const fn zero() -> Self {
        Self(TimeDelta::zero())
    }

    /// Offset that maps `local` onto `external`.
    #[must_use]
    pub fn between(external: DateTime<Utc>, local: DateTime<Utc>) -> Self {
        Self(external - local)
    }

    /// Offset of `millis` milliseconds.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(TimeDelta::milliseconds(millis))
    }

    /// Apply the offset to a local instant.
    #[must_use]
    pub fn apply(self, local: DateTime<Utc>) -> DateTime<Utc> {
        local + self.0
    }

    /// The offset in whole milliseconds.
    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.0.num_milliseconds()
    }

    /// Whether no correction is applied.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for ClockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}ms", self.as_millis())
    }
}

/// Outcome of one offset measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetReading {
    /// The public time source answered; local time should be shifted by this offset.
    Corrected(ClockOffset),
    /// No usable answer; local time is used as is.
    Unavailable(String),
}

impl OffsetReading {
    /// The offset to apply: the measured one, or zero.
    #[must_use]
    pub fn offset(&self) -> ClockOffset {
        match self {
            Self::Corrected(offset) => *offset,
            Self::Unavailable(_) => ClockOffset::zero(),
        }
    }

    /// Whether the public time source answered.
    #[must_use]
    pub fn is_corrected(&self) -> bool {
        matches!(self, Self::Corrected(_))
    }
}

/// Measures the local clock against a public time source.
#[derive(Debug, Clone)]
pub struct TimeSync {
    source: Arc<dyn TimeSource>,
    local: Arc<dyn LocalClock>,
}

impl TimeSync {
    /// Create a synchronizer from a time source and a local clock.
    #[must_use]
    pub fn new(source: Arc<dyn TimeSource>, local: Arc<dyn LocalClock>) -> Self {
        Self { source, local }
    }

    /// Take one reading from the public time source.
    ///
    /// One request, no retries. The local instant is captured as soon as
    /// the answer is parsed; request latency is not compensated.
    pub async fn acquire_offset(&self) -> OffsetReading {
        match self.source.fetch().await {
            Ok(external) => {
                let local = self.local.now();
                let offset = ClockOffset::between(external, local);
                debug!(
                    "Public time from {} is {}, offset {}",
                    self.source.endpoint(),
                    external.to_rfc3339(),
                    offset
                );
                OffsetReading::Corrected(offset)
            }
            Err(e) => {
                warn!("Public time unavailable, using local clock: {}", e);
                OffsetReading::Unavailable(e.to_string())
            }
        }
    }

    /// Local now, uncorrected.
    #[must_use]
    pub fn local_now(&self) -> DateTime<Utc> {
        self.local.now()
    }

    /// The local clock this synchronizer measures.
    #[must_use]
    pub fn local_clock(&self) -> Arc<dyn LocalClock> {
        Arc::clone(&self.local)
    }

    /// The queried endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.source.endpoint()
    }
}

/// Format an instant in the local time zone with a `strftime` pattern.
///
/// Falls back to RFC 3339 if the pattern cannot be rendered.
#[must_use]
pub fn format_local(at: DateTime<Utc>, pattern: &str) -> String {
    let local = at.with_timezone(&Local);
    let mut out = String::new();
    if write!(out, "{}", local.format(pattern)).is_err() {
        return local.to_rfc3339();
    }
    out
}
