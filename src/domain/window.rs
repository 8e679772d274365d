// Visible time window model
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_WINDOW_SECONDS: u64 = 20;

/// Which slice of time the charts show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Everything currently buffered.
    All,
    /// The trailing number of seconds up to the anchor.
    Trailing(u64),
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::Trailing(DEFAULT_WINDOW_SECONDS)
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(TimeWindow::All);
        }
        match s.parse::<u64>() {
            Ok(seconds) if seconds > 0 => Ok(TimeWindow::Trailing(seconds)),
            _ => Err(format!("time window must be \"all\" or a positive number of seconds, got {:?}", s)),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::All => write!(f, "all"),
            TimeWindow::Trailing(seconds) => write!(f, "{}s", seconds),
        }
    }
}

/// Inclusive x range in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min_ms: i64,
    pub max_ms: i64,
}

impl TimeRange {
    pub fn new(min_ms: i64, max_ms: i64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn point(at_ms: i64) -> Self {
        Self::new(at_ms, at_ms)
    }

    pub fn trailing(anchor_ms: i64, seconds: u64) -> Self {
        let span = i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        Self::new(anchor_ms.saturating_sub(span), anchor_ms)
    }

    /// Smallest range covering both.
    pub fn union(self, other: TimeRange) -> TimeRange {
        TimeRange::new(self.min_ms.min(other.min_ms), self.max_ms.max(other.max_ms))
    }

    pub fn duration_ms(&self) -> i64 {
        self.max_ms - self.min_ms
    }
}
