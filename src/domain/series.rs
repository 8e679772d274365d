// Bounded per-channel sample buffers and axis bounds
use super::channel::SeriesKey;
use super::telemetry::TimeSeriesPoint;
use std::collections::VecDeque;

/// Samples kept per series before the oldest are evicted.
pub const MAX_SAMPLES_PER_SERIES: usize = 1000;

#[derive(Debug, Clone)]
pub struct Series {
    key: SeriesKey,
    samples: VecDeque<TimeSeriesPoint>,
    capacity: usize,
}

impl Series {
    pub fn new(key: SeriesKey, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            key,
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a sample, evicting from the front once the capacity is exceeded.
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: TimeSeriesPoint) -> Option<TimeSeriesPoint> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&TimeSeriesPoint> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.samples.back()
    }

    /// Earliest and latest x currently buffered.
    pub fn time_span(&self) -> Option<(i64, i64)> {
        Some((self.first()?.time_ms, self.last()?.time_ms))
    }
}

/// Y-axis bounds for one (group, metric) scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Widen only: min never grows and max never shrinks.
    /// Evicted samples are not taken back out, so bounds can be wider than the live data.
    pub fn widen(&mut self, min: f64, max: f64) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }

    /// Exact bounds over the given samples.
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a TimeSeriesPoint>) -> Option<Self> {
        samples.into_iter().fold(None, |acc, p| match acc {
            None => Some(AxisBounds::new(p.value, p.value)),
            Some(mut bounds) => {
                bounds.widen(p.value, p.value);
                Some(bounds)
            }
        })
    }
}
