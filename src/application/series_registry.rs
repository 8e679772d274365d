// Series registry - classifies readings into bounded per-channel buffers
use crate::application::chart_surface::ChartSurface;
use crate::domain::channel::{Axis, Channel, ChartId, GyroMetric, ScaleKey, SeriesKey};
use crate::domain::series::{AxisBounds, MAX_SAMPLES_PER_SERIES, Series};
use crate::domain::telemetry::{DataPoint, GyroReading, MotorReading, TimeSeriesPoint};
use crate::domain::window::TimeRange;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// How y bounds are derived for a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Widen-only accumulator over everything seen; never narrowed by eviction.
    #[default]
    Running,
    /// Rescan the buffered samples on every update.
    Live,
}

/// Counts from one ingested batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub samples: usize,
    pub new_series: usize,
    pub dropped_readings: usize,
}

/// Owner of all per-session series state. `reset` is the only place it is cleared.
#[derive(Debug, Clone)]
pub struct RegistryContext {
    series: BTreeMap<SeriesKey, Series>,
    running_bounds: BTreeMap<ScaleKey, AxisBounds>,
    capacity: usize,
    policy: BoundsPolicy,
}

impl Default for RegistryContext {
    fn default() -> Self {
        Self::new(MAX_SAMPLES_PER_SERIES, BoundsPolicy::Running)
    }
}

impl RegistryContext {
    pub fn new(capacity: usize, policy: BoundsPolicy) -> Self {
        Self {
            series: BTreeMap::new(),
            running_bounds: BTreeMap::new(),
            capacity,
            policy,
        }
    }

    /// Classify every reading of every point, in order, into its series.
    pub fn ingest(&mut self, points: &[DataPoint], surface: &mut dyn ChartSurface) -> IngestSummary {
        let mut summary = IngestSummary::default();
        let mut touched_scales = BTreeSet::new();

        for point in points {
            let Some(sensors) = point.sensors() else {
                continue;
            };

            for (name, reading) in sensors {
                match Channel::parse(name) {
                    Channel::Gyro => match GyroReading::deserialize(reading) {
                        Ok(gyro) => {
                            for axis in Axis::ALL {
                                for metric in GyroMetric::ALL {
                                    let value = gyro_value(&gyro, axis, metric);
                                    let key = SeriesKey::gyro(axis, metric);
                                    touched_scales.insert(key.scale());
                                    let sample = TimeSeriesPoint::new(point.timestamp, value);
                                    summary.new_series +=
                                        self.append(key, sample, None, surface) as usize;
                                    summary.samples += 1;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::debug!("Dropping malformed GYRO reading at {}: {}", point.timestamp, e);
                            summary.dropped_readings += 1;
                        }
                    },
                    Channel::MotorMetric { motor_id, metric } => {
                        match MotorReading::deserialize(reading) {
                            Ok(motor) => {
                                let key = SeriesKey::motor(metric, motor_id);
                                touched_scales.insert(key.scale());
                                let sample = TimeSeriesPoint::new(point.timestamp, motor.value);
                                let reported = (
                                    motor.min.unwrap_or(motor.value),
                                    motor.max.unwrap_or(motor.value),
                                );
                                summary.new_series +=
                                    self.append(key, sample, Some(reported), surface) as usize;
                                summary.samples += 1;
                            }
                            Err(e) => {
                                tracing::debug!("Dropping malformed {} reading: {}", name, e);
                                summary.dropped_readings += 1;
                            }
                        }
                    }
                    Channel::Unrecognized => {
                        tracing::trace!("Ignoring unrecognized channel {}", name);
                        summary.dropped_readings += 1;
                    }
                }
            }
        }

        for scale in touched_scales {
            if let Some(bounds) = self.bounds(&scale) {
                surface.y_bounds_changed(&scale, bounds);
            }
        }

        summary
    }

    /// Push one sample, creating and announcing the series on first sight.
    /// `reported` is the (min, max) the device attached to the reading, if any.
    /// Returns true when the series was created.
    pub fn append(
        &mut self,
        key: SeriesKey,
        sample: TimeSeriesPoint,
        reported: Option<(f64, f64)>,
        surface: &mut dyn ChartSurface,
    ) -> bool {
        let (min, max) = reported.unwrap_or((sample.value, sample.value));
        self.running_bounds
            .entry(key.scale())
            .and_modify(|b| b.widen(min, max))
            .or_insert_with(|| AxisBounds::new(min, max));

        let capacity = self.capacity;
        let mut created = false;
        let series = self.series.entry(key).or_insert_with_key(|key| {
            created = true;
            Series::new(key.clone(), capacity)
        });
        series.push(sample);

        if created {
            surface.series_added(&series.key().chart(), series.key());
        }
        created
    }

    /// Discard all series and bounds.
    pub fn reset(&mut self, surface: &mut dyn ChartSurface) {
        self.series.clear();
        self.running_bounds.clear();
        surface.cleared();
    }

    pub fn series(&self, key: &SeriesKey) -> Option<&Series> {
        self.series.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every chart surface: the three gyro charts always, motor charts once seen.
    pub fn charts(&self) -> Vec<ChartId> {
        let mut charts: BTreeSet<ChartId> = Axis::ALL.into_iter().map(ChartId::Gyro).collect();
        charts.extend(self.series.keys().map(SeriesKey::chart));
        charts.into_iter().collect()
    }

    pub fn bounds(&self, scale: &ScaleKey) -> Option<AxisBounds> {
        match self.policy {
            BoundsPolicy::Running => self.running_bounds.get(scale).copied(),
            BoundsPolicy::Live => AxisBounds::from_samples(
                self.series
                    .values()
                    .filter(|s| &s.key().scale() == scale)
                    .flat_map(Series::samples),
            ),
        }
    }

    /// Earliest to latest buffered x across all series.
    pub fn time_extent(&self) -> Option<TimeRange> {
        self.series
            .values()
            .filter_map(Series::time_span)
            .map(|(first, last)| TimeRange::new(first, last))
            .reduce(TimeRange::union)
    }
}

fn gyro_value(gyro: &GyroReading, axis: Axis, metric: GyroMetric) -> f64 {
    match metric {
        GyroMetric::AngularVelocity => gyro.angular_velocity.component(axis),
        GyroMetric::Acceleration => gyro.acceleration.component(axis),
        GyroMetric::ResultantAcceleration => gyro.resultant_acceleration,
    }
}
