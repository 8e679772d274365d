// Headless chart surface: keeps the last applied ranges and reports through tracing
use crate::application::chart_surface::ChartSurface;
use crate::application::series_registry::RegistryContext;
use crate::domain::channel::{ChartId, ScaleKey, SeriesKey};
use crate::domain::series::AxisBounds;
use crate::domain::window::TimeRange;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct TracingSurface {
    datasets: BTreeMap<ChartId, Vec<String>>,
    ranges: BTreeMap<ChartId, TimeRange>,
    bounds: BTreeMap<ScaleKey, AxisBounds>,
}

impl TracingSurface {
    pub fn datasets(&self, chart: &ChartId) -> &[String] {
        self.datasets.get(chart).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn range(&self, chart: &ChartId) -> Option<TimeRange> {
        self.ranges.get(chart).copied()
    }

    pub fn bounds(&self, scale: &ScaleKey) -> Option<AxisBounds> {
        self.bounds.get(scale).copied()
    }
}

impl ChartSurface for TracingSurface {
    fn series_added(&mut self, chart: &ChartId, key: &SeriesKey) {
        tracing::info!("New dataset \"{}\" on {}", key.label(), chart);
        self.datasets.entry(chart.clone()).or_default().push(key.label());
    }

    fn x_range_changed(&mut self, chart: &ChartId, range: TimeRange) {
        self.ranges.insert(chart.clone(), range);
    }

    fn y_bounds_changed(&mut self, scale: &ScaleKey, bounds: AxisBounds) {
        self.bounds.insert(scale.clone(), bounds);
    }

    fn cleared(&mut self) {
        tracing::info!("Charts cleared");
        self.datasets.clear();
        self.ranges.clear();
        self.bounds.clear();
    }

    fn redraw(&mut self, registry: &RegistryContext) {
        let samples: usize = registry.iter().map(|s| s.len()).sum();
        let window = self.ranges.values().next().copied();
        tracing::info!(
            "{} series, {} buffered samples, window {:?}",
            registry.len(),
            samples,
            window.map(|w| (w.min_ms, w.max_ms))
        );
        for series in registry.iter() {
            if let Some(last) = series.last() {
                tracing::debug!("  {} @ {} = {}", series.key().label(), last.time_ms, last.value);
            }
        }
    }
}
