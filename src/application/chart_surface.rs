// Render surface seam - what the charting side is told about series and windows
use crate::application::series_registry::RegistryContext;
use crate::domain::channel::{ChartId, ScaleKey, SeriesKey};
use crate::domain::series::AxisBounds;
use crate::domain::window::TimeRange;

/// Receiver of registry and window changes. Rendering itself happens behind this trait.
pub trait ChartSurface: Send {
    /// A series was seen for the first time and needs a dataset on `chart`.
    fn series_added(&mut self, chart: &ChartId, key: &SeriesKey);

    /// New x range for one chart. Every chart receives the same range.
    fn x_range_changed(&mut self, chart: &ChartId, range: TimeRange);

    /// New y bounds for every chart drawing the given scale.
    fn y_bounds_changed(&mut self, scale: &ScaleKey, bounds: AxisBounds);

    /// All series were discarded.
    fn cleared(&mut self);

    /// Buffers changed; redraw from the registry.
    fn redraw(&mut self, _registry: &RegistryContext) {}
}
