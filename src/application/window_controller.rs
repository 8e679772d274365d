// Window controller - one visible time range shared by every chart
use crate::application::chart_surface::ChartSurface;
use crate::application::series_registry::RegistryContext;
use crate::domain::window::{TimeRange, TimeWindow};

#[derive(Debug, Clone, Default)]
pub struct WindowController {
    mode: TimeWindow,
    user_interacted: bool,
}

impl WindowController {
    pub fn new(mode: TimeWindow) -> Self {
        Self {
            mode,
            user_interacted: false,
        }
    }

    pub fn mode(&self) -> TimeWindow {
        self.mode
    }

    /// True while a manual pan/zoom holds the range.
    pub fn is_suspended(&self) -> bool {
        self.user_interacted
    }

    /// Range for the current mode.
    ///
    /// `anchor` is the timestamp of the latest applied sample, never wall-clock time.
    /// Without an anchor only "all" with buffered data yields a range.
    pub fn compute(&self, registry: &RegistryContext, anchor: Option<i64>) -> Option<TimeRange> {
        match self.mode {
            TimeWindow::All => registry
                .time_extent()
                .or_else(|| anchor.map(TimeRange::point)),
            TimeWindow::Trailing(seconds) => anchor.map(|a| TimeRange::trailing(a, seconds)),
        }
    }

    /// Recompute and push the range to every chart unless a manual pan/zoom is active.
    pub fn refresh(
        &self,
        registry: &RegistryContext,
        anchor: Option<i64>,
        surface: &mut dyn ChartSurface,
    ) -> Option<TimeRange> {
        if self.user_interacted {
            return None;
        }

        let range = self.compute(registry, anchor)?;
        for chart in registry.charts() {
            surface.x_range_changed(&chart, range);
        }
        Some(range)
    }

    /// Switch modes; clears any manual pan/zoom.
    pub fn set_mode(
        &mut self,
        mode: TimeWindow,
        registry: &RegistryContext,
        anchor: Option<i64>,
        surface: &mut dyn ChartSurface,
    ) -> Option<TimeRange> {
        self.mode = mode;
        self.user_interacted = false;
        self.refresh(registry, anchor, surface)
    }

    pub fn mark_user_interaction(&mut self) {
        self.user_interacted = true;
    }

    /// Drop the manual pan/zoom and return to the automatic range.
    pub fn reset_view(
        &mut self,
        registry: &RegistryContext,
        anchor: Option<i64>,
        surface: &mut dyn ChartSurface,
    ) -> Option<TimeRange> {
        self.user_interacted = false;
        self.refresh(registry, anchor, surface)
    }
}
