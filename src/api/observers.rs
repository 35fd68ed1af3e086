/// Event stream fanned out to registered observers after engine mutations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartEvent {
    SamplesAppended { total: usize },
    SeriesReplaced { total: usize },
    SmoothingChanged,
    RenderedRangeChanged { x: (i64, i64), y: (f64, f64) },
    LabelsResolved { resolved: usize },
    Cleared,
}

/// Observer hook for engine state changes.
///
/// The engine owns registered observers outright (strong references) and
/// hosts unregister them explicitly on teardown; nothing here depends on
/// collector-timed cleanup.
pub trait ChartObserver {
    fn id(&self) -> &str;
    fn on_event(&mut self, event: ChartEvent);
}
