use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::api::engine_config::ChartEngineConfig;
use crate::api::engine_snapshot::EngineSnapshot;
use crate::api::observers::{ChartEvent, ChartObserver};
use crate::core::path::{IncrementalPathBuilder, PathPoint};
use crate::core::smoothing::{SmoothingConfig, SmoothingFilter};
use crate::core::store::SampleStore;
use crate::core::ticks::{Tick, TickGenerator, format_elapsed_label};
use crate::core::types::{Sample, StatKind, SurfaceSize};
use crate::core::viewport::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::extensions::labels::{LabelProjection, LabelProjector, PendingCounts};

/// Single owner of the chart data flow.
///
/// Raw samples are smoothed into the displayed series, the viewport
/// auto-scales against the new extents, the polyline is refreshed along the
/// cheapest applicable path and pending labels are re-resolved. All
/// operations are synchronous and single-threaded; producers hand samples
/// off externally.
pub struct ChartEngine {
    config: ChartEngineConfig,
    raw: Vec<Sample>,
    store: SampleStore,
    filter: SmoothingFilter,
    viewport: Viewport,
    labels: LabelProjector,
    path: IncrementalPathBuilder,
    ticks: TickGenerator,
    stats: IndexMap<StatKind, f64>,
    surface: SurfaceSize,
    observers: Vec<Box<dyn ChartObserver>>,
}

impl ChartEngine {
    pub fn new(config: ChartEngineConfig, surface: SurfaceSize) -> ChartResult<Self> {
        let config = config.validate()?;
        if !surface.is_valid() {
            return Err(ChartError::InvalidData(format!(
                "surface size must be non-zero, got {}x{}",
                surface.width, surface.height
            )));
        }
        Ok(Self {
            filter: SmoothingFilter::new(config.smoothing)?,
            viewport: Viewport::with_tuning(config.placement_mode, config.viewport_tuning)?,
            store: SampleStore::with_prune_threshold(config.min_prune_size),
            path: IncrementalPathBuilder::new(config.path_tuning),
            raw: Vec::new(),
            labels: LabelProjector::new(),
            ticks: TickGenerator::new(),
            stats: IndexMap::new(),
            surface,
            observers: Vec::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> ChartEngineConfig {
        self.config
    }

    #[must_use]
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn raw_samples(&self) -> &[Sample] {
        &self.raw
    }

    // --- data feed -------------------------------------------------------

    /// Appends one raw sensor reading.
    ///
    /// The reading is blended into the displayed series through the
    /// smoothing filter, the viewport auto-scales, the polyline extends and
    /// pending labels re-resolve. Timestamps must be non-decreasing.
    pub fn add_raw_sample(&mut self, timestamp: i64, value: f64) -> ChartResult<()> {
        if let Some(last) = self.raw.last() {
            if timestamp < last.timestamp {
                return Err(ChartError::OutOfOrderAppend {
                    prev: last.timestamp,
                    next: timestamp,
                });
            }
        }

        self.raw.push(Sample::new(timestamp, value));
        let displayed = self.filter.display_point_at(&self.raw, self.raw.len() - 1)?;
        self.store.append(displayed)?;
        trace!(timestamp, value, total = self.store.len(), "append sample");

        self.viewport.adjust_y_axis_step(displayed.value);
        if self.viewport.is_pinned_to_now() {
            let (x_min, x_max) = self.viewport.rendered_x_range();
            let span = if x_max > x_min {
                x_max - x_min
            } else {
                self.config.live_window_ms
            };
            self.viewport.set_rendered_x_range(timestamp - span, timestamp);
        }
        self.refresh_path_after_data(displayed);

        let pending_before = self.labels.pending_counts().total();
        self.labels.on_sample_appended(&self.store, timestamp);
        let pending_after = self.labels.pending_counts().total();

        self.emit(ChartEvent::SamplesAppended {
            total: self.store.len(),
        });
        if pending_after < pending_before {
            self.emit(ChartEvent::LabelsResolved {
                resolved: pending_before - pending_after,
            });
        }
        Ok(())
    }

    /// Replaces the whole series with a pre-sorted recorded run.
    pub fn set_samples(&mut self, raw: Vec<Sample>) -> ChartResult<()> {
        debug!(count = raw.len(), "load sample batch");
        let displayed = self.filter.recompute_series(&raw)?;
        self.raw = raw;
        self.store.set_all(displayed);

        self.viewport.clear();
        self.ticks.reset();
        for sample in self.store.samples() {
            self.viewport.observe_value(sample.value);
        }
        if let (Ok(min_x), Ok(max_x)) = (self.store.min_x(), self.store.max_x()) {
            self.viewport.set_rendered_x_range(min_x, max_x);
        }
        if let Some((limit_min, limit_max)) = self.viewport.y_limits() {
            self.viewport.fit_y_range_to(limit_min, limit_max);
        }

        self.labels.on_series_replaced(&self.store);
        self.repopulate_path();
        self.emit(ChartEvent::SeriesReplaced {
            total: self.store.len(),
        });
        Ok(())
    }

    /// Splices a pre-sorted batch of earlier history in front of the series.
    ///
    /// Smoothing is causal, so the displayed series is fully recomputed; this
    /// is the coverage extension that resolves labels waiting on a floor
    /// sample.
    pub fn prepend_samples(&mut self, earlier: Vec<Sample>) -> ChartResult<()> {
        if let (Some(tail), Some(first)) = (earlier.last(), self.raw.first()) {
            if tail.timestamp > first.timestamp {
                return Err(ChartError::OutOfOrderAppend {
                    prev: tail.timestamp,
                    next: first.timestamp,
                });
            }
        }
        debug!(count = earlier.len(), "prepend history batch");

        let mut merged = earlier;
        merged.append(&mut self.raw);
        let displayed = self.filter.recompute_series(&merged)?;
        self.raw = merged;
        self.store.set_all(displayed);
        for sample in self.store.samples() {
            self.viewport.observe_value(sample.value);
        }

        let pending_before = self.labels.pending_counts().total();
        self.labels.on_samples_prepended(&self.store);
        let pending_after = self.labels.pending_counts().total();

        self.repopulate_path();
        self.emit(ChartEvent::SeriesReplaced {
            total: self.store.len(),
        });
        if pending_after < pending_before {
            self.emit(ChartEvent::LabelsResolved {
                resolved: pending_before - pending_after,
            });
        }
        Ok(())
    }

    /// Evicts displayed and raw points older than `threshold`, subject to the
    /// prune threshold gate. Returns the number of evicted points.
    pub fn prune_before(&mut self, threshold: i64) -> usize {
        let removed = self.store.prune_before(threshold);
        if removed > 0 {
            self.raw.drain(0..removed);
            self.repopulate_path();
        }
        removed
    }

    /// Evicts displayed and raw points strictly inside `(lo, hi)`, subject to
    /// the prune threshold gate. Returns the number of evicted points.
    pub fn prune_between(&mut self, lo: i64, hi: i64) -> usize {
        let removed = self.store.prune_between(lo, hi);
        if removed > 0 {
            self.raw.retain(|s| s.timestamp <= lo || s.timestamp >= hi);
            self.repopulate_path();
        }
        removed
    }

    // --- smoothing -------------------------------------------------------

    /// Swaps the smoothing configuration and recomputes the whole displayed
    /// series from raw samples, O(n·window).
    pub fn set_smoothing(&mut self, smoothing: SmoothingConfig) -> ChartResult<()> {
        self.filter = SmoothingFilter::new(smoothing)?;
        self.config.smoothing = smoothing;
        debug!(?smoothing, "smoothing reconfigured");

        let displayed = self.filter.recompute_series(&self.raw)?;
        self.store.set_all(displayed);
        self.labels.on_series_replaced(&self.store);
        self.repopulate_path();
        self.emit(ChartEvent::SmoothingChanged);
        Ok(())
    }

    // --- labels ----------------------------------------------------------

    /// Registers an annotation timestamp; returns its projection, which may
    /// still be pending.
    pub fn add_label(&mut self, source_timestamp: i64) -> LabelProjection {
        let projection = self.labels.add_label(&self.store, source_timestamp);
        if matches!(projection, LabelProjection::Resolved(_)) {
            self.emit(ChartEvent::LabelsResolved { resolved: 1 });
        }
        projection
    }

    pub fn remove_label(&mut self, source_timestamp: i64) -> bool {
        self.labels.remove_label(source_timestamp)
    }

    #[must_use]
    pub fn resolved_labels(&self) -> Vec<Sample> {
        self.labels.resolved_points()
    }

    /// Resolved plus provisional label placements, ordered by timestamp.
    #[must_use]
    pub fn label_placements(&self) -> Vec<Sample> {
        self.labels.placements()
    }

    #[must_use]
    pub fn pending_label_counts(&self) -> PendingCounts {
        self.labels.pending_counts()
    }

    // --- statistics ------------------------------------------------------

    /// Stores an externally computed statistic for passthrough display.
    pub fn set_statistic(&mut self, kind: StatKind, value: f64) {
        self.stats.insert(kind, value);
    }

    #[must_use]
    pub fn statistics(&self) -> &IndexMap<StatKind, f64> {
        &self.stats
    }

    // --- viewport interaction --------------------------------------------

    /// Pans by `dx` milliseconds / `dy` value units. Capability-gated no-op.
    /// In live placement, panning away from the tail unpins the view and
    /// panning back to it re-pins.
    pub fn pan(&mut self, dx: i64, dy: f64) {
        if !self.viewport.pan(dx, dy) {
            return;
        }
        if let Ok(max_x) = self.store.max_x() {
            let (_, x_max) = self.viewport.rendered_x_range();
            let can_pin = self.viewport.capabilities().pinned_to_now_initial;
            self.viewport.set_pinned_to_now(can_pin && x_max >= max_x);
        }
        self.refresh_path_after_viewport();
        self.emit_range_changed();
    }

    /// Zooms the X range around `anchor`; capability-gated no-op.
    pub fn zoom_x(&mut self, factor: f64, anchor: i64) {
        if !self.viewport.zoom_x(factor, anchor) {
            return;
        }
        if let Ok(max_x) = self.store.max_x() {
            let (_, x_max) = self.viewport.rendered_x_range();
            let can_pin = self.viewport.capabilities().pinned_to_now_initial;
            self.viewport.set_pinned_to_now(can_pin && x_max >= max_x);
        }
        self.refresh_path_after_viewport();
        self.emit_range_changed();
    }

    /// Zooms the Y range around `anchor`; capability-gated no-op.
    pub fn zoom_y(&mut self, factor: f64, anchor: f64) {
        if !self.viewport.zoom_y(factor, anchor) {
            return;
        }
        self.refresh_path_after_viewport();
        self.emit_range_changed();
    }

    /// Snaps the rendered Y range back to the true extents seen so far.
    pub fn reset_zoom_y(&mut self) {
        self.viewport.request_reset_zoom_in_y();
        self.refresh_path_after_viewport();
        self.emit_range_changed();
    }

    /// Fits the rendered Y range snugly around the values currently visible
    /// in the rendered X range.
    pub fn fit_y_to_visible(&mut self) {
        let (x_min, x_max) = self.viewport.rendered_x_range();
        let visible = self.store.range_inclusive(x_min, x_max);
        let min = visible.iter().map(|s| OrderedFloat(s.value)).min();
        let max = visible.iter().map(|s| OrderedFloat(s.value)).max();
        let (Some(min), Some(max)) = (min, max) else {
            return;
        };
        self.viewport.fit_y_range_to(min.into_inner(), max.into_inner());
        self.refresh_path_after_viewport();
        self.emit_range_changed();
    }

    /// Resizes the drawing surface and rebuilds the polyline.
    pub fn set_surface_size(&mut self, surface: SurfaceSize) -> ChartResult<()> {
        if !surface.is_valid() {
            return Err(ChartError::InvalidData(format!(
                "surface size must be non-zero, got {}x{}",
                surface.width, surface.height
            )));
        }
        self.surface = surface;
        self.repopulate_path();
        Ok(())
    }

    // --- render outputs --------------------------------------------------

    /// Currently rendered `(x, y)` ranges.
    #[must_use]
    pub fn rendered_range(&self) -> ((i64, i64), (f64, f64)) {
        (
            self.viewport.rendered_x_range(),
            self.viewport.rendered_y_range(),
        )
    }

    /// Drawable polyline in surface coordinates.
    #[must_use]
    pub fn polyline(&self) -> &[PathPoint] {
        self.path.path()
    }

    /// Labeled Y-axis ticks for the current rendered range, with position
    /// reuse across small range changes.
    pub fn y_ticks(&mut self) -> Vec<Tick> {
        let (y_min, y_max) = self.viewport.rendered_y_range();
        self.ticks.labeled_ticks_for_range(y_min, y_max)
    }

    /// X-axis tick label relative to the recording origin (first raw
    /// sample), as elapsed time.
    #[must_use]
    pub fn x_tick_label(&self, timestamp: i64) -> String {
        let origin = self.raw.first().map_or(timestamp, |s| s.timestamp);
        format_elapsed_label(timestamp, origin)
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            placement_mode: self.viewport.mode(),
            pinned_to_now: self.viewport.is_pinned_to_now(),
            rendered_x: self.viewport.rendered_x_range(),
            rendered_y: self.viewport.rendered_y_range(),
            y_limits: self.viewport.y_limits(),
            raw_len: self.raw.len(),
            displayed_len: self.store.len(),
            path_len: self.path.path().len(),
            resolved_labels: self.resolved_labels().len(),
            pending_labels: self.labels.pending_counts(),
            statistics: self.stats.clone(),
        }
    }

    // --- observers -------------------------------------------------------

    /// Registers an observer with a unique identifier.
    pub fn register_observer(&mut self, observer: Box<dyn ChartObserver>) -> ChartResult<()> {
        let observer_id = observer.id().to_owned();
        if observer_id.is_empty() {
            return Err(ChartError::InvalidData(
                "observer id must not be empty".to_owned(),
            ));
        }
        if self.observers.iter().any(|entry| entry.id() == observer_id) {
            return Err(ChartError::InvalidData(format!(
                "observer with id `{observer_id}` is already registered"
            )));
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Unregisters an observer by id. Returns `true` when removed.
    pub fn unregister_observer(&mut self, observer_id: &str) -> bool {
        if let Some(position) = self
            .observers
            .iter()
            .position(|entry| entry.id() == observer_id)
        {
            self.observers.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // --- reset -----------------------------------------------------------

    /// Drops all samples, labels and statistics and restores the viewport to
    /// its construction state.
    pub fn clear(&mut self) {
        debug!("clear chart engine");
        self.raw.clear();
        self.store.clear();
        self.labels.clear();
        self.stats.clear();
        self.ticks.reset();
        self.viewport.clear();
        self.path.invalidate();
        self.emit(ChartEvent::Cleared);
    }

    // --- internals -------------------------------------------------------

    /// Decision rule after data growth: populate when an invariant broke,
    /// otherwise transform to the current ranges and take the cheap append;
    /// a refused append falls back to populate.
    fn refresh_path_after_data(&mut self, latest: Sample) {
        if self.path.needs_populate(&self.viewport) {
            self.path.populate(&self.store, &self.viewport, self.surface);
            return;
        }
        if !self.path.transform(&self.viewport, self.surface)
            || !self.path.append_sample(latest, &self.viewport, self.surface)
        {
            self.path.populate(&self.store, &self.viewport, self.surface);
        }
    }

    /// Decision rule after a pure viewport change: prefer the affine
    /// transform, populate when coverage no longer suffices.
    fn refresh_path_after_viewport(&mut self) {
        if self.path.needs_populate(&self.viewport)
            || !self.path.transform(&self.viewport, self.surface)
        {
            self.path.populate(&self.store, &self.viewport, self.surface);
        }
    }

    fn repopulate_path(&mut self) {
        self.path.invalidate();
        self.path.populate(&self.store, &self.viewport, self.surface);
    }

    fn emit_range_changed(&mut self) {
        let (x, y) = self.rendered_range();
        self.emit(ChartEvent::RenderedRangeChanged { x, y });
    }

    fn emit(&mut self, event: ChartEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}
