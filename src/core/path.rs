use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::store::SampleStore;
use crate::core::types::{Sample, SurfaceSize};
use crate::core::viewport::Viewport;
use crate::error::{ChartError, ChartResult};

/// One polyline vertex in surface (pixel) coordinates, Y-down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

/// Tuning for incremental path maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathTuning {
    /// Appends tolerated since the last populate before a full rebuild.
    pub max_incremental_points: usize,
    /// Fixed time buffer queried on each side of the visible range, so small
    /// pans stay inside the covered range.
    pub query_buffer_ms: i64,
    /// Approximate-search tolerance for render-path range queries.
    pub search_tolerance: usize,
}

impl Default for PathTuning {
    fn default() -> Self {
        Self {
            max_incremental_points: 1_000,
            query_buffer_ms: 500,
            search_tolerance: crate::core::store::DEFAULT_SEARCH_TOLERANCE,
        }
    }
}

impl PathTuning {
    pub fn validate(self) -> ChartResult<Self> {
        if self.max_incremental_points == 0 {
            return Err(ChartError::InvalidData(
                "path incremental budget must be >= 1".to_owned(),
            ));
        }
        if self.query_buffer_ms < 0 {
            return Err(ChartError::InvalidData(
                "path query buffer must be >= 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Maintains a renderable polyline over the visible sample range.
///
/// Three maintenance paths, cheapest applicable first: affine transform for
/// pure viewport changes, single-point append for data growth at the visible
/// tail, full populate when either invariant breaks.
#[derive(Debug, Clone)]
pub struct IncrementalPathBuilder {
    tuning: PathTuning,
    points: Vec<PathPoint>,
    /// Data X interval the current path was built from (including buffer).
    covered_x: (i64, i64),
    /// Viewport ranges the current pixel coordinates were projected with.
    projected_x: (i64, i64),
    projected_y: (f64, f64),
    surface: SurfaceSize,
    pinned_at_populate: bool,
    appended_since_populate: usize,
    valid: bool,
}

impl IncrementalPathBuilder {
    #[must_use]
    pub fn new(tuning: PathTuning) -> Self {
        Self {
            tuning,
            points: Vec::new(),
            covered_x: (0, 0),
            projected_x: (0, 0),
            projected_y: (0.0, 0.0),
            surface: SurfaceSize::new(0, 0),
            pinned_at_populate: false,
            appended_since_populate: 0,
            valid: false,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> PathTuning {
        self.tuning
    }

    #[must_use]
    pub fn path(&self) -> &[PathPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the current path unusable; the next refresh must populate.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.points.clear();
        self.appended_since_populate = 0;
    }

    /// Full rebuild from the store over the visible range plus the query
    /// buffer on each side.
    pub fn populate(&mut self, store: &SampleStore, viewport: &Viewport, surface: SurfaceSize) {
        let (x_min, x_max) = viewport.rendered_x_range();
        let buffered = (
            x_min.saturating_sub(self.tuning.query_buffer_ms),
            x_max.saturating_add(self.tuning.query_buffer_ms),
        );
        let visible =
            store.range_inclusive_approx(buffered.0, buffered.1, self.tuning.search_tolerance);

        self.points.clear();
        self.points.reserve(visible.len());
        self.projected_x = (x_min, x_max);
        self.projected_y = viewport.rendered_y_range();
        self.surface = surface;
        for sample in visible {
            if let Some(point) = project(*sample, self.projected_x, self.projected_y, surface) {
                self.points.push(point);
            }
        }

        self.covered_x = buffered;
        self.pinned_at_populate = viewport.is_pinned_to_now();
        self.appended_since_populate = 0;
        self.valid = true;
        trace!(points = self.points.len(), "populated path");
    }

    /// Cheap path: extends the polyline with one more segment.
    ///
    /// Applies only while the point is inside the covered range (or ahead of
    /// it while pinned to now), the projection ranges are current, and the
    /// incremental budget is not exhausted. Returns false when the caller
    /// must populate instead.
    pub fn append_sample(
        &mut self,
        sample: Sample,
        viewport: &Viewport,
        surface: SurfaceSize,
    ) -> bool {
        if !self.valid
            || self.surface != surface
            || self.projected_x != viewport.rendered_x_range()
            || self.projected_y != viewport.rendered_y_range()
        {
            return false;
        }
        if self.appended_since_populate >= self.tuning.max_incremental_points {
            return false;
        }

        let ahead_while_pinned = viewport.is_pinned_to_now() && sample.timestamp >= self.covered_x.1;
        let inside_covered =
            sample.timestamp >= self.covered_x.0 && sample.timestamp <= self.covered_x.1;
        if !inside_covered && !ahead_while_pinned {
            return false;
        }

        let Some(point) = project(sample, self.projected_x, self.projected_y, surface) else {
            return false;
        };
        self.points.push(point);
        self.covered_x.1 = self.covered_x.1.max(sample.timestamp);
        self.appended_since_populate += 1;
        true
    }

    /// Re-maps existing pixel coordinates from the ranges the path was
    /// projected with to the viewport's current ranges, without touching the
    /// store. Returns false when no valid path exists or the surface changed.
    pub fn transform(&mut self, viewport: &Viewport, surface: SurfaceSize) -> bool {
        if !self.valid || !surface.is_valid() || self.surface != surface {
            return false;
        }

        let (new_x_min, new_x_max) = viewport.rendered_x_range();
        let (new_y_min, new_y_max) = viewport.rendered_y_range();
        if self.projected_x == (new_x_min, new_x_max) && self.projected_y == (new_y_min, new_y_max)
        {
            return true;
        }
        let old_x_span = (self.projected_x.1 - self.projected_x.0) as f64;
        let new_x_span = (new_x_max - new_x_min) as f64;
        let old_y_span = self.projected_y.1 - self.projected_y.0;
        let new_y_span = new_y_max - new_y_min;
        if old_x_span <= 0.0 || new_x_span <= 0.0 || old_y_span <= 0.0 || new_y_span <= 0.0 {
            return false;
        }

        let width = f64::from(surface.width);
        let height = f64::from(surface.height);
        let sx = old_x_span / new_x_span;
        let ox = (self.projected_x.0 - new_x_min) as f64 / new_x_span * width;
        let sy = old_y_span / new_y_span;
        let oy = height * (new_y_max - self.projected_y.1) / new_y_span;

        for point in &mut self.points {
            point.x = point.x * sx + ox;
            point.y = point.y * sy + oy;
        }
        self.projected_x = (new_x_min, new_x_max);
        self.projected_y = (new_y_min, new_y_max);
        true
    }

    /// Whether the next refresh requires a full populate: no valid path,
    /// incremental budget exhausted, the visible range left coverage, or the
    /// pinned state toggled since the last populate.
    #[must_use]
    pub fn needs_populate(&self, viewport: &Viewport) -> bool {
        if !self.valid {
            return true;
        }
        if self.appended_since_populate >= self.tuning.max_incremental_points {
            return true;
        }
        if viewport.is_pinned_to_now() != self.pinned_at_populate {
            return true;
        }
        let (x_min, x_max) = viewport.rendered_x_range();
        if x_min < self.covered_x.0 {
            return true;
        }
        // While pinned to now the right edge may run ahead of coverage; the
        // next append extends it.
        !viewport.is_pinned_to_now() && x_max > self.covered_x.1
    }
}

/// Projects one sample into Y-down surface coordinates. `None` when a range
/// is degenerate or the value is not finite.
fn project(
    sample: Sample,
    x_range: (i64, i64),
    y_range: (f64, f64),
    surface: SurfaceSize,
) -> Option<PathPoint> {
    if !surface.is_valid() || !sample.value.is_finite() {
        return None;
    }
    let x_span = (x_range.1 - x_range.0) as f64;
    let y_span = y_range.1 - y_range.0;
    if x_span <= 0.0 || y_span <= 0.0 {
        return None;
    }
    let x = (sample.timestamp - x_range.0) as f64 / x_span * f64::from(surface.width);
    let y = (y_range.1 - sample.value) / y_span * f64::from(surface.height);
    Some(PathPoint { x, y })
}
