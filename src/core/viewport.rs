use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{ChartError, ChartResult};

/// Where a chart instance is placed, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlacementMode {
    /// Live-scrolling chart pinned to the latest sample.
    #[default]
    Live,
    /// Full review of a recorded run.
    StaticReview,
    /// Non-interactive thumbnail.
    PreviewOnly,
}

/// Interaction capabilities granted by a placement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub pan_x: bool,
    pub pan_y: bool,
    pub zoom_x: bool,
    pub zoom_y: bool,
    pub pinned_to_now_initial: bool,
}

impl PlacementMode {
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Live => Capabilities {
                pan_x: true,
                pan_y: false,
                zoom_x: false,
                zoom_y: true,
                pinned_to_now_initial: true,
            },
            Self::StaticReview => Capabilities {
                pan_x: true,
                pan_y: true,
                zoom_x: true,
                zoom_y: true,
                pinned_to_now_initial: false,
            },
            Self::PreviewOnly => Capabilities {
                pan_x: false,
                pan_y: false,
                zoom_x: false,
                zoom_y: false,
                pinned_to_now_initial: false,
            },
        }
    }
}

/// Tuning controls for rendered-range clamping and auto-scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTuning {
    /// Smallest rendered Y spread; degenerate requests are widened to this.
    pub min_y_spread: f64,
    /// Fractional buffer added around the true range when fitting snugly.
    pub buffer_scale: f64,
    /// Max fraction of the on-screen span an auto-scale step may move per call.
    pub damping_fraction: f64,
    /// Rendered Y range cap, as a multiple of the true range.
    pub max_range_multiplier: f64,
    /// Absolute floor of the rendered Y range cap.
    pub max_range_floor: f64,
    /// Smallest rendered X span in milliseconds.
    pub min_x_span_ms: i64,
}

impl Default for ViewportTuning {
    fn default() -> Self {
        Self {
            min_y_spread: 1.0,
            buffer_scale: 0.10,
            // Tuned shipped value, not derived; see DESIGN.md.
            damping_fraction: 0.05,
            max_range_multiplier: 100.0,
            max_range_floor: 10.0,
            min_x_span_ms: 1_000,
        }
    }
}

impl ViewportTuning {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.min_y_spread.is_finite() || self.min_y_spread <= 0.0 {
            return Err(ChartError::InvalidData(
                "viewport min y spread must be finite and > 0".to_owned(),
            ));
        }
        if !self.buffer_scale.is_finite() || self.buffer_scale < 0.0 {
            return Err(ChartError::InvalidData(
                "viewport buffer scale must be finite and >= 0".to_owned(),
            ));
        }
        if !self.damping_fraction.is_finite()
            || self.damping_fraction <= 0.0
            || self.damping_fraction > 1.0
        {
            return Err(ChartError::InvalidData(
                "viewport damping fraction must be in (0, 1]".to_owned(),
            ));
        }
        if !self.max_range_multiplier.is_finite() || self.max_range_multiplier <= 0.0 {
            return Err(ChartError::InvalidData(
                "viewport max range multiplier must be finite and > 0".to_owned(),
            ));
        }
        if !self.max_range_floor.is_finite() || self.max_range_floor <= 0.0 {
            return Err(ChartError::InvalidData(
                "viewport max range floor must be finite and > 0".to_owned(),
            ));
        }
        if self.min_x_span_ms <= 0 {
            return Err(ChartError::InvalidData(
                "viewport min x span must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Rendered-range state machine for one chart instance.
///
/// Owns every mutation of the rendered axis ranges; all clamps and
/// capability checks live here. Operations disallowed by the placement mode
/// are silent no-ops, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    mode: PlacementMode,
    tuning: ViewportTuning,
    rendered_x_min: i64,
    rendered_x_max: i64,
    rendered_y_min: f64,
    rendered_y_max: f64,
    y_limit_min: f64,
    y_limit_max: f64,
    pinned_to_now: bool,
}

impl Viewport {
    #[must_use]
    pub fn new(mode: PlacementMode) -> Self {
        Self {
            mode,
            tuning: ViewportTuning::default(),
            rendered_x_min: 0,
            rendered_x_max: 0,
            rendered_y_min: 0.0,
            rendered_y_max: 0.0,
            y_limit_min: f64::INFINITY,
            y_limit_max: f64::NEG_INFINITY,
            pinned_to_now: mode.capabilities().pinned_to_now_initial,
        }
    }

    pub fn with_tuning(mode: PlacementMode, tuning: ViewportTuning) -> ChartResult<Self> {
        let tuning = tuning.validate()?;
        let mut viewport = Self::new(mode);
        viewport.tuning = tuning;
        Ok(viewport)
    }

    #[must_use]
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    #[must_use]
    pub fn tuning(&self) -> ViewportTuning {
        self.tuning
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.mode.capabilities()
    }

    #[must_use]
    pub fn is_pinned_to_now(&self) -> bool {
        self.pinned_to_now
    }

    pub fn set_pinned_to_now(&mut self, pinned: bool) {
        self.pinned_to_now = pinned;
    }

    #[must_use]
    pub fn rendered_x_range(&self) -> (i64, i64) {
        (self.rendered_x_min, self.rendered_x_max)
    }

    #[must_use]
    pub fn rendered_y_range(&self) -> (f64, f64) {
        (self.rendered_y_min, self.rendered_y_max)
    }

    /// True min/max values observed so far, once any finite value arrived.
    #[must_use]
    pub fn y_limits(&self) -> Option<(f64, f64)> {
        if self.y_limit_min <= self.y_limit_max {
            Some((self.y_limit_min, self.y_limit_max))
        } else {
            None
        }
    }

    /// Records a value into the running true min/max. Non-finite input is a
    /// degenerate-state policy case: dropped, never propagated.
    pub fn observe_value(&mut self, value: f64) {
        if !value.is_finite() {
            warn!(value, "dropping non-finite sample value from y limits");
            return;
        }
        self.y_limit_min = self.y_limit_min.min(value);
        self.y_limit_max = self.y_limit_max.max(value);
    }

    /// Sets the rendered X range directly (engine-driven live scroll).
    pub fn set_rendered_x_range(&mut self, x_min: i64, x_max: i64) {
        let (lo, hi) = if x_min <= x_max {
            (x_min, x_max)
        } else {
            (x_max, x_min)
        };
        self.rendered_x_min = lo;
        self.rendered_x_max = hi;
    }

    /// Sets the rendered Y range, subject to the min-spread floor and the
    /// max-range cap.
    ///
    /// A request wider than `max(max_range_floor, true_span × multiplier)` is
    /// rejected and the previous range retained, unless the true range is
    /// degenerate. Non-finite requests fall back to the minimum-spread floor.
    pub fn set_rendered_y_range(&mut self, y_min: f64, y_max: f64) {
        if !y_min.is_finite() || !y_max.is_finite() {
            warn!("non-finite rendered y range requested, applying min-spread fallback");
            if self.rendered_y_max - self.rendered_y_min <= 0.0 {
                let half = self.tuning.min_y_spread / 2.0;
                self.rendered_y_min = -half;
                self.rendered_y_max = half;
            }
            return;
        }

        let (lo, hi) = if y_min <= y_max {
            (y_min, y_max)
        } else {
            (y_max, y_min)
        };

        if let Some((limit_min, limit_max)) = self.y_limits() {
            let true_span = limit_max - limit_min;
            if true_span > f64::EPSILON {
                let cap = (true_span * self.tuning.max_range_multiplier)
                    .max(self.tuning.max_range_floor);
                if hi - lo > cap {
                    trace!(
                        requested = hi - lo,
                        cap, "rejecting rendered y range wider than cap"
                    );
                    return;
                }
            }
        }

        let (lo, hi) = self.clamp_min_spread(lo, hi);
        self.rendered_y_min = lo;
        self.rendered_y_max = hi;
    }

    /// Live auto-scale step.
    ///
    /// Updates the true limits with `latest_value`, computes the ideal
    /// buffered range and moves the rendered range toward it by at most
    /// `damping_fraction` of the current span. The range only ever expands;
    /// a degenerate (uninitialized) range snaps straight to the ideal.
    pub fn adjust_y_axis_step(&mut self, latest_value: f64) {
        self.observe_value(latest_value);
        let Some((limit_min, limit_max)) = self.y_limits() else {
            return;
        };

        let buffer = self.y_buffer(limit_min, limit_max);
        let ideal_min = limit_min - buffer;
        let ideal_max = limit_max + buffer;

        let current_span = self.rendered_y_max - self.rendered_y_min;
        if current_span <= 0.0 {
            let (lo, hi) = self.clamp_min_spread(ideal_min, ideal_max);
            self.rendered_y_min = lo;
            self.rendered_y_max = hi;
            return;
        }

        let max_move = current_span * self.tuning.damping_fraction;
        if ideal_min < self.rendered_y_min {
            let step = (self.rendered_y_min - ideal_min).min(max_move);
            self.rendered_y_min -= step;
        }
        if ideal_max > self.rendered_y_max {
            let step = (ideal_max - self.rendered_y_max).min(max_move);
            self.rendered_y_max += step;
        }
    }

    /// Forces the rendered Y range back to the true min/max.
    pub fn request_reset_zoom_in_y(&mut self) {
        let Some((limit_min, limit_max)) = self.y_limits() else {
            return;
        };
        let (lo, hi) = self.clamp_min_spread(limit_min, limit_max);
        self.rendered_y_min = lo;
        self.rendered_y_max = hi;
    }

    /// Fits the rendered Y range snugly around `[y_min, y_max]` with the
    /// standard buffer.
    pub fn fit_y_range_to(&mut self, y_min: f64, y_max: f64) {
        if !y_min.is_finite() || !y_max.is_finite() {
            warn!("non-finite fit range requested, ignoring");
            return;
        }
        let buffer = self.y_buffer(y_min, y_max);
        let (lo, hi) = self.clamp_min_spread(y_min - buffer, y_max + buffer);
        self.rendered_y_min = lo;
        self.rendered_y_max = hi;
    }

    /// Pans by `dx` milliseconds and `dy` value units, per-axis
    /// capability-gated. Returns whether anything changed.
    pub fn pan(&mut self, dx: i64, dy: f64) -> bool {
        let caps = self.mode.capabilities();
        let mut changed = false;
        if caps.pan_x && dx != 0 {
            self.rendered_x_min += dx;
            self.rendered_x_max += dx;
            changed = true;
        }
        if caps.pan_y && dy != 0.0 && dy.is_finite() {
            self.rendered_y_min += dy;
            self.rendered_y_max += dy;
            changed = true;
        }
        changed
    }

    /// Zooms the X range around `anchor`; `factor > 1` zooms in.
    /// Capability-gated no-op; span clamped to `min_x_span_ms`.
    pub fn zoom_x(&mut self, factor: f64, anchor: i64) -> bool {
        if !self.mode.capabilities().zoom_x {
            return false;
        }
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let span = (self.rendered_x_max - self.rendered_x_min) as f64;
        if span <= 0.0 {
            return false;
        }
        let target = (span / factor).max(self.tuning.min_x_span_ms as f64);
        let ratio = (anchor - self.rendered_x_min) as f64 / span;
        let new_min = anchor as f64 - ratio * target;
        let before = (self.rendered_x_min, self.rendered_x_max);
        self.set_rendered_x_range(new_min.round() as i64, (new_min + target).round() as i64);
        (self.rendered_x_min, self.rendered_x_max) != before
    }

    /// Zooms the Y range around `anchor`; `factor > 1` zooms in.
    /// Capability-gated no-op; same clamps as [`Self::set_rendered_y_range`].
    pub fn zoom_y(&mut self, factor: f64, anchor: f64) -> bool {
        if !self.mode.capabilities().zoom_y {
            return false;
        }
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return false;
        }
        let span = self.rendered_y_max - self.rendered_y_min;
        if span <= 0.0 {
            return false;
        }
        let target = span / factor;
        let ratio = (anchor - self.rendered_y_min) / span;
        let new_min = anchor - ratio * target;
        let before = (self.rendered_y_min, self.rendered_y_max);
        self.set_rendered_y_range(new_min, new_min + target);
        (self.rendered_y_min, self.rendered_y_max) != before
    }

    /// Resets ranges, limits and pinned state to their construction values.
    pub fn clear(&mut self) {
        *self = Self {
            tuning: self.tuning,
            ..Self::new(self.mode)
        };
    }

    /// Fixed fractional buffer with a floor, used wherever data is fitted
    /// snugly.
    #[must_use]
    pub fn y_buffer(&self, y_min: f64, y_max: f64) -> f64 {
        ((y_max - y_min).abs() * self.tuning.buffer_scale).max(self.tuning.min_y_spread)
    }

    fn clamp_min_spread(&self, lo: f64, hi: f64) -> (f64, f64) {
        let spread = hi - lo;
        if spread >= self.tuning.min_y_spread {
            return (lo, hi);
        }
        let center = (lo + hi) / 2.0;
        let half = self.tuning.min_y_spread / 2.0;
        (center - half, center + half)
    }
}
