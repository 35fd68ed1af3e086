use chrono::TimeDelta;
use smallvec::SmallVec;

pub const MIN_VISIBLE_TICKS: usize = 3;
pub const MAX_VISIBLE_TICKS: usize = 6;
pub const TARGET_VISIBLE_TICKS: usize = 5;

/// Tick values are few; keep the hot path allocation-free.
pub type TickValues = SmallVec<[f64; 8]>;

/// One labeled Y-axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// Y-axis tick selector with position reuse across small range changes.
///
/// Ticks sit on global multiples of the current increment, so a pan or a
/// small zoom extends/trims the list at the edges instead of re-laying it
/// out. The increment is only recomputed when the visible count leaves
/// `[MIN_VISIBLE_TICKS, MAX_VISIBLE_TICKS]`, which keeps labels from
/// jittering during small interactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickGenerator {
    increment: f64,
}

impl TickGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active tick increment; 0 until first use.
    #[must_use]
    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn reset(&mut self) {
        self.increment = 0.0;
    }

    /// Tick values for `[y_min, y_max]`, reusing the current increment when
    /// its visible count stays acceptable.
    pub fn ticks_for_range(&mut self, y_min: f64, y_max: f64) -> TickValues {
        let span = y_max - y_min;
        if !y_min.is_finite() || !y_max.is_finite() || span <= 0.0 {
            return TickValues::new();
        }

        if self.increment > 0.0 {
            let count = count_multiples(y_min, y_max, self.increment);
            if (MIN_VISIBLE_TICKS..=MAX_VISIBLE_TICKS).contains(&count) {
                return emit_multiples(y_min, y_max, self.increment);
            }
        }

        let mut increment = nice_increment(span / TARGET_VISIBLE_TICKS as f64);
        while count_multiples(y_min, y_max, increment) < MIN_VISIBLE_TICKS {
            increment = next_smaller_nice(increment);
        }
        self.increment = increment;
        emit_multiples(y_min, y_max, increment)
    }

    /// Labeled variant of [`Self::ticks_for_range`].
    pub fn labeled_ticks_for_range(&mut self, y_min: f64, y_max: f64) -> Vec<Tick> {
        let values = self.ticks_for_range(y_min, y_max);
        values
            .into_iter()
            .map(|value| Tick {
                value,
                label: format_tick_label(value, self.increment),
            })
            .collect()
    }
}

/// Formats a tick value with precision derived from the tick increment.
#[must_use]
pub fn format_tick_label(value: f64, increment: f64) -> String {
    let decimals = if increment <= 0.0 || increment >= 1.0 {
        0
    } else {
        (-increment.log10().floor()) as usize
    };
    let decimals = decimals.min(6);
    format!("{value:.decimals$}")
}

/// Formats a timestamp relative to a recording origin as `m:ss`, or
/// `h:mm:ss` past the first hour. Used for X-axis tick labels.
#[must_use]
pub fn format_elapsed_label(timestamp_ms: i64, origin_ms: i64) -> String {
    let delta = TimeDelta::milliseconds(timestamp_ms - origin_ms);
    let total_seconds = delta.num_seconds();
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.abs();
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{minutes}:{seconds:02}")
    }
}

fn count_multiples(y_min: f64, y_max: f64, increment: f64) -> usize {
    let first = (y_min / increment).ceil();
    let last = (y_max / increment).floor();
    if last < first {
        0
    } else {
        (last - first) as usize + 1
    }
}

fn emit_multiples(y_min: f64, y_max: f64, increment: f64) -> TickValues {
    let mut ticks = TickValues::new();
    let first = (y_min / increment).ceil();
    let last = (y_max / increment).floor();
    let mut step = first;
    while step <= last {
        ticks.push(step * increment);
        step += 1.0;
    }
    ticks
}

/// Rounds `raw` up to the nearest 1/2/5 × 10^k increment.
fn nice_increment(raw: f64) -> f64 {
    let magnitude = 10_f64.powf(raw.abs().log10().floor());
    let mantissa = raw / magnitude;
    if mantissa <= 1.0 {
        magnitude
    } else if mantissa <= 2.0 {
        2.0 * magnitude
    } else if mantissa <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    }
}

fn next_smaller_nice(increment: f64) -> f64 {
    let magnitude = 10_f64.powf(increment.abs().log10().floor());
    let mantissa = increment / magnitude;
    if mantissa > 5.0 {
        5.0 * magnitude
    } else if mantissa > 2.0 {
        2.0 * magnitude
    } else if mantissa > 1.0 {
        magnitude
    } else {
        0.5 * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::{TickGenerator, format_elapsed_label, format_tick_label, nice_increment};

    #[test]
    fn nice_increment_rounds_up_to_ladder() {
        assert_eq!(nice_increment(1.2), 2.0);
        assert_eq!(nice_increment(3.0), 5.0);
        assert_eq!(nice_increment(7.5), 10.0);
        assert_eq!(nice_increment(0.03), 0.05);
    }

    #[test]
    fn tick_count_stays_in_visible_window() {
        let mut generator = TickGenerator::new();
        for span in [0.5, 1.0, 7.3, 42.0, 999.0, 12_345.6] {
            let ticks = generator.ticks_for_range(0.0, span);
            assert!(
                (3..=6).contains(&ticks.len()),
                "span {span} produced {} ticks",
                ticks.len()
            );
            generator.reset();
        }
    }

    #[test]
    fn label_precision_follows_increment() {
        assert_eq!(format_tick_label(2.0, 2.0), "2");
        assert_eq!(format_tick_label(0.25, 0.05), "0.25");
        assert_eq!(format_tick_label(1.5, 0.5), "1.5");
    }

    #[test]
    fn elapsed_labels_roll_over_to_hours() {
        assert_eq!(format_elapsed_label(75_000, 0), "1:15");
        assert_eq!(format_elapsed_label(3_600_000, 0), "1:00:00");
        assert_eq!(format_elapsed_label(0, 5_000), "-0:05");
    }
}
