use tracing::debug;

use crate::core::types::Sample;
use crate::error::{ChartError, ChartResult};

/// Window size at which the approximate search stops narrowing.
pub const DEFAULT_SEARCH_TOLERANCE: usize = 8;

/// Matching-point count below which a prune pass is skipped.
pub const DEFAULT_MIN_PRUNE_SIZE: usize = 32;

/// Time-ordered container for the displayed sample series.
///
/// Timestamps are non-decreasing; the store never re-sorts. Appends are
/// validated, bulk loads are assumed pre-sorted (debug-asserted).
#[derive(Debug, Clone)]
pub struct SampleStore {
    samples: Vec<Sample>,
    min_prune_size: usize,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_prune_threshold(DEFAULT_MIN_PRUNE_SIZE)
    }

    /// Creates a store whose prune operations only pay their removal pass
    /// once at least `min_prune_size` points qualify.
    #[must_use]
    pub fn with_prune_threshold(min_prune_size: usize) -> Self {
        Self {
            samples: Vec::new(),
            min_prune_size,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn min_prune_size(&self) -> usize {
        self.min_prune_size
    }

    /// Appends one sample. Timestamps must be non-decreasing; equal
    /// timestamps are allowed.
    pub fn append(&mut self, sample: Sample) -> ChartResult<()> {
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                return Err(ChartError::OutOfOrderAppend {
                    prev: last.timestamp,
                    next: sample.timestamp,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Replaces the whole series with a pre-sorted batch.
    pub fn set_all(&mut self, samples: Vec<Sample>) {
        debug_assert!(
            samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "set_all expects timestamps sorted non-decreasing"
        );
        debug!(count = samples.len(), "replace sample series");
        self.samples = samples;
    }

    /// Splices a pre-sorted batch of earlier history in front of the series.
    ///
    /// Every timestamp in `earlier` must be <= the current first timestamp.
    pub fn prepend_all(&mut self, mut earlier: Vec<Sample>) -> ChartResult<()> {
        debug_assert!(
            earlier.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "prepend_all expects timestamps sorted non-decreasing"
        );
        if let (Some(tail), Some(first)) = (earlier.last(), self.samples.first()) {
            if tail.timestamp > first.timestamp {
                return Err(ChartError::OutOfOrderAppend {
                    prev: tail.timestamp,
                    next: first.timestamp,
                });
            }
        }
        debug!(count = earlier.len(), "prepend history batch");
        earlier.append(&mut self.samples);
        self.samples = earlier;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn min_x(&self) -> ChartResult<i64> {
        self.samples
            .first()
            .map(|sample| sample.timestamp)
            .ok_or(ChartError::EmptyStore)
    }

    pub fn max_x(&self) -> ChartResult<i64> {
        self.samples
            .last()
            .map(|sample| sample.timestamp)
            .ok_or(ChartError::EmptyStore)
    }

    /// Approximate index search.
    ///
    /// Narrows an inclusive `[start, end]` window around `timestamp` and
    /// stops once the window is `tolerance` wide or less, returning its start
    /// or end per `prefer_start`. The result differs from the exact boundary
    /// index by at most `tolerance`; an exact timestamp hit returns its index
    /// immediately.
    pub fn approximate_search(
        &self,
        timestamp: i64,
        tolerance: usize,
        prefer_start: bool,
    ) -> ChartResult<usize> {
        if self.samples.is_empty() {
            return Err(ChartError::EmptyStore);
        }
        Ok(self.bisect(timestamp, tolerance, prefer_start))
    }

    /// Exact variant of [`Self::approximate_search`] (`tolerance = 0`).
    pub fn exact_search(&self, timestamp: i64, prefer_start: bool) -> ChartResult<usize> {
        self.approximate_search(timestamp, 0, prefer_start)
    }

    /// Index of the last sample with `timestamp <= t`, if any.
    #[must_use]
    pub fn floor_index(&self, t: i64) -> Option<usize> {
        let first = self.samples.first()?;
        if first.timestamp > t {
            return None;
        }
        let mut index = self.bisect(t, 0, true);
        while index + 1 < self.samples.len() && self.samples[index + 1].timestamp <= t {
            index += 1;
        }
        while self.samples[index].timestamp > t {
            index -= 1;
        }
        Some(index)
    }

    /// Index of the first sample with `timestamp >= t`, if any.
    #[must_use]
    pub fn ceiling_index(&self, t: i64) -> Option<usize> {
        let last = self.samples.last()?;
        if last.timestamp < t {
            return None;
        }
        let mut index = self.bisect(t, 0, false);
        while index > 0 && self.samples[index - 1].timestamp >= t {
            index -= 1;
        }
        while self.samples[index].timestamp < t {
            index += 1;
        }
        Some(index)
    }

    #[must_use]
    pub fn floor_sample(&self, t: i64) -> Option<Sample> {
        self.floor_index(t).map(|index| self.samples[index])
    }

    #[must_use]
    pub fn ceiling_sample(&self, t: i64) -> Option<Sample> {
        self.ceiling_index(t).map(|index| self.samples[index])
    }

    /// Index of the sample nearest to `t`; ties favor the floor.
    pub fn closest_index_to(&self, t: i64) -> ChartResult<usize> {
        if self.samples.is_empty() {
            return Err(ChartError::EmptyStore);
        }
        match (self.floor_index(t), self.ceiling_index(t)) {
            (Some(floor), Some(ceiling)) => {
                let floor_distance = t - self.samples[floor].timestamp;
                let ceiling_distance = self.samples[ceiling].timestamp - t;
                if floor_distance <= ceiling_distance {
                    Ok(floor)
                } else {
                    Ok(ceiling)
                }
            }
            (Some(floor), None) => Ok(floor),
            (None, Some(ceiling)) => Ok(ceiling),
            (None, None) => Err(ChartError::EmptyStore),
        }
    }

    /// Contiguous sub-slice whose timestamps fall in `[x_min, x_max]`,
    /// with exact boundaries.
    #[must_use]
    pub fn range_inclusive(&self, x_min: i64, x_max: i64) -> &[Sample] {
        if self.samples.is_empty() || x_min > x_max {
            return &[];
        }
        match (self.ceiling_index(x_min), self.floor_index(x_max)) {
            (Some(start), Some(end)) if start <= end => &self.samples[start..=end],
            _ => &[],
        }
    }

    /// Render-path range query using two approximate searches.
    ///
    /// Always a superset of the exact range, widened by at most `tolerance`
    /// extra boundary points per side; the caller trades those extra points
    /// for fewer comparisons.
    #[must_use]
    pub fn range_inclusive_approx(&self, x_min: i64, x_max: i64, tolerance: usize) -> &[Sample] {
        if self.samples.is_empty() || x_min > x_max {
            return &[];
        }
        let start = self.bisect(x_min, tolerance, true);
        let end = self.bisect(x_max, tolerance, false).max(start);
        &self.samples[start..=end]
    }

    /// Suffix query for the pinned-to-now case: one lower-bound search, the
    /// end is always the latest sample.
    #[must_use]
    pub fn range_to_end(&self, x_min: i64, tolerance: usize) -> &[Sample] {
        if self.samples.is_empty() {
            return &[];
        }
        let start = self.bisect(x_min, tolerance, true);
        &self.samples[start..]
    }

    /// Evicts points with `timestamp < threshold` once enough qualify.
    ///
    /// Counts first and skips the removal pass entirely below the prune
    /// threshold. Returns the number of evicted points.
    pub fn prune_before(&mut self, threshold: i64) -> usize {
        let count = match self.floor_index(threshold - 1) {
            Some(index) => index + 1,
            None => 0,
        };
        if count < self.min_prune_size {
            return 0;
        }
        debug!(count, threshold, "prune samples before threshold");
        self.samples.drain(0..count);
        count
    }

    /// Evicts points with `lo < timestamp < hi` once enough qualify.
    pub fn prune_between(&mut self, lo: i64, hi: i64) -> usize {
        if hi - lo < 2 {
            return 0;
        }
        let (Some(start), Some(end)) = (self.ceiling_index(lo + 1), self.floor_index(hi - 1))
        else {
            return 0;
        };
        if start > end {
            return 0;
        }
        let count = end - start + 1;
        if count < self.min_prune_size {
            return 0;
        }
        debug!(count, lo, hi, "prune samples between bounds");
        self.samples.drain(start..=end);
        count
    }

    /// Iterative tolerance-bounded bisection. Assumes a non-empty store.
    fn bisect(&self, timestamp: i64, tolerance: usize, prefer_start: bool) -> usize {
        let mut start = 0usize;
        let mut end = self.samples.len() - 1;
        while end - start > tolerance {
            let mid = start + (end - start) / 2;
            let mid_ts = self.samples[mid].timestamp;
            if mid_ts < timestamp {
                start = mid + 1;
            } else if mid_ts > timestamp {
                if mid == start {
                    end = start;
                } else {
                    end = mid - 1;
                }
            } else {
                return mid;
            }
        }
        if prefer_start { start } else { end }
    }
}

#[cfg(test)]
mod tests {
    use super::SampleStore;
    use crate::core::types::Sample;

    fn store_of(timestamps: &[i64]) -> SampleStore {
        let mut store = SampleStore::new();
        for &t in timestamps {
            store.append(Sample::new(t, t as f64)).expect("in order");
        }
        store
    }

    #[test]
    fn floor_and_ceiling_handle_gaps_and_exact_hits() {
        let store = store_of(&[0, 100, 200]);
        assert_eq!(store.floor_index(150), Some(1));
        assert_eq!(store.ceiling_index(150), Some(2));
        assert_eq!(store.floor_index(100), Some(1));
        assert_eq!(store.ceiling_index(100), Some(1));
        assert_eq!(store.floor_index(-1), None);
        assert_eq!(store.ceiling_index(201), None);
    }

    #[test]
    fn floor_and_ceiling_handle_duplicate_timestamps() {
        let store = store_of(&[0, 100, 100, 100, 200]);
        assert_eq!(store.floor_index(100), Some(3));
        assert_eq!(store.ceiling_index(100), Some(1));
    }

    #[test]
    fn approximate_range_is_superset_of_exact_range() {
        let store = store_of(&(0..50).map(|i| i * 10).collect::<Vec<_>>());
        let exact = store.range_inclusive(105, 305);
        let approx = store.range_inclusive_approx(105, 305, 8);
        assert!(approx.len() >= exact.len());
        assert!(approx.first().unwrap().timestamp <= exact.first().unwrap().timestamp);
        assert!(approx.last().unwrap().timestamp >= exact.last().unwrap().timestamp);
    }
}
