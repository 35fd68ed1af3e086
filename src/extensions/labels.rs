use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::store::SampleStore;
use crate::core::types::Sample;

/// Which side of the sample coverage a pending label is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingBucket {
    NeedsBefore,
    NeedsAfter,
    NeedsBoth,
}

/// Projection outcome for one annotation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LabelProjection {
    /// The label lies on the segment between its floor and ceiling samples.
    Resolved(Sample),
    /// Not yet resolvable. When one side of the coverage exists,
    /// `approximate` carries a provisional placement pinned to that side's
    /// value, shown immediately and refined later.
    Pending {
        bucket: PendingBucket,
        approximate: Option<Sample>,
    },
}

/// Pending bucket sizes, exposed for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingCounts {
    pub needs_before: usize,
    pub needs_after: usize,
    pub needs_both: usize,
}

impl PendingCounts {
    #[must_use]
    pub fn total(self) -> usize {
        self.needs_before + self.needs_after + self.needs_both
    }
}

/// Resolves annotation timestamps into renderable points against a possibly
/// partial sample series.
///
/// Labels outside current coverage are held in pending buckets and
/// re-attempted as coverage extends; resolution replaces any provisional
/// placement.
#[derive(Debug, Clone, Default)]
pub struct LabelProjector {
    resolved: IndexMap<i64, Sample>,
    approximate: IndexMap<i64, Sample>,
    needs_before: Vec<i64>,
    needs_after: Vec<i64>,
    needs_both: Vec<i64>,
}

impl LabelProjector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects one annotation timestamp against the store, without
    /// registering it.
    #[must_use]
    pub fn project(store: &SampleStore, source_timestamp: i64) -> LabelProjection {
        let floor = store.floor_sample(source_timestamp);
        let ceiling = store.ceiling_sample(source_timestamp);
        match (floor, ceiling) {
            (None, None) => LabelProjection::Pending {
                bucket: PendingBucket::NeedsBoth,
                approximate: None,
            },
            (Some(floor), None) => LabelProjection::Pending {
                bucket: PendingBucket::NeedsAfter,
                approximate: Some(Sample::new(source_timestamp, floor.value)),
            },
            (None, Some(ceiling)) => LabelProjection::Pending {
                bucket: PendingBucket::NeedsBefore,
                approximate: Some(Sample::new(source_timestamp, ceiling.value)),
            },
            (Some(floor), Some(ceiling)) => {
                if floor.timestamp == ceiling.timestamp {
                    return LabelProjection::Resolved(Sample::new(source_timestamp, floor.value));
                }
                let progress = (source_timestamp - floor.timestamp) as f64
                    / (ceiling.timestamp - floor.timestamp) as f64;
                let value = floor.value + (ceiling.value - floor.value) * progress;
                LabelProjection::Resolved(Sample::new(source_timestamp, value))
            }
        }
    }

    /// Registers a label and tracks it until resolved.
    pub fn add_label(&mut self, store: &SampleStore, source_timestamp: i64) -> LabelProjection {
        self.remove_label(source_timestamp);
        let projection = Self::project(store, source_timestamp);
        self.track(source_timestamp, projection);
        projection
    }

    /// Drops a label from every internal set. Returns whether it existed.
    pub fn remove_label(&mut self, source_timestamp: i64) -> bool {
        let mut removed = self.resolved.shift_remove(&source_timestamp).is_some();
        removed |= self.approximate.shift_remove(&source_timestamp).is_some();
        for bucket in [
            &mut self.needs_before,
            &mut self.needs_after,
            &mut self.needs_both,
        ] {
            if let Some(position) = bucket.iter().position(|&t| t == source_timestamp) {
                bucket.remove(position);
                removed = true;
            }
        }
        removed
    }

    /// Re-attempts pending resolution after a single sample append.
    ///
    /// `NeedsBoth` is always re-attempted. `NeedsAfter` is re-attempted once
    /// the new sample's timestamp has reached the bucket's earliest pending
    /// label. `NeedsBefore` is re-attempted once coverage start has reached
    /// its latest pending label, which on a pure append can only newly hold
    /// for the first sample.
    pub fn on_sample_appended(&mut self, store: &SampleStore, new_timestamp: i64) {
        self.reattempt_bucket(store, PendingBucket::NeedsBoth);

        let retry_after = self
            .needs_after
            .iter()
            .min()
            .is_some_and(|&earliest| earliest <= new_timestamp);
        if retry_after {
            self.reattempt_bucket(store, PendingBucket::NeedsAfter);
        }

        let coverage_start = store.min_x().ok();
        let retry_before = match (self.needs_before.iter().max(), coverage_start) {
            (Some(&latest), Some(start)) => start <= latest,
            _ => false,
        };
        if retry_before {
            self.reattempt_bucket(store, PendingBucket::NeedsBefore);
        }
    }

    /// Re-attempts every bucket after an earlier-history bulk load.
    pub fn on_samples_prepended(&mut self, store: &SampleStore) {
        self.reattempt_bucket(store, PendingBucket::NeedsBoth);
        self.reattempt_bucket(store, PendingBucket::NeedsBefore);
        self.reattempt_bucket(store, PendingBucket::NeedsAfter);
    }

    /// Re-projects every known label after the series was replaced.
    pub fn on_series_replaced(&mut self, store: &SampleStore) {
        let mut timestamps: Vec<i64> = self.resolved.keys().copied().collect();
        timestamps.extend(self.approximate.keys().copied());
        timestamps.extend(self.needs_before.iter().copied());
        timestamps.extend(self.needs_after.iter().copied());
        timestamps.extend(self.needs_both.iter().copied());
        timestamps.sort_unstable();
        timestamps.dedup();

        self.resolved.clear();
        self.approximate.clear();
        self.needs_before.clear();
        self.needs_after.clear();
        self.needs_both.clear();
        for t in timestamps {
            let projection = Self::project(store, t);
            self.track(t, projection);
        }
    }

    /// Resolved projections, ordered by timestamp.
    #[must_use]
    pub fn resolved_points(&self) -> Vec<Sample> {
        let mut points: Vec<Sample> = self.resolved.values().copied().collect();
        points.sort_by_key(|sample| sample.timestamp);
        points
    }

    /// Everything renderable right now: resolved points plus provisional
    /// placements for directional pending labels, ordered by timestamp.
    #[must_use]
    pub fn placements(&self) -> Vec<Sample> {
        let mut points: Vec<Sample> = self.resolved.values().copied().collect();
        points.extend(self.approximate.values().copied());
        points.sort_by_key(|sample| sample.timestamp);
        points
    }

    #[must_use]
    pub fn resolved_value_at(&self, source_timestamp: i64) -> Option<f64> {
        self.resolved.get(&source_timestamp).map(|s| s.value)
    }

    #[must_use]
    pub fn is_pending(&self, source_timestamp: i64) -> bool {
        self.approximate.contains_key(&source_timestamp)
            || self.needs_both.contains(&source_timestamp)
            || self.needs_before.contains(&source_timestamp)
            || self.needs_after.contains(&source_timestamp)
    }

    #[must_use]
    pub fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            needs_before: self.needs_before.len(),
            needs_after: self.needs_after.len(),
            needs_both: self.needs_both.len(),
        }
    }

    pub fn clear(&mut self) {
        self.resolved.clear();
        self.approximate.clear();
        self.needs_before.clear();
        self.needs_after.clear();
        self.needs_both.clear();
    }

    fn track(&mut self, source_timestamp: i64, projection: LabelProjection) {
        match projection {
            LabelProjection::Resolved(sample) => {
                self.resolved.insert(source_timestamp, sample);
            }
            LabelProjection::Pending {
                bucket,
                approximate,
            } => {
                if let Some(sample) = approximate {
                    self.approximate.insert(source_timestamp, sample);
                }
                self.bucket_mut(bucket).push(source_timestamp);
            }
        }
    }

    fn reattempt_bucket(&mut self, store: &SampleStore, bucket: PendingBucket) {
        let pending = std::mem::take(self.bucket_mut(bucket));
        if pending.is_empty() {
            return;
        }
        for t in pending {
            self.approximate.shift_remove(&t);
            let projection = Self::project(store, t);
            if matches!(projection, LabelProjection::Resolved(_)) {
                trace!(source_timestamp = t, "pending label resolved");
            }
            self.track(t, projection);
        }
    }

    fn bucket_mut(&mut self, bucket: PendingBucket) -> &mut Vec<i64> {
        match bucket {
            PendingBucket::NeedsBefore => &mut self.needs_before,
            PendingBucket::NeedsAfter => &mut self.needs_after,
            PendingBucket::NeedsBoth => &mut self.needs_both,
        }
    }
}
