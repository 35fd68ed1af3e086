use indexmap::IndexMap;
use serde::Serialize;

use crate::core::types::StatKind;
use crate::core::viewport::PlacementMode;
use crate::extensions::labels::PendingCounts;

/// Serializable engine state summary for diagnostics and host tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub placement_mode: PlacementMode,
    pub pinned_to_now: bool,
    pub rendered_x: (i64, i64),
    pub rendered_y: (f64, f64),
    pub y_limits: Option<(f64, f64)>,
    pub raw_len: usize,
    pub displayed_len: usize,
    pub path_len: usize,
    pub resolved_labels: usize,
    pub pending_labels: PendingCounts,
    pub statistics: IndexMap<StatKind, f64>,
}
