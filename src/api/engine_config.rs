use serde::{Deserialize, Serialize};

use crate::core::path::PathTuning;
use crate::core::smoothing::SmoothingConfig;
use crate::core::store::DEFAULT_MIN_PRUNE_SIZE;
use crate::core::viewport::{PlacementMode, ViewportTuning};
use crate::error::{ChartError, ChartResult};

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load chart
/// setup without inventing their own ad-hoc format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartEngineConfig {
    pub placement_mode: PlacementMode,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub viewport_tuning: ViewportTuning,
    #[serde(default)]
    pub path_tuning: PathTuning,
    #[serde(default = "default_min_prune_size")]
    pub min_prune_size: usize,
    #[serde(default = "default_live_window_ms")]
    pub live_window_ms: i64,
}

impl Default for ChartEngineConfig {
    fn default() -> Self {
        Self::new(PlacementMode::Live)
    }
}

impl ChartEngineConfig {
    #[must_use]
    pub fn new(placement_mode: PlacementMode) -> Self {
        Self {
            placement_mode,
            smoothing: SmoothingConfig::default(),
            viewport_tuning: ViewportTuning::default(),
            path_tuning: PathTuning::default(),
            min_prune_size: default_min_prune_size(),
            live_window_ms: default_live_window_ms(),
        }
    }

    #[must_use]
    pub fn with_smoothing(mut self, smoothing: SmoothingConfig) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn with_viewport_tuning(mut self, tuning: ViewportTuning) -> Self {
        self.viewport_tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_path_tuning(mut self, tuning: PathTuning) -> Self {
        self.path_tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_min_prune_size(mut self, min_prune_size: usize) -> Self {
        self.min_prune_size = min_prune_size;
        self
    }

    #[must_use]
    pub fn with_live_window_ms(mut self, live_window_ms: i64) -> Self {
        self.live_window_ms = live_window_ms;
        self
    }

    pub fn validate(self) -> ChartResult<Self> {
        self.viewport_tuning.validate()?;
        self.path_tuning.validate()?;
        if self.min_prune_size == 0 {
            return Err(ChartError::InvalidData(
                "prune threshold must be >= 1".to_owned(),
            ));
        }
        if self.live_window_ms <= 0 {
            return Err(ChartError::InvalidData(
                "live window span must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

fn default_min_prune_size() -> usize {
    DEFAULT_MIN_PRUNE_SIZE
}

fn default_live_window_ms() -> i64 {
    20_000
}
