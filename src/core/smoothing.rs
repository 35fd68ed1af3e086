use serde::{Deserialize, Serialize};

use crate::core::types::Sample;
use crate::error::{ChartError, ChartResult};

/// Convolution kernel shape used to blend raw samples into displayed points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KernelKind {
    #[default]
    Gaussian,
    Average,
}

/// Causal smoothing configuration, immutable per render pass.
///
/// Swapping the configuration invalidates the whole displayed series; the
/// caller triggers the O(n·window) recompute explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub window_size: usize,
    pub kernel: KernelKind,
    pub sigma: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            kernel: KernelKind::Gaussian,
            sigma: 2.0,
        }
    }
}

impl SmoothingConfig {
    fn validate(self) -> ChartResult<Self> {
        if self.window_size == 0 {
            return Err(ChartError::InvalidData(
                "smoothing window size must be >= 1".to_owned(),
            ));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(ChartError::InvalidData(
                "smoothing sigma must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Fixed-size causal convolution over the most recent raw samples.
///
/// `kernel[0]` weights the newest sample; older samples take the tail
/// weights. The one-sided gaussian kernel is normalized to sum to 1, so a
/// uniform input passes through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingFilter {
    config: SmoothingConfig,
    kernel: Vec<f64>,
}

impl SmoothingFilter {
    pub fn new(config: SmoothingConfig) -> ChartResult<Self> {
        let config = config.validate()?;
        Ok(Self {
            kernel: build_kernel(config),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> SmoothingConfig {
        self.config
    }

    #[must_use]
    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Displayed value at `index`: weighted sum of
    /// `raw[index - window + 1 ..= index]` against the kernel.
    ///
    /// Near the series start, only the available points are summed and the
    /// result is rescaled by the reciprocal of the kernel mass actually used,
    /// so early points are not artificially damped.
    pub fn display_value_at(&self, raw: &[Sample], index: usize) -> ChartResult<f64> {
        if index >= raw.len() {
            return Err(ChartError::InvalidData(format!(
                "smoothing index {index} out of bounds for {} raw samples",
                raw.len()
            )));
        }

        let mut weighted_sum = 0.0;
        let mut used_mass = 0.0;
        for (offset, weight) in self.kernel.iter().enumerate() {
            if offset > index {
                break;
            }
            weighted_sum += weight * raw[index - offset].value;
            used_mass += weight;
        }
        Ok(weighted_sum / used_mass)
    }

    /// Displayed point at `index`: the raw timestamp with the smoothed value.
    pub fn display_point_at(&self, raw: &[Sample], index: usize) -> ChartResult<Sample> {
        let value = self.display_value_at(raw, index)?;
        Ok(Sample::new(raw[index].timestamp, value))
    }

    /// Recomputes the entire displayed series from raw samples, O(n·window).
    pub fn recompute_series(&self, raw: &[Sample]) -> ChartResult<Vec<Sample>> {
        let mut displayed = Vec::with_capacity(raw.len());
        for index in 0..raw.len() {
            displayed.push(self.display_point_at(raw, index)?);
        }
        Ok(displayed)
    }
}

fn build_kernel(config: SmoothingConfig) -> Vec<f64> {
    let n = config.window_size;
    match config.kernel {
        KernelKind::Average => vec![1.0 / n as f64; n],
        KernelKind::Gaussian => {
            let two_sigma_squared = 2.0 * config.sigma * config.sigma;
            let mut kernel: Vec<f64> = (0..n)
                .map(|i| {
                    let distance = i as f64;
                    (-(distance * distance) / two_sigma_squared).exp()
                })
                .collect();
            let mass: f64 = kernel.iter().sum();
            for weight in &mut kernel {
                *weight /= mass;
            }
            kernel
        }
    }
}
