use approx::assert_relative_eq;
use livetrace::ChartError;
use livetrace::core::{KernelKind, Sample, SmoothingConfig, SmoothingFilter};

fn gaussian(window_size: usize, sigma: f64) -> SmoothingFilter {
    SmoothingFilter::new(SmoothingConfig {
        window_size,
        kernel: KernelKind::Gaussian,
        sigma,
    })
    .expect("valid config")
}

fn average(window_size: usize) -> SmoothingFilter {
    SmoothingFilter::new(SmoothingConfig {
        window_size,
        kernel: KernelKind::Average,
        sigma: 1.0,
    })
    .expect("valid config")
}

fn raw_series(values: &[f64]) -> Vec<Sample> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Sample::new(i as i64 * 100, v))
        .collect()
}

#[test]
fn gaussian_kernel_sums_to_one() {
    for (window_size, sigma) in [(1, 1.0), (3, 1.0), (5, 2.0), (20, 0.5), (64, 10.0)] {
        let filter = gaussian(window_size, sigma);
        let mass: f64 = filter.kernel().iter().sum();
        assert_relative_eq!(mass, 1.0, max_relative = 1e-12);
    }
}

#[test]
fn gaussian_kernel_weights_decay_from_the_newest_sample() {
    let filter = gaussian(5, 1.5);
    let kernel = filter.kernel();
    for pair in kernel.windows(2) {
        assert!(pair[0] > pair[1]);
    }
}

#[test]
fn average_kernel_is_exactly_uniform() {
    for window_size in [1usize, 3, 7, 16] {
        let filter = average(window_size);
        for &weight in filter.kernel() {
            assert_eq!(weight, 1.0 / window_size as f64);
        }
    }
}

#[test]
fn uniform_input_is_unchanged_by_any_normalized_kernel() {
    let raw = raw_series(&[1.0, 1.0, 1.0, 1.0]);
    let filter = gaussian(3, 1.0);
    let value = filter.display_value_at(&raw, 3).expect("in bounds");
    assert_eq!(value, 1.0);
}

#[test]
fn series_start_rescales_by_used_kernel_mass() {
    // Only kernel[0] = 1/3 participates at index 0; rescaling by the used
    // mass must recover the raw value instead of damping it to a third.
    let raw = raw_series(&[3.0, 6.0]);
    let filter = average(3);
    let at_start = filter.display_value_at(&raw, 0).expect("in bounds");
    assert_relative_eq!(at_start, 3.0, max_relative = 1e-12);

    let at_one = filter.display_value_at(&raw, 1).expect("in bounds");
    assert_relative_eq!(at_one, 4.5, max_relative = 1e-12);
}

#[test]
fn newest_sample_dominates_a_gaussian_blend() {
    let raw = raw_series(&[0.0, 10.0]);
    let filter = gaussian(2, 1.0);
    let value = filter.display_value_at(&raw, 1).expect("in bounds");
    assert!(value > 5.0 && value < 10.0);
}

#[test]
fn window_of_one_is_the_identity() {
    let raw = raw_series(&[4.0, -2.5, 7.125]);
    let filter = gaussian(1, 1.0);
    let displayed = filter.recompute_series(&raw).expect("recompute");
    assert_eq!(displayed, raw);
}

#[test]
fn recompute_preserves_timestamps_and_length() {
    let raw = raw_series(&[1.0, 2.0, 4.0, 8.0, 16.0]);
    let filter = gaussian(3, 1.0);
    let displayed = filter.recompute_series(&raw).expect("recompute");

    assert_eq!(displayed.len(), raw.len());
    for (d, r) in displayed.iter().zip(&raw) {
        assert_eq!(d.timestamp, r.timestamp);
    }
    // The blend lags behind a rising series.
    assert!(displayed[4].value < raw[4].value);
    assert!(displayed[4].value > raw[2].value);
}

#[test]
fn invalid_configurations_are_rejected() {
    let zero_window = SmoothingFilter::new(SmoothingConfig {
        window_size: 0,
        kernel: KernelKind::Average,
        sigma: 1.0,
    });
    assert!(matches!(zero_window, Err(ChartError::InvalidData(_))));

    let bad_sigma = SmoothingFilter::new(SmoothingConfig {
        window_size: 3,
        kernel: KernelKind::Gaussian,
        sigma: 0.0,
    });
    assert!(matches!(bad_sigma, Err(ChartError::InvalidData(_))));

    let index_out_of_bounds = gaussian(3, 1.0).display_value_at(&raw_series(&[1.0]), 5);
    assert!(matches!(index_out_of_bounds, Err(ChartError::InvalidData(_))));
}
