use livetrace::core::{KernelKind, Sample, SmoothingConfig, SmoothingFilter};
use proptest::prelude::*;

proptest! {
    #[test]
    fn gaussian_kernel_is_normalized_for_any_shape(
        window_size in 1usize..64,
        sigma in 0.1f64..50.0,
    ) {
        let filter = SmoothingFilter::new(SmoothingConfig {
            window_size,
            kernel: KernelKind::Gaussian,
            sigma,
        })
        .expect("valid config");

        let mass: f64 = filter.kernel().iter().sum();
        prop_assert!((mass - 1.0).abs() <= 1e-9);
    }

    #[test]
    fn constant_series_is_a_fixed_point(
        window_size in 1usize..16,
        sigma in 0.1f64..10.0,
        len in 1usize..64,
        level in -1e6f64..1e6,
    ) {
        let filter = SmoothingFilter::new(SmoothingConfig {
            window_size,
            kernel: KernelKind::Gaussian,
            sigma,
        })
        .expect("valid config");

        let raw: Vec<Sample> = (0..len)
            .map(|i| Sample::new(i as i64 * 50, level))
            .collect();
        let displayed = filter.recompute_series(&raw).expect("recompute");
        for sample in displayed {
            prop_assert!((sample.value - level).abs() <= level.abs() * 1e-9 + 1e-9);
        }
    }

    #[test]
    fn blend_stays_inside_the_window_envelope(
        values in proptest::collection::vec(-1e3f64..1e3, 1..64),
        window_size in 1usize..8,
    ) {
        let filter = SmoothingFilter::new(SmoothingConfig {
            window_size,
            kernel: KernelKind::Average,
            sigma: 1.0,
        })
        .expect("valid config");

        let raw: Vec<Sample> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(i as i64 * 10, v))
            .collect();

        for index in 0..raw.len() {
            let lo = index.saturating_sub(window_size - 1);
            let window = &values[lo..=index];
            let min = window.iter().copied().fold(f64::INFINITY, f64::min);
            let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let value = filter.display_value_at(&raw, index).expect("in bounds");
            prop_assert!(value >= min - 1e-9 && value <= max + 1e-9);
        }
    }
}
