use livetrace::ChartError;
use livetrace::core::{Sample, SampleStore};

fn store_from(points: &[(i64, f64)]) -> SampleStore {
    let mut store = SampleStore::new();
    for &(t, v) in points {
        store.append(Sample::new(t, v)).expect("ordered append");
    }
    store
}

#[test]
fn range_inclusive_matches_linear_scan_on_dense_series() {
    let points: Vec<(i64, f64)> = (0..100).map(|i| (i * 10, i as f64)).collect();
    let store = store_from(&points);

    for (a, b) in [(0, 990), (5, 335), (330, 330), (991, 2000), (-50, -1)] {
        let expected: Vec<i64> = points
            .iter()
            .map(|&(t, _)| t)
            .filter(|&t| a <= t && t <= b)
            .collect();
        let got: Vec<i64> = store
            .range_inclusive(a, b)
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(got, expected, "range [{a}, {b}]");
    }
}

#[test]
fn out_of_order_append_is_a_typed_error() {
    let mut store = SampleStore::new();
    store.append(Sample::new(100, 1.0)).expect("first append");
    let err = store.append(Sample::new(99, 2.0)).unwrap_err();
    assert!(matches!(
        err,
        ChartError::OutOfOrderAppend { prev: 100, next: 99 }
    ));

    // Equal timestamps stay legal: the contract is non-decreasing.
    store.append(Sample::new(100, 3.0)).expect("equal timestamp");
    assert_eq!(store.len(), 2);
}

#[test]
fn empty_store_queries_fail_fast() {
    let store = SampleStore::new();
    assert!(matches!(store.min_x(), Err(ChartError::EmptyStore)));
    assert!(matches!(store.max_x(), Err(ChartError::EmptyStore)));
    assert!(matches!(
        store.closest_index_to(5),
        Err(ChartError::EmptyStore)
    ));
    assert!(matches!(
        store.approximate_search(5, 8, true),
        Err(ChartError::EmptyStore)
    ));
    assert!(store.range_inclusive(0, 100).is_empty());
}

#[test]
fn scenario_range_and_closest_queries() {
    let store = store_from(&[(0, 0.0), (100, 10.0), (200, 5.0)]);

    let slice = store.range_inclusive(50, 150);
    assert_eq!(slice.len(), 1);
    assert_eq!(slice[0], Sample::new(100, 10.0));

    assert_eq!(store.closest_index_to(180).expect("non-empty"), 2);
    assert_eq!(store.closest_index_to(0).expect("non-empty"), 0);
    assert_eq!(store.closest_index_to(-50).expect("non-empty"), 0);
    assert_eq!(store.closest_index_to(10_000).expect("non-empty"), 2);
}

#[test]
fn closest_index_ties_favor_the_floor() {
    let store = store_from(&[(0, 1.0), (100, 2.0)]);
    assert_eq!(store.closest_index_to(50).expect("non-empty"), 0);
}

#[test]
fn approximate_search_stays_within_tolerance_of_exact() {
    let store = store_from(&(0..1_000).map(|i| (i * 7, 0.0)).collect::<Vec<_>>());

    for target in [0, 1, 350, 3_499, 3_500, 6_993, 9_000] {
        for tolerance in [0usize, 1, 8, 32] {
            let exact = store.exact_search(target, true).expect("non-empty");
            let approx = store
                .approximate_search(target, tolerance, true)
                .expect("non-empty");
            assert!(
                approx.abs_diff(exact) <= tolerance,
                "target {target} tolerance {tolerance}: approx {approx} vs exact {exact}"
            );
        }
    }
}

#[test]
fn approximate_range_never_drops_points_and_bounds_the_overshoot() {
    let points: Vec<(i64, f64)> = (0..500).map(|i| (i * 4, i as f64)).collect();
    let store = store_from(&points);

    let exact = store.range_inclusive(404, 1_204);
    let approx = store.range_inclusive_approx(404, 1_204, 8);
    assert!(approx.len() >= exact.len());
    assert!(approx.len() <= exact.len() + 16, "at most 8 extra per side");
    assert!(approx.first().unwrap().timestamp <= exact.first().unwrap().timestamp);
    assert!(approx.last().unwrap().timestamp >= exact.last().unwrap().timestamp);
}

#[test]
fn range_to_end_returns_a_covering_suffix() {
    let store = store_from(&(0..200).map(|i| (i * 10, 0.0)).collect::<Vec<_>>());
    let suffix = store.range_to_end(995, 8);

    assert_eq!(suffix.last().unwrap().timestamp, 1_990);
    assert!(suffix.first().unwrap().timestamp <= 1_000);
    let exact_count = store.range_inclusive(995, 1_990).len();
    assert!(suffix.len() >= exact_count);
    assert!(suffix.len() <= exact_count + 8);
}

#[test]
fn prune_before_is_gated_by_the_size_threshold() {
    let mut store = SampleStore::with_prune_threshold(2);
    for t in [0, 100, 200, 300, 400] {
        store.append(Sample::new(t, 0.0)).expect("ordered append");
    }

    // Only one point qualifies: below the threshold, nothing happens.
    assert_eq!(store.prune_before(50), 0);
    assert_eq!(store.len(), 5);

    // Three points qualify: exactly those three go.
    assert_eq!(store.prune_before(250), 3);
    assert_eq!(store.len(), 2);
    assert_eq!(store.min_x().expect("non-empty"), 300);
}

#[test]
fn prune_between_evicts_the_open_interval() {
    let mut store = SampleStore::with_prune_threshold(2);
    for t in [0, 100, 200, 300, 400] {
        store.append(Sample::new(t, 0.0)).expect("ordered append");
    }

    assert_eq!(store.prune_between(50, 350), 3);
    let remaining: Vec<i64> = store.samples().iter().map(|s| s.timestamp).collect();
    assert_eq!(remaining, vec![0, 400]);

    // Boundary timestamps are excluded from the open interval.
    assert_eq!(store.prune_between(0, 400), 0);
}

#[test]
fn prepend_all_splices_history_in_front() {
    let mut store = store_from(&[(100, 1.0), (200, 2.0)]);
    store
        .prepend_all(vec![Sample::new(0, 0.5), Sample::new(50, 0.7)])
        .expect("history batch fits");

    let timestamps: Vec<i64> = store.samples().iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 50, 100, 200]);

    let err = store.prepend_all(vec![Sample::new(10, 0.0)]).unwrap_err();
    assert!(matches!(err, ChartError::OutOfOrderAppend { .. }));
}

#[test]
fn set_all_replaces_and_clear_empties() {
    let mut store = store_from(&[(0, 1.0)]);
    store.set_all(vec![Sample::new(10, 1.0), Sample::new(20, 2.0)]);
    assert_eq!(store.len(), 2);
    assert_eq!(store.min_x().expect("non-empty"), 10);

    store.clear();
    assert!(store.is_empty());
}
