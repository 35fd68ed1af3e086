use livetrace::core::{Sample, SampleStore};
use livetrace::extensions::{LabelProjection, LabelProjector, PendingBucket};

fn store_from(points: &[(i64, f64)]) -> SampleStore {
    let mut store = SampleStore::new();
    for &(t, v) in points {
        store.append(Sample::new(t, v)).expect("ordered append");
    }
    store
}

#[test]
fn label_at_an_existing_sample_takes_its_value() {
    let store = store_from(&[(0, 5.0), (100, 15.0)]);
    let projection = LabelProjector::project(&store, 100);
    assert_eq!(projection, LabelProjection::Resolved(Sample::new(100, 15.0)));
}

#[test]
fn label_at_the_midpoint_interpolates_the_mean() {
    let store = store_from(&[(0, 5.0), (100, 15.0)]);
    let projection = LabelProjector::project(&store, 50);
    assert_eq!(projection, LabelProjection::Resolved(Sample::new(50, 10.0)));
}

#[test]
fn label_interpolates_proportionally_between_samples() {
    let store = store_from(&[(0, 0.0), (200, 10.0)]);
    let projection = LabelProjector::project(&store, 50);
    assert_eq!(projection, LabelProjection::Resolved(Sample::new(50, 2.5)));
}

#[test]
fn uncovered_label_waits_in_the_matching_bucket() {
    let empty = SampleStore::new();
    assert_eq!(
        LabelProjector::project(&empty, 50),
        LabelProjection::Pending {
            bucket: PendingBucket::NeedsBoth,
            approximate: None,
        }
    );

    let store = store_from(&[(0, 7.0)]);
    assert_eq!(
        LabelProjector::project(&store, 50),
        LabelProjection::Pending {
            bucket: PendingBucket::NeedsAfter,
            approximate: Some(Sample::new(50, 7.0)),
        }
    );
    assert_eq!(
        LabelProjector::project(&store, -50),
        LabelProjection::Pending {
            bucket: PendingBucket::NeedsBefore,
            approximate: Some(Sample::new(-50, 7.0)),
        }
    );
}

#[test]
fn label_before_any_samples_resolves_once_both_sides_exist() {
    let mut store = SampleStore::new();
    let mut projector = LabelProjector::new();

    // No coverage at all: both sides missing.
    projector.add_label(&store, 50);
    assert_eq!(projector.pending_counts().needs_both, 1);
    assert!(projector.placements().is_empty());

    // A later sample arrives: the label gains a ceiling and a provisional
    // placement pinned to it.
    store.append(Sample::new(100, 2.0)).expect("ordered append");
    projector.on_sample_appended(&store, 100);
    let counts = projector.pending_counts();
    assert_eq!(counts.needs_both, 0);
    assert_eq!(counts.needs_before, 1);
    assert_eq!(projector.placements(), vec![Sample::new(50, 2.0)]);

    // Loading earlier history establishes the floor and resolves it.
    store
        .prepend_all(vec![Sample::new(0, 0.0)])
        .expect("history batch fits");
    projector.on_samples_prepended(&store);

    assert_eq!(projector.pending_counts().total(), 0);
    assert_eq!(projector.resolved_points(), vec![Sample::new(50, 1.0)]);
    assert!(!projector.is_pending(50));
}

#[test]
fn needs_after_resolves_when_coverage_reaches_it() {
    let mut store = store_from(&[(0, 1.0)]);
    let mut projector = LabelProjector::new();

    projector.add_label(&store, 50);
    assert_eq!(projector.pending_counts().needs_after, 1);
    assert_eq!(projector.placements(), vec![Sample::new(50, 1.0)]);

    // A sample short of the label does not resolve it.
    store.append(Sample::new(40, 2.0)).expect("ordered append");
    projector.on_sample_appended(&store, 40);
    assert_eq!(projector.pending_counts().needs_after, 1);

    // Coverage reaching the label does, replacing the provisional placement.
    store.append(Sample::new(100, 3.0)).expect("ordered append");
    projector.on_sample_appended(&store, 100);
    assert_eq!(projector.pending_counts().total(), 0);

    // floor (40, 2.0), ceiling (100, 3.0): 2 + 1 * 10/60
    let resolved = projector.resolved_points();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].timestamp, 50);
    assert!((resolved[0].value - (2.0 + 10.0 / 60.0)).abs() <= 1e-12);
}

#[test]
fn series_replacement_reprojects_every_label() {
    let mut store = store_from(&[(0, 0.0), (100, 10.0)]);
    let mut projector = LabelProjector::new();
    projector.add_label(&store, 50);
    assert_eq!(projector.resolved_points(), vec![Sample::new(50, 5.0)]);

    store.set_all(vec![Sample::new(0, 0.0), Sample::new(100, 20.0)]);
    projector.on_series_replaced(&store);
    assert_eq!(projector.resolved_points(), vec![Sample::new(50, 10.0)]);

    // Replacement can also widen coverage gaps and demote labels to pending.
    store.set_all(vec![Sample::new(60, 1.0)]);
    projector.on_series_replaced(&store);
    assert_eq!(projector.pending_counts().needs_before, 1);
    assert_eq!(projector.placements(), vec![Sample::new(50, 1.0)]);
}

#[test]
fn remove_label_drops_every_trace_of_it() {
    let store = store_from(&[(0, 0.0), (100, 10.0)]);
    let mut projector = LabelProjector::new();
    projector.add_label(&store, 50);
    projector.add_label(&store, 500);

    assert!(projector.remove_label(50));
    assert!(projector.remove_label(500));
    assert!(!projector.remove_label(50));
    assert!(projector.resolved_points().is_empty());
    assert_eq!(projector.pending_counts().total(), 0);
    assert!(projector.placements().is_empty());
}

#[test]
fn placements_are_ordered_by_timestamp() {
    let store = store_from(&[(0, 0.0), (100, 10.0)]);
    let mut projector = LabelProjector::new();
    projector.add_label(&store, 80);
    projector.add_label(&store, 20);
    projector.add_label(&store, 300);

    let timestamps: Vec<i64> = projector
        .placements()
        .iter()
        .map(|s| s.timestamp)
        .collect();
    assert_eq!(timestamps, vec![20, 80, 300]);
}
