mod common;

use cartool_rs::{CartoolError, ReductionMethod, RegionsOfInterest, SourceEstimate};
use common::{init_logging, source_space, sources_tc};
use ndarray::Axis;

fn ten_regions(n_sources: usize) -> (Vec<String>, Vec<Vec<usize>>) {
    let per_region = n_sources / 10;
    let names = (0..10).map(|r| format!("region {}", r)).collect();
    let groups = (0..10)
        .map(|r| (r * per_region..(r + 1) * per_region).collect())
        .collect();
    (names, groups)
}

/// 100 vectorial sources over 500 timeframes reduced onto 10 regions
#[test]
fn test_reduce_by_region_shapes() {
    init_logging();
    let space = source_space(100);
    let estimate = SourceEstimate::new(sources_tc(100, 3, 500), 500.0, Some(space.clone())).unwrap();
    let (names, groups) = ten_regions(100);
    let regions = RegionsOfInterest::new(names, groups, Some(space)).unwrap();

    let svd = estimate
        .reduce_by_region(&regions, ReductionMethod::DominantMode)
        .unwrap();
    assert_eq!(svd.sources_tc().dim(), (10, 1, 500));
    assert!(svd.is_scalar());
    assert_eq!(svd.sampling_rate(), 500.0);

    for method in [ReductionMethod::Mean, ReductionMethod::Median] {
        let reduced = estimate.reduce_by_region(&regions, method).unwrap();
        assert_eq!(reduced.sources_tc().dim(), (10, 3, 500));
        assert_eq!(reduced.source_space().unwrap().len(), 10);
    }
}

#[test]
fn test_mean_matches_per_region_average() {
    let space = source_space(20);
    let estimate = SourceEstimate::new(sources_tc(20, 1, 16), 100.0, Some(space.clone())).unwrap();
    let (names, groups) = ten_regions(20);
    let regions = RegionsOfInterest::new(names, groups.clone(), Some(space.clone())).unwrap();

    let reduced = estimate.reduce_by_region(&regions, ReductionMethod::Mean).unwrap();
    let derived = reduced.source_space().unwrap();

    for (r, group) in groups.iter().enumerate() {
        let expected = estimate
            .sources_tc()
            .select(Axis(0), group)
            .mean_axis(Axis(0))
            .unwrap();
        for t in 0..16 {
            assert!((reduced.sources_tc()[[r, 0, t]] - expected[[0, t]]).abs() < 1e-6);
        }

        let centroid = space.subset(group).unwrap().center_of_mass().unwrap();
        assert_eq!(derived.coordinates().row(r), centroid.view());
        assert_eq!(derived.names()[r], format!("region {}", r));
    }
}

#[test]
fn test_derived_estimates_do_not_alias() {
    let space = source_space(6);
    let estimate = SourceEstimate::new(sources_tc(6, 3, 4), 100.0, Some(space.clone())).unwrap();
    let regions = RegionsOfInterest::new(vec!["all".into()], vec![(0..6).collect()], Some(space)).unwrap();

    let mut split = estimate.per_region(&regions).unwrap();
    let original = estimate.sources_tc().to_owned();
    let shifted = split[0].sources_tc().mapv(|v| v + 100.0);
    split[0].set_sources_tc(shifted).unwrap();
    assert_eq!(estimate.sources_tc(), original.view());
}

#[test]
fn test_method_from_configuration() {
    let methods: Vec<ReductionMethod> =
        serde_json::from_str(r#"["mean", "median", "dominant_mode", "svd"]"#).unwrap();
    assert_eq!(
        methods,
        vec![
            ReductionMethod::Mean,
            ReductionMethod::Median,
            ReductionMethod::DominantMode,
            ReductionMethod::DominantMode
        ]
    );
    assert_eq!(serde_json::to_string(&ReductionMethod::DominantMode).unwrap(), "\"dominant_mode\"");
    assert!(serde_json::from_str::<ReductionMethod>("\"max\"").is_err());
}

#[test]
fn test_unbound_estimate_is_rejected() {
    let space = source_space(4);
    let estimate = SourceEstimate::new(sources_tc(4, 1, 4), 100.0, None).unwrap();
    let regions = RegionsOfInterest::new(vec!["a".into()], vec![vec![0]], Some(space)).unwrap();

    let result = estimate.reduce_by_region(&regions, ReductionMethod::Mean);
    assert!(matches!(result, Err(CartoolError::Validation(_))));
}

#[test]
fn test_empty_region_is_rejected() {
    let space = source_space(4);
    let estimate = SourceEstimate::new(sources_tc(4, 1, 4), 100.0, Some(space.clone())).unwrap();
    let regions = RegionsOfInterest::new(
        vec!["a".into(), "empty".into()],
        vec![vec![0, 1], vec![]],
        Some(space),
    )
    .unwrap();

    assert_eq!(estimate.per_region(&regions).unwrap()[1].n_sources(), 0);
    let result = estimate.reduce_by_region(&regions, ReductionMethod::Median);
    assert!(matches!(result, Err(CartoolError::Argument(_))));
}

#[test]
fn test_non_finite_samples_do_not_stall_reduction() {
    let space = source_space(6);
    let mut tc = sources_tc(6, 3, 8);
    tc[[4, 1, 5]] = f32::NAN;
    let estimate = SourceEstimate::new(tc, 100.0, Some(space.clone())).unwrap();
    let regions = RegionsOfInterest::new(
        vec!["clean".into(), "nan".into()],
        vec![vec![0, 1, 2], vec![3, 4, 5]],
        Some(space),
    )
    .unwrap();

    let result = estimate.reduce_by_region(&regions, ReductionMethod::DominantMode);
    assert!(matches!(result, Err(CartoolError::Argument(_))));

    let median = estimate
        .reduce_by_region(&regions, ReductionMethod::Median)
        .unwrap();
    assert!(median.sources_tc()[[1, 1, 5]].is_nan());
    assert!(median.sources_tc()[[0, 1, 5]].is_finite());
}
