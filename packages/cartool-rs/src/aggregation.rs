//! Region-level reduction of source time courses.
//!
//! A [`SourceEstimate`] is split into one estimate per region of a
//! [`RegionsOfInterest`], each region is collapsed to a single time course,
//! and the courses are stacked into a new estimate whose sources are the
//! regions themselves.

use nalgebra::DMatrix;
use ndarray::{Array2, Array3, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CartoolError, Result};
use crate::regions::RegionsOfInterest;
use crate::source_estimate::SourceEstimate;
use crate::source_space::SourceSpace;

/// How a region's source time courses are collapsed into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMethod {
    Mean,
    Median,
    /// Top right-singular vector of the stacked `(source, dim) x time` matrix.
    /// Always yields a scalar course.
    #[default]
    #[serde(alias = "svd")]
    DominantMode,
}

impl ReductionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::DominantMode => "dominant_mode",
        }
    }

    /// Orientation-axis size of a reduced course for an input with `n_dim`
    pub fn output_n_dim(self, n_dim: usize) -> usize {
        match self {
            Self::Mean | Self::Median => n_dim,
            Self::DominantMode => 1,
        }
    }
}

impl FromStr for ReductionMethod {
    type Err = CartoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "dominant_mode" | "svd" => Ok(Self::DominantMode),
            other => Err(CartoolError::argument(format!(
                "method must be one of mean, median, dominant_mode (svd), found {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn shared_source_space<'a>(
    estimate: &'a SourceEstimate,
    regions: &RegionsOfInterest,
) -> Result<&'a Arc<SourceSpace>> {
    let estimate_space = estimate
        .source_space()
        .ok_or_else(|| CartoolError::validation("source estimate has no source space"))?;
    let regions_space = regions
        .source_space()
        .ok_or_else(|| CartoolError::validation("regions of interest have no source space"))?;

    if !Arc::ptr_eq(estimate_space, regions_space) && !estimate_space.same_points(regions_space) {
        return Err(CartoolError::validation(
            "source estimate and regions of interest must share the same source space",
        ));
    }
    Ok(estimate_space)
}

/// Split `estimate` into one independent estimate per region
///
/// Each returned estimate owns a copy of its region's time courses and is
/// bound to a new source space holding only that region's points.
pub fn per_region(
    estimate: &SourceEstimate,
    regions: &RegionsOfInterest,
) -> Result<Vec<SourceEstimate>> {
    let space = shared_source_space(estimate, regions)?;
    log::debug!(
        "Splitting {} sources into {} regions",
        estimate.n_sources(),
        regions.len()
    );

    regions
        .iter()
        .map(|(_, indexes)| -> Result<SourceEstimate> {
            let region_space = Arc::new(space.subset(indexes)?);
            let sources_tc = estimate.sources_tc().select(Axis(0), indexes);
            let region =
                SourceEstimate::new(sources_tc, estimate.sampling_rate(), Some(region_space))?;
            Ok(match estimate.subject() {
                Some(subject) => region.with_subject(subject),
                None => region,
            })
        })
        .collect()
}

fn median(lane: ArrayView1<'_, f32>) -> f32 {
    if lane.iter().any(|v| v.is_nan()) {
        return f32::NAN;
    }
    let mut values: Vec<f32> = lane.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        ((values[mid - 1] as f64 + values[mid] as f64) / 2.0) as f32
    } else {
        values[mid]
    }
}

fn mean(lane: ArrayView1<'_, f32>) -> f32 {
    let sum: f64 = lane.iter().map(|&v| v as f64).sum();
    (sum / lane.len() as f64) as f32
}

const SVD_MAX_ITERATIONS: usize = 10_000;

fn dominant_mode(estimate: &SourceEstimate) -> Result<Array2<f32>> {
    let sources_tc = estimate.sources_tc();
    let (n_sources, n_dim, n_timeframes) = sources_tc.dim();
    let rows = n_sources * n_dim;

    let matrix = DMatrix::from_fn(rows, n_timeframes, |r, t| {
        sources_tc[[r / n_dim, r % n_dim, t]] as f64
    });
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(CartoolError::argument(
            "dominant mode needs finite source time courses",
        ));
    }
    let svd = matrix
        .try_svd(false, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| {
            CartoolError::argument(format!(
                "singular value decomposition did not converge in {} iterations",
                SVD_MAX_ITERATIONS
            ))
        })?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| CartoolError::argument("singular value decomposition produced no V^T"))?;

    let top = svd.singular_values.imax();
    let scale = svd.singular_values.norm() / (rows as f64).sqrt();

    let course = v_t.row(top);
    Ok(Array2::from_shape_fn((1, n_timeframes), |(_, t)| {
        (scale * course[t]) as f32
    }))
}

/// Collapse all sources of `estimate` into one course
///
/// Mean and median keep the `(n_dim, n_timeframes)` shape; the dominant
/// mode is always `(1, n_timeframes)`.
pub fn reduce_time_course(estimate: &SourceEstimate, method: ReductionMethod) -> Result<Array2<f32>> {
    if estimate.n_sources() == 0 || estimate.n_timeframes() == 0 {
        return Err(CartoolError::argument(format!(
            "cannot reduce a source estimate with {} sources and {} timeframes",
            estimate.n_sources(),
            estimate.n_timeframes()
        )));
    }

    let sources_tc = estimate.sources_tc();
    match method {
        ReductionMethod::Mean => Ok(sources_tc.map_axis(Axis(0), mean)),
        ReductionMethod::Median => Ok(sources_tc.map_axis(Axis(0), median)),
        ReductionMethod::DominantMode => dominant_mode(estimate),
    }
}

/// One reduced course per region, bound to a source space of region centroids
pub fn reduce_by_region(
    estimate: &SourceEstimate,
    regions: &RegionsOfInterest,
    method: ReductionMethod,
) -> Result<SourceEstimate> {
    let per_region = per_region(estimate, regions)?;
    log::debug!("Reducing {} regions with method {}", per_region.len(), method);

    let n_dim = method.output_n_dim(estimate.n_dim());
    let n_timeframes = estimate.n_timeframes();
    let mut sources_tc = Array3::<f32>::zeros((per_region.len(), n_dim, n_timeframes));
    let mut coordinates = Array2::<f64>::zeros((per_region.len(), 3));

    for (r, region) in per_region.iter().enumerate() {
        let course = reduce_time_course(region, method)?;
        sources_tc.index_axis_mut(Axis(0), r).assign(&course);

        if let Some(space) = region.source_space() {
            coordinates.row_mut(r).assign(&space.center_of_mass()?);
        }
    }

    let space = SourceSpace::new(regions.names().to_vec(), coordinates)?;
    let reduced = SourceEstimate::new(sources_tc, estimate.sampling_rate(), Some(Arc::new(space)))?;
    Ok(match estimate.subject() {
        Some(subject) => reduced.with_subject(subject),
        None => reduced,
    })
}

impl SourceEstimate {
    /// See [`per_region`]
    pub fn per_region(&self, regions: &RegionsOfInterest) -> Result<Vec<SourceEstimate>> {
        per_region(self, regions)
    }

    /// See [`reduce_time_course`]
    pub fn reduce_time_course(&self, method: ReductionMethod) -> Result<Array2<f32>> {
        reduce_time_course(self, method)
    }

    /// See [`reduce_by_region`]
    pub fn reduce_by_region(
        &self,
        regions: &RegionsOfInterest,
        method: ReductionMethod,
    ) -> Result<SourceEstimate> {
        reduce_by_region(self, regions, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_space(n: usize) -> Arc<SourceSpace> {
        let names = (0..n).map(|i| format!("S{}", i)).collect();
        let coordinates = Array2::from_shape_fn((n, 3), |(i, _)| i as f64);
        Arc::new(SourceSpace::new(names, coordinates).unwrap())
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("svd".parse::<ReductionMethod>().unwrap(), ReductionMethod::DominantMode);
        assert_eq!("median".parse::<ReductionMethod>().unwrap(), ReductionMethod::Median);
        assert!(matches!(
            "max".parse::<ReductionMethod>(),
            Err(CartoolError::Argument(_))
        ));
    }

    #[test]
    fn test_mean_and_median() {
        let tc = array![[[1.0f32, 10.0]], [[2.0, 20.0]], [[6.0, 30.0]], [[7.0, 100.0]]];
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();

        let mean = estimate.reduce_time_course(ReductionMethod::Mean).unwrap();
        assert_eq!(mean, array![[4.0f32, 40.0]]);

        let median = estimate.reduce_time_course(ReductionMethod::Median).unwrap();
        assert_eq!(median, array![[4.0f32, 25.0]]);
    }

    #[test]
    fn test_dominant_mode_of_rank_one() {
        // every row is a multiple of the same course, so the top mode recovers it
        let course = [1.0f32, -2.0, 3.0, 0.5];
        let weights = [1.0f32, 2.0, -1.0];
        let tc = Array3::from_shape_fn((1, 3, 4), |(_, d, t)| weights[d] * course[t]);
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();

        let reduced = estimate.reduce_time_course(ReductionMethod::DominantMode).unwrap();
        assert_eq!(reduced.dim(), (1, 4));

        let ratio = reduced[[0, 0]] / course[0];
        for t in 0..4 {
            assert!((reduced[[0, t]] - ratio * course[t]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_dominant_mode_scale() {
        // a single row x gives V^T = x/|x| and scale |x|, so the course is +-x
        let tc = array![[[3.0f32, 4.0]]];
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();
        let reduced = estimate.reduce_time_course(ReductionMethod::DominantMode).unwrap();
        assert!((reduced[[0, 0]].abs() - 3.0).abs() < 1e-5);
        assert!((reduced[[0, 1]].abs() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_dominant_mode_rejects_nan() {
        let mut tc = Array3::<f32>::ones((3, 3, 8));
        tc[[1, 2, 4]] = f32::NAN;
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();
        assert!(matches!(
            estimate.reduce_time_course(ReductionMethod::DominantMode),
            Err(CartoolError::Argument(_))
        ));

        let mut tc = Array3::<f32>::ones((2, 1, 4));
        tc[[0, 0, 1]] = f32::INFINITY;
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();
        assert!(estimate.reduce_time_course(ReductionMethod::DominantMode).is_err());
    }

    #[test]
    fn test_median_propagates_nan() {
        let tc = array![[[1.0f32, 2.0]], [[f32::NAN, 3.0]], [[5.0, 4.0]]];
        let estimate = SourceEstimate::new(tc, 100.0, None).unwrap();
        let median = estimate.reduce_time_course(ReductionMethod::Median).unwrap();
        assert!(median[[0, 0]].is_nan());
        assert_eq!(median[[0, 1]], 3.0);
    }

    #[test]
    fn test_empty_estimate_is_rejected() {
        let estimate = SourceEstimate::new(Array3::zeros((0, 1, 5)), 100.0, None).unwrap();
        assert!(matches!(
            estimate.reduce_time_course(ReductionMethod::Mean),
            Err(CartoolError::Argument(_))
        ));
    }

    #[test]
    fn test_per_region_copies() {
        let space = line_space(4);
        let tc = Array3::from_shape_fn((4, 1, 3), |(s, _, t)| (s * 10 + t) as f32);
        let estimate = SourceEstimate::new(tc, 100.0, Some(space.clone())).unwrap();
        let regions = RegionsOfInterest::new(
            vec!["A".into(), "B".into()],
            vec![vec![3, 1], vec![0]],
            Some(space),
        )
        .unwrap();

        let split = estimate.per_region(&regions).unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].sources_tc()[[0, 0, 2]], 32.0);
        assert_eq!(split[0].sources_tc()[[1, 0, 0]], 10.0);
        let names = split[0].source_space().unwrap().names().to_vec();
        assert_eq!(names, vec!["S3".to_string(), "S1".to_string()]);
    }

    #[test]
    fn test_per_region_requires_shared_space() {
        let estimate =
            SourceEstimate::new(Array3::zeros((4, 1, 3)), 100.0, Some(line_space(4))).unwrap();

        let unbound = RegionsOfInterest::new(vec!["A".into()], vec![vec![0]], None).unwrap();
        assert!(matches!(
            estimate.per_region(&unbound),
            Err(CartoolError::Validation(_))
        ));

        let other = Arc::new(
            SourceSpace::new(
                (0..4).map(|i| format!("X{}", i)).collect(),
                Array2::zeros((4, 3)),
            )
            .unwrap(),
        );
        let foreign = RegionsOfInterest::new(vec!["A".into()], vec![vec![0]], Some(other)).unwrap();
        assert!(matches!(
            estimate.per_region(&foreign),
            Err(CartoolError::Validation(_))
        ));

        // equal by value is accepted
        let equal = RegionsOfInterest::new(vec!["A".into()], vec![vec![0]], Some(line_space(4))).unwrap();
        assert!(estimate.per_region(&equal).is_ok());
    }

    #[test]
    fn test_reduce_by_region_centroids() {
        let space = line_space(4);
        let tc = Array3::from_elem((4, 3, 6), 1.0f32);
        let estimate = SourceEstimate::new(tc, 100.0, Some(space.clone())).unwrap();
        let regions = RegionsOfInterest::new(
            vec!["front".into(), "back".into()],
            vec![vec![0, 1], vec![2, 3]],
            Some(space),
        )
        .unwrap();

        let reduced = estimate.reduce_by_region(&regions, ReductionMethod::Mean).unwrap();
        assert_eq!(reduced.sources_tc().dim(), (2, 3, 6));
        let derived = reduced.source_space().unwrap();
        assert_eq!(derived.names(), &["front".to_string(), "back".to_string()]);
        assert_eq!(derived.coordinates()[[0, 0]], 0.5);
        assert_eq!(derived.coordinates()[[1, 2]], 2.5);

        let svd = estimate
            .reduce_by_region(&regions, ReductionMethod::DominantMode)
            .unwrap();
        assert_eq!(svd.sources_tc().dim(), (2, 1, 6));
        assert!(svd.is_scalar());
    }
}
