#![allow(dead_code)]

use cartool_rs::SourceSpace;
use ndarray::{Array2, Array3};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic, non-trivial values in roughly [-1, 1)
pub fn pattern(i: usize) -> f64 {
    let x = (i as f64 * 0.618_033_988_75).fract();
    (x * 2.0 - 1.0) * (1.0 + (i % 7) as f64 * 1e-3)
}

pub fn source_space(n: usize) -> Arc<SourceSpace> {
    let names = (0..n).map(|i| format!("sp{}", i + 1)).collect();
    let coordinates = Array2::from_shape_fn((n, 3), |(s, d)| pattern(s * 3 + d) * 80.0);
    Arc::new(SourceSpace::new(names, coordinates).expect("valid source space"))
}

pub fn sources_tc(n_sources: usize, n_dim: usize, n_timeframes: usize) -> Array3<f32> {
    Array3::from_shape_fn((n_sources, n_dim, n_timeframes), |(s, d, t)| {
        pattern((s * n_dim + d) * n_timeframes + t) as f32
    })
}
