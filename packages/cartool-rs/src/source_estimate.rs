use ndarray::{Array3, ArrayD, ArrayView3, Ix3};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CartoolError, Result};
use crate::source_space::SourceSpace;
use crate::types::Dimensionality;

/// Per-source time courses, shape `(n_sources, n_dim, n_timeframes)`
///
/// `n_dim` is 1 for scalar estimates and 3 for vectorial ones. When a
/// [`SourceSpace`] is bound, its cardinality always equals `n_sources`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEstimate {
    sources_tc: Array3<f32>,
    sampling_rate: f32,
    source_space: Option<Arc<SourceSpace>>,
    subject: Option<String>,
    filename: Option<PathBuf>,
}

fn check_sources_tc(sources_tc: &Array3<f32>) -> Result<Dimensionality> {
    let n_dim = sources_tc.shape()[1];
    if n_dim != 1 && n_dim != 3 {
        return Err(CartoolError::argument(format!(
            "sources_tc.shape[1] must be either 1 (scalar) or 3 (vectorial), found shape {:?}",
            sources_tc.shape()
        )));
    }
    Dimensionality::from_n_dim(n_dim)
}

fn check_cardinality(n_sources: usize, source_space: &SourceSpace) -> Result<()> {
    if source_space.len() != n_sources {
        return Err(CartoolError::validation(format!(
            "expected {} time courses from the source space, found {} in sources_tc",
            source_space.len(),
            n_sources
        )));
    }
    Ok(())
}

impl SourceEstimate {
    pub fn new(
        sources_tc: Array3<f32>,
        sampling_rate: f32,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        check_sources_tc(&sources_tc)?;
        if let Some(space) = &source_space {
            check_cardinality(sources_tc.shape()[0], space)?;
        }

        Ok(Self {
            sources_tc,
            sampling_rate,
            source_space,
            subject: None,
            filename: None,
        })
    }

    /// Build from double-precision time courses, downcasting to `f32`
    pub fn from_f64(
        sources_tc: Array3<f64>,
        sampling_rate: f32,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        Self::new(sources_tc.mapv(|v| v as f32), sampling_rate, source_space)
    }

    /// Build from an array of unknown rank; anything but rank 3 is rejected
    pub fn from_dyn(
        sources_tc: ArrayD<f32>,
        sampling_rate: f32,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        let shape = sources_tc.shape().to_vec();
        let sources_tc = sources_tc.into_dimensionality::<Ix3>().map_err(|_| {
            CartoolError::argument(format!(
                "sources_tc must be of shape (n_sources, n_dim, n_timeframes), found {:?}",
                shape
            ))
        })?;
        Self::new(sources_tc, sampling_rate, source_space)
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub(crate) fn with_filename(mut self, path: &Path) -> Self {
        self.filename = Some(path.to_path_buf());
        self
    }

    pub fn sources_tc(&self) -> ArrayView3<'_, f32> {
        self.sources_tc.view()
    }

    pub fn into_sources_tc(self) -> Array3<f32> {
        self.sources_tc
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn source_space(&self) -> Option<&Arc<SourceSpace>> {
        self.source_space.as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn n_sources(&self) -> usize {
        self.sources_tc.shape()[0]
    }

    pub fn n_dim(&self) -> usize {
        self.sources_tc.shape()[1]
    }

    pub fn n_timeframes(&self) -> usize {
        self.sources_tc.shape()[2]
    }

    pub fn dimensionality(&self) -> Dimensionality {
        if self.n_dim() == 1 {
            Dimensionality::Scalar
        } else {
            Dimensionality::Vectorial
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.dimensionality().is_scalar()
    }

    /// Replace the time courses; shape and bound-space cardinality are checked first
    pub fn set_sources_tc(&mut self, sources_tc: Array3<f32>) -> Result<()> {
        check_sources_tc(&sources_tc)?;
        if let Some(space) = &self.source_space {
            check_cardinality(sources_tc.shape()[0], space)?;
        }
        self.sources_tc = sources_tc;
        Ok(())
    }

    pub fn set_source_space(&mut self, source_space: Option<Arc<SourceSpace>>) -> Result<()> {
        if let Some(space) = &source_space {
            check_cardinality(self.n_sources(), space)?;
        }
        self.source_space = source_space;
        Ok(())
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: f32) {
        self.sampling_rate = sampling_rate;
    }

    pub fn set_subject(&mut self, subject: Option<String>) {
        self.subject = subject;
    }
}

impl fmt::Display for SourceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<SourceEstimate | {}, {} sources, sfreq : {}",
            self.dimensionality(),
            self.n_sources(),
            self.sampling_rate
        )?;
        if let Some(subject) = &self.subject {
            write!(f, ", subject : {}", subject)?;
        }
        if let Some(filename) = &self.filename {
            write!(f, ", filename : {}", filename.display())?;
        }
        write!(f, ">")
    }
}
