//! Source time courses from a recording and an inverse operator

use ndarray::{Array3, Axis};
use std::sync::Arc;

use crate::error::{CartoolError, Result};
use crate::formats::{ContinuousSignal, InverseSolution, Regularization};
use crate::source_estimate::SourceEstimate;
use crate::source_space::SourceSpace;

/// Which regularization level of an inverse solution to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegularizationSelector<'a> {
    Index(usize),
    Name(&'a str),
}

impl<'a> From<usize> for RegularizationSelector<'a> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for RegularizationSelector<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl InverseSolution {
    pub fn regularization(&self, selector: RegularizationSelector<'_>) -> Result<&Regularization> {
        match selector {
            RegularizationSelector::Index(index) => {
                self.regularizations().get(index).ok_or_else(|| {
                    CartoolError::argument(format!(
                        "regularization {} requested but the inverse solution has {}",
                        index,
                        self.regularizations().len()
                    ))
                })
            }
            RegularizationSelector::Name(name) => self.regularization_by_name(name).ok_or_else(|| {
                CartoolError::argument(format!("regularization {:?} not found in inverse solution", name))
            }),
        }
    }

    fn check_channels(&self, signal: &ContinuousSignal) -> Result<()> {
        if self.n_channels() != signal.n_channels() {
            return Err(CartoolError::validation(format!(
                "inverse solution expects {} channels, recording has {}",
                self.n_channels(),
                signal.n_channels()
            )));
        }
        if !self.channel_names().is_empty() && self.channel_names() != signal.channel_names() {
            return Err(CartoolError::validation(
                "recording and inverse solution channel names do not match",
            ));
        }
        Ok(())
    }

    /// Apply one regularization level to `signal`
    ///
    /// `sources_tc[s, d, t] = sum_c operator[d, s, c] * samples[t, c]`. The
    /// result carries the recording's sampling rate and is bound to
    /// `source_space` when given.
    pub fn apply<'a>(
        &self,
        signal: &ContinuousSignal,
        selector: impl Into<RegularizationSelector<'a>>,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<SourceEstimate> {
        self.check_channels(signal)?;
        let regularization = self.regularization(selector.into())?;
        log::debug!(
            "Applying regularization {:?} to {} timeframes",
            regularization.name,
            signal.n_timeframes()
        );

        let operator = regularization.operator();
        let samples = signal.samples();
        let (n_dim, n_solution_points, _) = operator.dim();
        let mut sources_tc = Array3::<f32>::zeros((n_solution_points, n_dim, signal.n_timeframes()));

        // (n_sp, n_ch) x (n_ch, n_tf) per orientation
        for d in 0..n_dim {
            let courses = operator.index_axis(Axis(0), d).dot(&samples.t());
            sources_tc.index_axis_mut(Axis(1), d).assign(&courses);
        }

        SourceEstimate::new(sources_tc, signal.sampling_rate(), source_space)
    }
}
