//! Results of inverse solution (`.ris`)
//!
//! Header: `RI01`, `n_solution_points: u32`, `n_timeframes: u32`,
//! `sampling_rate: f32`, scalar flag byte. The `f32` payload is stored
//! timeframe-major: for each timeframe, every solution point's `n_dim`
//! components in turn.

use ndarray::Array3;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::codec;
use crate::config::WriterConfig;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};
use crate::source_estimate::SourceEstimate;
use crate::source_space::SourceSpace;

pub const RIS_TAG: &str = "RI01";

impl SourceEstimate {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_with_source_space(reader, None)
    }

    /// Decode and bind to `source_space`, whose cardinality must match the file
    pub fn read_with_source_space<R: Read>(
        reader: &mut R,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        codec::expect_tag(reader, &[RIS_TAG], "results of inverse solution")?;
        let n_solution_points = codec::read_count(reader, "n_solution_points")?;
        let n_timeframes = codec::read_count(reader, "n_timeframes")?;
        let sampling_rate = codec::read_f32(reader, "sampling rate")?;
        let dimensionality = codec::read_flag_byte(reader)?;
        let n_dim = dimensionality.n_dim();

        log::info!(
            "RIS: {} solution points, {} timeframes, {} Hz, {}",
            n_solution_points,
            n_timeframes,
            sampling_rate,
            dimensionality
        );

        let count = codec::element_count(&[n_timeframes, n_solution_points, n_dim], "ris")?;
        let payload = codec::read_f32_payload(reader, count, "ris payload")?;
        let stored = Array3::from_shape_vec((n_timeframes, n_solution_points, n_dim), payload)
            .map_err(|e| CartoolError::format(format!("ris payload: {}", e)))?;
        let sources_tc = stored
            .permuted_axes([1, 2, 0])
            .as_standard_layout()
            .into_owned();

        SourceEstimate::new(sources_tc, sampling_rate, source_space)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_tag(writer, RIS_TAG)?;
        codec::write_count(writer, self.n_sources(), "n_solution_points")?;
        codec::write_count(writer, self.n_timeframes(), "n_timeframes")?;
        codec::write_f32(writer, self.sampling_rate())?;
        codec::write_flag_byte(writer, self.dimensionality())?;

        let stored = self.sources_tc().permuted_axes([2, 0, 1]);
        codec::write_f32_payload(writer, stored.iter().copied())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_source_space(path, None)
    }

    pub fn open_with_source_space(
        path: impl AsRef<Path>,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let estimate = read_path(path, |reader| Self::read_with_source_space(reader, source_space))?;
        Ok(estimate.with_filename(path))
    }

    /// Write the RIS file and, with `export_spi`, the bound source space
    /// next to it with the `.spi` extension
    pub fn save(&self, path: impl AsRef<Path>, export_spi: bool) -> Result<()> {
        let path = path.as_ref();
        let source_space = match (export_spi, self.source_space()) {
            (true, None) => {
                return Err(CartoolError::validation(
                    "cannot export the source space: no source space is bound",
                ))
            }
            (true, Some(space)) => Some(space),
            (false, _) => None,
        };

        write_path(path, |writer| self.write_to(writer))?;
        if let Some(space) = source_space {
            space.save_with(path.with_extension("spi"), &WriterConfig::default())?;
        }
        Ok(())
    }
}
