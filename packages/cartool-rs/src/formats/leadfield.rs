use ndarray::{Array3, ArrayView3};
use std::io::{Read, Write};
use std::path::Path;

use crate::codec;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};

/// Forward operator from source dipoles to electrodes,
/// shape `(n_electrodes, n_solution_points, 3)`
#[derive(Debug, Clone, PartialEq)]
pub struct Leadfield {
    matrix: Array3<f64>,
}

impl Leadfield {
    pub fn new(matrix: Array3<f64>) -> Result<Self> {
        if matrix.shape()[2] != 3 {
            return Err(CartoolError::argument(format!(
                "leadfield must be of shape (n_electrodes, n_solution_points, 3), found {:?}",
                matrix.shape()
            )));
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> ArrayView3<'_, f64> {
        self.matrix.view()
    }

    pub fn into_matrix(self) -> Array3<f64> {
        self.matrix
    }

    pub fn n_electrodes(&self) -> usize {
        self.matrix.shape()[0]
    }

    pub fn n_solution_points(&self) -> usize {
        self.matrix.shape()[1]
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let n_electrodes = codec::read_count(reader, "n_electrodes")?;
        let n_solution_points_x3 = codec::read_count(reader, "n_solution_points")?;
        if n_solution_points_x3 % 3 != 0 {
            return Err(CartoolError::format(format!(
                "leadfield solution point field ({}) is not a multiple of 3",
                n_solution_points_x3
            )));
        }
        let n_solution_points = n_solution_points_x3 / 3;
        log::info!(
            "Leadfield: {} electrodes, {} solution points",
            n_electrodes,
            n_solution_points
        );

        let count = codec::element_count(&[n_electrodes, n_solution_points_x3], "leadfield")?;
        let payload = codec::read_f64_payload(reader, count, "leadfield payload")?;
        let matrix = Array3::from_shape_vec((n_electrodes, n_solution_points, 3), payload)
            .map_err(|e| CartoolError::format(format!("leadfield payload: {}", e)))?;

        Ok(Self { matrix })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let n_solution_points_x3 = self
            .n_solution_points()
            .checked_mul(3)
            .ok_or_else(|| CartoolError::argument("leadfield has too many solution points"))?;
        codec::write_count(writer, self.n_electrodes(), "n_electrodes")?;
        codec::write_count(writer, n_solution_points_x3, "n_solution_points")?;
        // iter() walks in logical (row-major) order regardless of memory layout
        codec::write_f64_payload(writer, self.matrix.iter().copied())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        read_path(path.as_ref(), |reader| Self::read_from(reader))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_to(writer))
    }
}
