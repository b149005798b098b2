use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis, Ix2};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CartoolError, Result};

/// Solution points: one name and one (x, y, z) coordinate per source
///
/// Names and coordinates are validated against each other on construction
/// and on every replacement; a `SourceSpace` is never observable in a
/// state where the two disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpace {
    names: Vec<String>,
    coordinates: Array2<f64>,
    subject: Option<String>,
    filename: Option<PathBuf>,
}

fn check_coordinates(coordinates: &Array2<f64>) -> Result<()> {
    if coordinates.ncols() != 3 {
        return Err(CartoolError::argument(format!(
            "coordinates must be of shape (n_solution_points, 3), found {:?}",
            coordinates.shape()
        )));
    }
    Ok(())
}

impl SourceSpace {
    pub fn new(names: Vec<String>, coordinates: Array2<f64>) -> Result<Self> {
        check_coordinates(&coordinates)?;
        if names.len() != coordinates.nrows() {
            return Err(CartoolError::argument(format!(
                "coordinates and names dimensions must match but found {} names and {} solution point coordinates",
                names.len(),
                coordinates.nrows()
            )));
        }

        Ok(Self {
            names,
            coordinates,
            subject: None,
            filename: None,
        })
    }

    /// Build from an array of unknown rank (e.g. produced by another library)
    pub fn from_dyn(names: Vec<String>, coordinates: ArrayD<f64>) -> Result<Self> {
        let ndim = coordinates.ndim();
        let coordinates = coordinates.into_dimensionality::<Ix2>().map_err(|_| {
            CartoolError::argument(format!("coordinates must have 2 dimensions, found {}", ndim))
        })?;
        Self::new(names, coordinates)
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub(crate) fn with_filename(mut self, path: &Path) -> Self {
        self.filename = Some(path.to_path_buf());
        self
    }

    /// Number of solution points
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn coordinates(&self) -> ArrayView2<'_, f64> {
        self.coordinates.view()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Replace the names. The count must match the existing coordinates;
    /// to change both, build a new `SourceSpace`.
    pub fn set_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.coordinates.nrows() {
            return Err(CartoolError::argument(format!(
                "names length must match coordinates shape but found {} names and {} solution point coordinates",
                names.len(),
                self.coordinates.nrows()
            )));
        }
        self.names = names;
        Ok(())
    }

    /// Replace the coordinates. The row count must match the existing names.
    pub fn set_coordinates(&mut self, coordinates: Array2<f64>) -> Result<()> {
        check_coordinates(&coordinates)?;
        if coordinates.nrows() != self.names.len() {
            return Err(CartoolError::argument(format!(
                "coordinates shape must match names length but found {} names and {} solution point coordinates",
                self.names.len(),
                coordinates.nrows()
            )));
        }
        self.coordinates = coordinates;
        Ok(())
    }

    pub fn set_subject(&mut self, subject: Option<String>) {
        self.subject = subject;
    }

    /// Arithmetic mean of all coordinates
    pub fn center_of_mass(&self) -> Result<Array1<f64>> {
        self.coordinates
            .mean_axis(Axis(0))
            .ok_or_else(|| CartoolError::argument("center of mass of an empty source space"))
    }

    /// New source space restricted to `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Result<SourceSpace> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(CartoolError::validation(format!(
                "index {} out of range for a source space of {} sources",
                bad,
                self.len()
            )));
        }

        let names = indices.iter().map(|&i| self.names[i].clone()).collect();
        let coordinates = self.coordinates.select(Axis(0), indices);
        Ok(Self {
            names,
            coordinates,
            subject: self.subject.clone(),
            filename: None,
        })
    }

    /// True when both spaces hold the same points, ignoring subject and filename
    pub fn same_points(&self, other: &SourceSpace) -> bool {
        self.names == other.names && self.coordinates == other.coordinates
    }
}

impl fmt::Display for SourceSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SourceSpace | {} sources", self.len())?;
        if let Some(subject) = &self.subject {
            write!(f, ", subject : {}", subject)?;
        }
        if let Some(filename) = &self.filename {
            write!(f, ", filename : {}", filename.display())?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    fn sample() -> SourceSpace {
        SourceSpace::new(
            vec!["S0".into(), "S1".into(), "S2".into()],
            array![[0.0, 0.0, 0.0], [2.0, 4.0, 6.0], [4.0, 8.0, 12.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_mismatched_names() {
        let result = SourceSpace::new(vec!["S0".into()], Array2::zeros((2, 3)));
        assert!(matches!(result, Err(CartoolError::Argument(_))));
    }

    #[test]
    fn test_wrong_column_count() {
        let result = SourceSpace::new(vec!["S0".into()], Array2::zeros((1, 2)));
        assert!(matches!(result, Err(CartoolError::Argument(_))));
    }

    #[test]
    fn test_from_dyn_rejects_rank() {
        let coords = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 1]));
        let result = SourceSpace::from_dyn(vec!["a".into(), "b".into()], coords);
        assert!(matches!(result, Err(CartoolError::Argument(_))));
    }

    #[test]
    fn test_setters_validate() {
        let mut space = sample();
        assert!(space.set_names(vec!["only".into()]).is_err());
        assert!(space.set_coordinates(Array2::zeros((2, 3))).is_err());
        assert_eq!(space.len(), 3);

        space
            .set_coordinates(Array2::from_elem((3, 3), 1.0))
            .unwrap();
        assert_eq!(space.coordinates()[[2, 2]], 1.0);
    }

    #[test]
    fn test_center_of_mass() {
        let center = sample().center_of_mass().unwrap();
        assert_eq!(center.to_vec(), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_subset() {
        let space = sample().with_subject("sub-01");
        let sub = space.subset(&[2, 0]).unwrap();
        assert_eq!(sub.names(), &["S2".to_string(), "S0".to_string()]);
        assert_eq!(sub.coordinates()[[0, 1]], 8.0);
        assert_eq!(sub.subject(), Some("sub-01"));

        assert!(matches!(space.subset(&[3]), Err(CartoolError::Validation(_))));
    }

    #[test]
    fn test_display() {
        let space = sample().with_subject("sub-01");
        assert_eq!(space.to_string(), "<SourceSpace | 3 sources, subject : sub-01>");
    }
}
