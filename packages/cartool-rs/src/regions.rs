use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CartoolError, Result};
use crate::source_space::SourceSpace;

/// Named groups of 0-based source indices
#[derive(Debug, Clone, PartialEq)]
pub struct RegionsOfInterest {
    names: Vec<String>,
    groups_of_indexes: Vec<Vec<usize>>,
    source_space: Option<Arc<SourceSpace>>,
    original_cardinality: Option<usize>,
    filename: Option<PathBuf>,
}

fn check_indexes(groups: &[Vec<usize>], source_space: &SourceSpace) -> Result<()> {
    let maximum = groups.iter().flatten().copied().max();
    if let Some(maximum) = maximum {
        if maximum >= source_space.len() {
            return Err(CartoolError::validation(format!(
                "index {} found in groups_of_indexes but SourceSpace contains only {} sources",
                maximum,
                source_space.len()
            )));
        }
    }
    Ok(())
}

impl RegionsOfInterest {
    pub fn new(
        names: Vec<String>,
        groups_of_indexes: Vec<Vec<usize>>,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        if names.len() != groups_of_indexes.len() {
            return Err(CartoolError::argument(format!(
                "found {} region names but {} groups of indexes",
                names.len(),
                groups_of_indexes.len()
            )));
        }
        if let Some(space) = &source_space {
            check_indexes(&groups_of_indexes, space)?;
        }

        Ok(Self {
            names,
            groups_of_indexes,
            source_space,
            original_cardinality: None,
            filename: None,
        })
    }

    pub(crate) fn with_file_metadata(mut self, original_cardinality: usize, path: Option<&Path>) -> Self {
        self.original_cardinality = Some(original_cardinality);
        self.filename = path.map(Path::to_path_buf);
        self
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn groups_of_indexes(&self) -> &[Vec<usize>] {
        &self.groups_of_indexes
    }

    pub fn source_space(&self) -> Option<&Arc<SourceSpace>> {
        self.source_space.as_ref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Source-space cardinality written in the region file header, if read from one
    pub fn original_cardinality(&self) -> Option<usize> {
        self.original_cardinality
    }

    /// Cardinality to record when writing: the bound source space wins,
    /// then the value read from file, then the smallest space the indexes fit
    pub(crate) fn cardinality_hint(&self) -> usize {
        if let Some(space) = &self.source_space {
            return space.len();
        }
        if let Some(n) = self.original_cardinality {
            return n;
        }
        self.groups_of_indexes
            .iter()
            .flatten()
            .max()
            .map_or(0, |&m| m + 1)
    }

    /// Bind (or unbind) a source space; indexes are re-validated first
    pub fn set_source_space(&mut self, source_space: Option<Arc<SourceSpace>>) -> Result<()> {
        if let Some(space) = &source_space {
            check_indexes(&self.groups_of_indexes, space)?;
        }
        self.source_space = source_space;
        Ok(())
    }

    /// Replace all groups at once; names are kept and must still pair up
    pub fn set_groups_of_indexes(&mut self, groups_of_indexes: Vec<Vec<usize>>) -> Result<()> {
        if groups_of_indexes.len() != self.names.len() {
            return Err(CartoolError::argument(format!(
                "expected {} groups of indexes, found {}",
                self.names.len(),
                groups_of_indexes.len()
            )));
        }
        if let Some(space) = &self.source_space {
            check_indexes(&groups_of_indexes, space)?;
        }
        self.groups_of_indexes = groups_of_indexes;
        Ok(())
    }

    /// Iterate `(name, indexes)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.groups_of_indexes.iter().map(Vec::as_slice))
    }
}

impl fmt::Display for RegionsOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RegionsOfInterest | {} regions", self.len())?;
        if let Some(filename) = &self.filename {
            write!(f, ", filename : {}", filename.display())?;
        }
        write!(f, ">")
    }
}
