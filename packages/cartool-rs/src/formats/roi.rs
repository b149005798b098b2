//! Regions of interest (`.rois`)
//!
//! ```text
//! RO01
//! <source space cardinality>
//! <number of regions>
//! <region name>
//! <1-based indexes, each followed by a space>
//! ...
//! ```

use std::io::{BufRead, BufReader, Lines, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};
use crate::regions::RegionsOfInterest;
use crate::source_space::SourceSpace;

pub const ROI_TAG: &str = "RO01";

fn next_line<B: BufRead>(lines: &mut Lines<B>, what: &str) -> Result<String> {
    let line = lines
        .next()
        .transpose()?
        .ok_or_else(|| CartoolError::format(format!("file ended before {}", what)))?;
    Ok(line.trim_end_matches('\r').to_string())
}

fn parse_count(line: &str, what: &str) -> Result<usize> {
    line.trim()
        .parse::<usize>()
        .map_err(|_| CartoolError::format(format!("{} {:?} is not a count", what, line)))
}

/// Convert an index line to 0-based indexes.
///
/// The last space-separated segment is what follows the trailing separator
/// and is discarded.
fn parse_index_line(line: &str) -> Result<Vec<usize>> {
    let mut segments: Vec<&str> = line.split(' ').collect();
    segments.pop();

    segments
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.parse::<usize>() {
            Ok(index) if index >= 1 => Ok(index - 1),
            _ => Err(CartoolError::format(format!(
                "{:?} is not a 1-based source index",
                segment
            ))),
        })
        .collect()
}

impl RegionsOfInterest {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Self::read_with_source_space(reader, None)
    }

    /// Decode and bind to `source_space`; the cardinality recorded in the
    /// file must equal the space's
    pub fn read_with_source_space<R: Read>(
        reader: &mut R,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();

        let tag = next_line(&mut lines, "the magic tag")?;
        if tag.trim() != ROI_TAG {
            return Err(CartoolError::format(format!(
                "{:?} is not a regions of interest tag (expected {:?})",
                tag.trim(),
                ROI_TAG
            )));
        }
        let original_cardinality = parse_count(&next_line(&mut lines, "the source count")?, "source count")?;
        let n_regions = parse_count(&next_line(&mut lines, "the region count")?, "region count")?;
        log::info!(
            "ROI: {} regions over {} sources",
            n_regions,
            original_cardinality
        );

        let mut names = Vec::new();
        let mut groups = Vec::new();
        for _ in 0..n_regions {
            let name = next_line(&mut lines, "a region name")?;
            let indexes = parse_index_line(&next_line(&mut lines, "a region index line")?)?;
            log::debug!("Region {:?}: {} sources", name.trim(), indexes.len());
            names.push(name.trim().to_string());
            groups.push(indexes);
        }

        if let Some(space) = &source_space {
            if space.len() != original_cardinality {
                return Err(CartoolError::validation(format!(
                    "regions were defined over {} sources, but the source space contains {}",
                    original_cardinality,
                    space.len()
                )));
            }
        }

        Ok(Self::new(names, groups, source_space)?.with_file_metadata(original_cardinality, None))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        // names are trimmed on read
        if let Some(name) = self
            .names()
            .iter()
            .find(|name| name.contains(&['\n', '\r'][..]) || name.trim() != name.as_str())
        {
            return Err(CartoolError::argument(format!(
                "region name {:?} has a line break or surrounding whitespace",
                name
            )));
        }

        writeln!(writer, "{}", ROI_TAG)?;
        writeln!(writer, "{}", self.cardinality_hint())?;
        writeln!(writer, "{}", self.len())?;
        for (name, indexes) in self.iter() {
            writeln!(writer, "{}", name)?;
            for index in indexes {
                write!(writer, "{} ", index + 1)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_source_space(path, None)
    }

    pub fn open_with_source_space(
        path: impl AsRef<Path>,
        source_space: Option<Arc<SourceSpace>>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let regions = read_path(path, |reader| Self::read_with_source_space(reader, source_space))?;
        let cardinality = regions.original_cardinality().unwrap_or_default();
        Ok(regions.with_file_metadata(cardinality, Some(path)))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_to(writer))
    }
}
