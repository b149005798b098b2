//! Cartool file formats
//!
//! One module per on-disk format. Every entity reads from any `Read` and
//! writes to any `Write`; the `open`/`save` helpers wrap those with
//! buffered file I/O and close the file before returning.
//!
//! | Extension | Format | Entity |
//! |---|---|---|
//! | `.lf` | Leadfield | [`Leadfield`] |
//! | `.is` | Inverse solution (IS01/IS02/IS03) | [`InverseSolution`] |
//! | `.ris` | Results of inverse solution (RI01) | [`SourceEstimate`] |
//! | `.sef` | Simple EEG (SE01) | [`ContinuousSignal`] |
//! | `.spi` | Solution points (text) | [`SourceSpace`] |
//! | `.xyz` | Electrode positions (text) | [`Montage`] |
//! | `.rois`, `.roi` | Regions of interest (RO01 text) | [`RegionsOfInterest`] |

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{CartoolError, Result};
use crate::regions::RegionsOfInterest;
use crate::source_estimate::SourceEstimate;
use crate::source_space::SourceSpace;

pub mod inverse_solution;
pub mod leadfield;
pub mod ris;
pub mod roi;
pub mod sef;
pub mod spi;
pub mod xyz;

pub use inverse_solution::{InverseSolution, InverseSolutionKind, Regularization};
pub use leadfield::Leadfield;
pub use sef::ContinuousSignal;
pub use xyz::Montage;

pub(crate) fn read_path<T, F>(path: &Path, read: F) -> Result<T>
where
    F: FnOnce(&mut BufReader<File>) -> Result<T>,
{
    log::info!("Reading {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    read(&mut reader)
}

pub(crate) fn write_path<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    log::info!("Writing {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// A Cartool format, identified by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartoolFormat {
    Leadfield,
    InverseSolution,
    InverseSolutionResult,
    ContinuousSignal,
    SolutionPoints,
    Montage,
    RegionsOfInterest,
}

impl CartoolFormat {
    pub const ALL: [CartoolFormat; 7] = [
        Self::Leadfield,
        Self::InverseSolution,
        Self::InverseSolutionResult,
        Self::ContinuousSignal,
        Self::SolutionPoints,
        Self::Montage,
        Self::RegionsOfInterest,
    ];

    /// Extensions, lowercase and without the dot
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Leadfield => &["lf"],
            Self::InverseSolution => &["is"],
            Self::InverseSolutionResult => &["ris"],
            Self::ContinuousSignal => &["sef"],
            Self::SolutionPoints => &["spi"],
            Self::Montage => &["xyz"],
            Self::RegionsOfInterest => &["rois", "roi"],
        }
    }

    pub fn format_name(self) -> &'static str {
        match self {
            Self::Leadfield => "Leadfield",
            Self::InverseSolution => "Inverse Solution",
            Self::InverseSolutionResult => "Results of Inverse Solution",
            Self::ContinuousSignal => "Simple EEG",
            Self::SolutionPoints => "Solution Points",
            Self::Montage => "Electrode Coordinates",
            Self::RegionsOfInterest => "Regions of Interest",
        }
    }

    /// Case-insensitive lookup by extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&extension.as_str()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(extension).ok_or_else(|| {
            CartoolError::argument(format!("Unsupported file extension: {:?}", extension))
        })
    }

    /// All recognized extensions
    pub fn supported_extensions() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .flat_map(|format| format.extensions().iter().copied())
            .collect()
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// Any decoded Cartool file
#[derive(Debug, Clone)]
pub enum CartoolFile {
    Leadfield(Leadfield),
    InverseSolution(InverseSolution),
    SourceEstimate(SourceEstimate),
    ContinuousSignal(ContinuousSignal),
    SourceSpace(SourceSpace),
    Montage(Montage),
    RegionsOfInterest(RegionsOfInterest),
}

impl CartoolFile {
    pub fn format(&self) -> CartoolFormat {
        match self {
            Self::Leadfield(_) => CartoolFormat::Leadfield,
            Self::InverseSolution(_) => CartoolFormat::InverseSolution,
            Self::SourceEstimate(_) => CartoolFormat::InverseSolutionResult,
            Self::ContinuousSignal(_) => CartoolFormat::ContinuousSignal,
            Self::SourceSpace(_) => CartoolFormat::SolutionPoints,
            Self::Montage(_) => CartoolFormat::Montage,
            Self::RegionsOfInterest(_) => CartoolFormat::RegionsOfInterest,
        }
    }
}

/// Read any supported file, dispatching on its extension
///
/// Decoding errors are prefixed with the detected format and the path.
pub fn read_file(path: impl AsRef<Path>) -> Result<CartoolFile> {
    let path = path.as_ref();
    let format = CartoolFormat::from_path(path)?;
    log::debug!("Detected {} format for {}", format.format_name(), path.display());

    let decoded = match format {
        CartoolFormat::Leadfield => Leadfield::open(path).map(CartoolFile::Leadfield),
        CartoolFormat::InverseSolution => InverseSolution::open(path).map(CartoolFile::InverseSolution),
        CartoolFormat::InverseSolutionResult => {
            SourceEstimate::open(path).map(CartoolFile::SourceEstimate)
        }
        CartoolFormat::ContinuousSignal => {
            ContinuousSignal::open(path).map(CartoolFile::ContinuousSignal)
        }
        CartoolFormat::SolutionPoints => SourceSpace::open(path).map(CartoolFile::SourceSpace),
        CartoolFormat::Montage => Montage::open(path).map(CartoolFile::Montage),
        CartoolFormat::RegionsOfInterest => {
            RegionsOfInterest::open(path).map(CartoolFile::RegionsOfInterest)
        }
    };
    decoded.map_err(|e| match e {
        CartoolError::Format(message) => CartoolError::format(format!(
            "{} {}: {}",
            format.format_name(),
            path.display(),
            message
        )),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supported_extensions() {
        let extensions = CartoolFormat::supported_extensions();
        for ext in ["lf", "is", "ris", "sef", "spi", "xyz", "rois", "roi"] {
            assert!(extensions.contains(&ext), "missing {}", ext);
        }
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        assert_eq!(
            CartoolFormat::from_path(&PathBuf::from("sub-01.RIS")).unwrap(),
            CartoolFormat::InverseSolutionResult
        );
        assert_eq!(
            CartoolFormat::from_extension("Roi"),
            Some(CartoolFormat::RegionsOfInterest)
        );
        assert!(CartoolFormat::is_supported(&PathBuf::from("head.xyz")));
    }

    #[test]
    fn test_unsupported() {
        assert!(!CartoolFormat::is_supported(&PathBuf::from("recording.edf")));
        assert!(!CartoolFormat::is_supported(&PathBuf::from("no_extension")));
        assert!(matches!(
            read_file("recording.edf"),
            Err(CartoolError::Argument(_))
        ));
    }

    #[test]
    fn test_decoding_errors_name_the_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.ris");
        std::fs::write(&path, b"XXXX").unwrap();

        match read_file(&path) {
            Err(CartoolError::Format(message)) => {
                assert!(message.starts_with("Results of Inverse Solution "), "{}", message);
                assert!(message.contains("broken.ris"));
            }
            other => panic!("expected a format error, got {:?}", other),
        }
    }
}
