//! Electrode coordinates (`.xyz`)
//!
//! First line `<n> <radius>`; then `n` whitespace-separated `x y z name`
//! rows in millimeters. Positions are held in meters.

use ndarray::{Array2, ArrayView2, Axis};
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::WriterConfig;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};

const MILLIMETERS_PER_METER: f64 = 1000.0;
const COLUMN_SEPARATOR: &str = "    ";

/// Named electrode positions in meters
#[derive(Debug, Clone, PartialEq)]
pub struct Montage {
    names: Vec<String>,
    positions: Array2<f64>,
    filename: Option<PathBuf>,
}

impl Montage {
    pub fn new(names: Vec<String>, positions: Array2<f64>) -> Result<Self> {
        if positions.ncols() != 3 || positions.nrows() != names.len() {
            return Err(CartoolError::argument(format!(
                "positions must be of shape ({}, 3), found {:?}",
                names.len(),
                positions.shape()
            )));
        }
        Ok(Self {
            names,
            positions,
            filename: None,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn positions(&self) -> ArrayView2<'_, f64> {
        self.positions.view()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Largest per-electrode mean of the millimeter coordinates
    fn radius_mm(&self) -> f64 {
        self.positions
            .mean_axis(Axis(1))
            .map(|means| {
                means
                    .iter()
                    .map(|m| m * MILLIMETERS_PER_METER)
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .filter(|r| r.is_finite())
            .unwrap_or(0.0)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();

        let first = lines
            .next()
            .transpose()?
            .ok_or_else(|| CartoolError::format("xyz file is empty"))?;
        let n = first
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<usize>().ok())
            .ok_or_else(|| {
                CartoolError::format(format!("{:?} does not start with an electrode count", first))
            })?;
        log::info!("XYZ: {} electrodes", n);

        let mut names = Vec::new();
        let mut values = Vec::new();
        while names.len() < n {
            let line = lines.next().transpose()?.ok_or_else(|| {
                CartoolError::format(format!(
                    "xyz file declares {} electrodes but ends after {}",
                    n,
                    names.len()
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(CartoolError::format(format!(
                    "electrode row {:?} needs x, y, z and a name",
                    line
                )));
            }
            for field in &fields[..3] {
                let mm = field.parse::<f64>().map_err(|_| {
                    CartoolError::format(format!("{:?} is not a coordinate", field))
                })?;
                values.push(mm / MILLIMETERS_PER_METER);
            }
            names.push(fields[3].to_string());
        }

        let positions = Array2::from_shape_vec((n, 3), values)
            .map_err(|e| CartoolError::format(format!("electrode positions: {}", e)))?;
        Self::new(names, positions)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.write_with(writer, &WriterConfig::default())
    }

    pub fn write_with<W: Write>(&self, writer: &mut W, config: &WriterConfig) -> Result<()> {
        if let Some(name) = self
            .names
            .iter()
            .find(|name| name.is_empty() || name.contains(char::is_whitespace))
        {
            return Err(CartoolError::argument(format!(
                "electrode name {:?} must be a single non-empty word",
                name
            )));
        }

        writeln!(
            writer,
            "{}{}{}",
            self.len(),
            COLUMN_SEPARATOR,
            config.format_value(self.radius_mm())
        )?;

        let width = config.xyz_column_width;
        for (name, position) in self.names.iter().zip(self.positions.rows()) {
            let [x, y, z] = [position[0], position[1], position[2]]
                .map(|v| config.format_value(v * MILLIMETERS_PER_METER));
            writeln!(
                writer,
                "{:<width$}{sep}{:<width$}{sep}{:<width$}{sep}{:<name_width$}",
                x,
                y,
                z,
                name,
                width = width,
                name_width = config.xyz_name_width,
                sep = COLUMN_SEPARATOR
            )?;
        }
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut montage = read_path(path, |reader| Self::read_from(reader))?;
        montage.filename = Some(path.to_path_buf());
        Ok(montage)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &WriterConfig::default())
    }

    pub fn save_with(&self, path: impl AsRef<Path>, config: &WriterConfig) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_with(writer, config))
    }
}

impl fmt::Display for Montage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Montage | {} electrodes", self.len())?;
        if let Some(filename) = &self.filename {
            write!(f, ", filename : {}", filename.display())?;
        }
        write!(f, ">")
    }
}
