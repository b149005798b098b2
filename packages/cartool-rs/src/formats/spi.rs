//! Solution points (`.spi`): one `x\ty\tz\tname` row per point, no header.

use ndarray::Array2;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::config::WriterConfig;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};
use crate::source_space::SourceSpace;

fn parse_coordinate(field: &str, line_number: usize) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| {
        CartoolError::format(format!(
            "line {}: {:?} is not a coordinate",
            line_number, field
        ))
    })
}

impl SourceSpace {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut names = Vec::new();
        let mut values = Vec::new();

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(CartoolError::format(format!(
                    "line {}: expected 4 tab-separated fields, found {}",
                    index + 1,
                    fields.len()
                )));
            }
            for field in &fields[..3] {
                values.push(parse_coordinate(field, index + 1)?);
            }
            names.push(fields[3].to_string());
        }

        log::info!("SPI: {} solution points", names.len());
        let coordinates = Array2::from_shape_vec((names.len(), 3), values)
            .map_err(|e| CartoolError::format(format!("solution points: {}", e)))?;
        SourceSpace::new(names, coordinates)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.write_with(writer, &WriterConfig::default())
    }

    pub fn write_with<W: Write>(&self, writer: &mut W, config: &WriterConfig) -> Result<()> {
        if let Some(name) = self
            .names()
            .iter()
            .find(|name| name.contains(&['\t', '\n', '\r'][..]))
        {
            return Err(CartoolError::argument(format!(
                "solution point name {:?} contains a tab or line break",
                name
            )));
        }

        for (name, point) in self.names().iter().zip(self.coordinates().rows()) {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                config.format_value(point[0]),
                config.format_value(point[1]),
                config.format_value(point[2]),
                name
            )?;
        }
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let space = read_path(path, |reader| Self::read_from(reader))?;
        Ok(space.with_filename(path))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &WriterConfig::default())
    }

    pub fn save_with(&self, path: impl AsRef<Path>, config: &WriterConfig) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_with(writer, config))
    }
}
