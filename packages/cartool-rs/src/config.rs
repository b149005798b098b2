use serde::{Deserialize, Serialize};

/// Options for the text writers (SPI, XYZ)
///
/// Binary formats have a fixed layout and take no options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Fixed number of decimal places for coordinates.
    /// `None` writes the shortest text that parses back to the same value.
    pub precision: Option<usize>,

    /// Column width for the left-aligned XYZ coordinate columns
    pub xyz_column_width: usize,

    /// Column width for the XYZ electrode-name column
    pub xyz_name_width: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            precision: None,
            xyz_column_width: 16,
            xyz_name_width: 25,
        }
    }
}

impl WriterConfig {
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    pub(crate) fn format_value(&self, value: f64) -> String {
        match self.precision {
            Some(precision) => format!("{:.*}", precision, value),
            None => format!("{}", value),
        }
    }
}
