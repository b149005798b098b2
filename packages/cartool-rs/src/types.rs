use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CartoolError, Result};

/// Flag byte stored in IS and RIS headers for scalar solutions
pub const SCALAR_FLAG: u8 = 0x01;
/// Flag byte stored in IS and RIS headers for vectorial solutions
pub const VECTORIAL_FLAG: u8 = 0x00;

/// Whether each source carries one amplitude or a 3-D dipole per timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensionality {
    Scalar,
    Vectorial,
}

impl Dimensionality {
    /// Size of the orientation axis (1 or 3)
    pub fn n_dim(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vectorial => 3,
        }
    }

    /// Inverse of [`Dimensionality::n_dim`]; anything but 1 or 3 is rejected
    pub fn from_n_dim(n_dim: usize) -> Result<Self> {
        match n_dim {
            1 => Ok(Self::Scalar),
            3 => Ok(Self::Vectorial),
            other => Err(CartoolError::argument(format!(
                "orientation axis must be 1 (scalar) or 3 (vectorial), found {}",
                other
            ))),
        }
    }

    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            SCALAR_FLAG => Ok(Self::Scalar),
            VECTORIAL_FLAG => Ok(Self::Vectorial),
            other => Err(CartoolError::format(format!(
                "scalar flag must be 0x01 (scalar) or 0x00 (vectorial), found 0x{:02X}",
                other
            ))),
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Self::Scalar => SCALAR_FLAG,
            Self::Vectorial => VECTORIAL_FLAG,
        }
    }

    pub fn is_scalar(self) -> bool {
        self == Self::Scalar
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "Scalar"),
            Self::Vectorial => write!(f, "Vectorial"),
        }
    }
}
