use ndarray::{Array3, Array4, ArrayView3, Axis};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use crate::codec;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};
use crate::types::Dimensionality;

const CHANNEL_NAME_WIDTH: usize = 32;
const SOLUTION_POINT_NAME_WIDTH: usize = 16;
const REGULARIZATION_NAME_WIDTH: usize = 32;

/// Version tag of an inverse solution file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InverseSolutionKind {
    Is01,
    Is02,
    /// Carries channel, solution point and regularization name tables
    Is03,
}

impl InverseSolutionKind {
    pub const TAGS: [&'static str; 3] = ["IS01", "IS02", "IS03"];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Is01 => "IS01",
            Self::Is02 => "IS02",
            Self::Is03 => "IS03",
        }
    }

    fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "IS01" => Ok(Self::Is01),
            "IS02" => Ok(Self::Is02),
            "IS03" => Ok(Self::Is03),
            other => Err(CartoolError::format(format!(
                "{:?} is not an inverse solution tag",
                other
            ))),
        }
    }
}

impl fmt::Display for InverseSolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One regularization level: a name, its value and an operator of shape
/// `(n_dim, n_solution_points, n_channels)`
#[derive(Debug, Clone, PartialEq)]
pub struct Regularization {
    pub name: String,
    pub value: f64,
    operator: Array3<f32>,
}

impl Regularization {
    pub fn new(name: impl Into<String>, value: f64, operator: Array3<f32>) -> Result<Self> {
        Dimensionality::from_n_dim(operator.shape()[0])?;
        Ok(Self {
            name: name.into(),
            value,
            operator,
        })
    }

    pub fn operator(&self) -> ArrayView3<'_, f32> {
        self.operator.view()
    }
}

/// Inverse operator mapping channel potentials to solution points
#[derive(Debug, Clone, PartialEq)]
pub struct InverseSolution {
    kind: InverseSolutionKind,
    dimensionality: Dimensionality,
    n_channels: usize,
    n_solution_points: usize,
    channel_names: Vec<String>,
    solution_point_names: Vec<String>,
    regularizations: Vec<Regularization>,
}

impl InverseSolution {
    /// Build an IS03-style solution; every operator must share one shape
    pub fn new(
        channel_names: Vec<String>,
        solution_point_names: Vec<String>,
        regularizations: Vec<Regularization>,
    ) -> Result<Self> {
        let first = regularizations
            .first()
            .ok_or_else(|| CartoolError::argument("an inverse solution needs at least one regularization"))?;
        let shape = first.operator.dim();
        if let Some(other) = regularizations.iter().find(|r| r.operator.dim() != shape) {
            return Err(CartoolError::argument(format!(
                "regularization {:?} has operator shape {:?}, expected {:?}",
                other.name,
                other.operator.shape(),
                first.operator.shape()
            )));
        }

        let (n_dim, n_solution_points, n_channels) = shape;
        if channel_names.len() != n_channels {
            return Err(CartoolError::argument(format!(
                "found {} channel names for an operator over {} channels",
                channel_names.len(),
                n_channels
            )));
        }
        if solution_point_names.len() != n_solution_points {
            return Err(CartoolError::argument(format!(
                "found {} solution point names for an operator over {} solution points",
                solution_point_names.len(),
                n_solution_points
            )));
        }

        Ok(Self {
            kind: InverseSolutionKind::Is03,
            dimensionality: Dimensionality::from_n_dim(n_dim)?,
            n_channels,
            n_solution_points,
            channel_names,
            solution_point_names,
            regularizations,
        })
    }

    pub fn kind(&self) -> InverseSolutionKind {
        self.kind
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn is_scalar(&self) -> bool {
        self.dimensionality.is_scalar()
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn n_solution_points(&self) -> usize {
        self.n_solution_points
    }

    /// Empty for IS01/IS02 files
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Empty for IS01/IS02 files
    pub fn solution_point_names(&self) -> &[String] {
        &self.solution_point_names
    }

    pub fn regularizations(&self) -> &[Regularization] {
        &self.regularizations
    }

    pub fn regularization_by_name(&self, name: &str) -> Option<&Regularization> {
        self.regularizations.iter().find(|r| r.name == name)
    }

    /// All levels stacked, shape `(n_regularizations, n_dim, n_solution_points, n_channels)`
    pub fn operators(&self) -> Array4<f32> {
        let (n_dim, n_sp, n_ch) = (self.dimensionality.n_dim(), self.n_solution_points, self.n_channels);
        Array4::from_shape_fn((self.regularizations.len(), n_dim, n_sp, n_ch), |(r, d, s, c)| {
            self.regularizations[r].operator[[d, s, c]]
        })
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let tag = codec::expect_tag(reader, &InverseSolutionKind::TAGS, "inverse solution")?;
        let kind = InverseSolutionKind::from_tag(&tag)?;
        let n_channels = codec::read_count(reader, "n_channels")?;
        let n_solution_points = codec::read_count(reader, "n_solution_points")?;
        let n_regularizations = codec::read_count(reader, "n_regularizations")?;
        let dimensionality = codec::read_flag_byte(reader)?;
        let n_dim = dimensionality.n_dim();

        log::info!(
            "IS type: {}, {} channels, {} solution points, {} regularizations, {}",
            kind,
            n_channels,
            n_solution_points,
            n_regularizations,
            dimensionality
        );

        let (channel_names, solution_point_names, regularizations) = match kind {
            InverseSolutionKind::Is01 | InverseSolutionKind::Is02 => {
                let count = codec::element_count(&[n_dim, n_solution_points, n_channels], "operator")?;
                let payload = codec::read_f32_payload(reader, count, "inverse solution payload")?;
                let operator = Array3::from_shape_vec((n_dim, n_solution_points, n_channels), payload)
                    .map_err(|e| CartoolError::format(format!("inverse solution payload: {}", e)))?;
                let level = Regularization {
                    name: String::new(),
                    value: 0.0,
                    operator,
                };
                (Vec::new(), Vec::new(), vec![level])
            }
            InverseSolutionKind::Is03 => {
                let channel_names =
                    read_name_table(reader, n_channels, CHANNEL_NAME_WIDTH, "channel name")?;
                let solution_point_names = read_name_table(
                    reader,
                    n_solution_points,
                    SOLUTION_POINT_NAME_WIDTH,
                    "solution point name",
                )?;
                let mut values = Vec::new();
                for _ in 0..n_regularizations {
                    values.push(codec::read_f64(reader, "regularization value")?);
                }
                let names = read_name_table(
                    reader,
                    n_regularizations,
                    REGULARIZATION_NAME_WIDTH,
                    "regularization name",
                )?;
                log::debug!("Regularizations: {:?} = {:?}", names, values);

                let count = codec::element_count(
                    &[n_regularizations, n_solution_points, n_dim, n_channels],
                    "operator",
                )?;
                let payload = codec::read_f32_payload(reader, count, "inverse solution payload")?;
                let stored = Array4::from_shape_vec(
                    (n_regularizations, n_solution_points, n_dim, n_channels),
                    payload,
                )
                .map_err(|e| CartoolError::format(format!("inverse solution payload: {}", e)))?;
                let operators = stored.permuted_axes([0, 2, 1, 3]);

                let regularizations: Vec<Regularization> = names
                    .into_iter()
                    .zip(values)
                    .zip(operators.axis_iter(Axis(0)))
                    .map(|((name, value), operator)| Regularization {
                        name,
                        value,
                        operator: operator.as_standard_layout().into_owned(),
                    })
                    .collect();
                (channel_names, solution_point_names, regularizations)
            }
        };

        Ok(Self {
            kind,
            dimensionality,
            n_channels,
            n_solution_points,
            channel_names,
            solution_point_names,
            regularizations,
        })
    }

    /// Encode as IS03, whatever version was read
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        check_name_table(&self.channel_names, self.n_channels, CHANNEL_NAME_WIDTH, "channel")?;
        check_name_table(
            &self.solution_point_names,
            self.n_solution_points,
            SOLUTION_POINT_NAME_WIDTH,
            "solution point",
        )?;
        for regularization in &self.regularizations {
            codec::check_fixed_name(
                &regularization.name,
                REGULARIZATION_NAME_WIDTH,
                "regularization name",
            )?;
        }

        codec::write_tag(writer, InverseSolutionKind::Is03.tag())?;
        codec::write_count(writer, self.n_channels, "n_channels")?;
        codec::write_count(writer, self.n_solution_points, "n_solution_points")?;
        codec::write_count(writer, self.regularizations.len(), "n_regularizations")?;
        codec::write_flag_byte(writer, self.dimensionality)?;

        for name in &self.channel_names {
            codec::write_fixed_name(writer, name, CHANNEL_NAME_WIDTH, 0)?;
        }
        for name in &self.solution_point_names {
            codec::write_fixed_name(writer, name, SOLUTION_POINT_NAME_WIDTH, 0)?;
        }
        for regularization in &self.regularizations {
            codec::write_f64(writer, regularization.value)?;
        }
        for regularization in &self.regularizations {
            codec::write_fixed_name(writer, &regularization.name, REGULARIZATION_NAME_WIDTH, 0)?;
        }

        // stored as (n_regularizations, n_solution_points, n_dim, n_channels)
        for regularization in &self.regularizations {
            let stored = regularization.operator.view().permuted_axes([1, 0, 2]);
            codec::write_f32_payload(writer, stored.iter().copied())?;
        }
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        read_path(path.as_ref(), |reader| Self::read_from(reader))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_to(writer))
    }
}

fn read_name_table<R: Read>(reader: &mut R, count: usize, width: usize, what: &str) -> Result<Vec<String>> {
    // count is untrusted; grow as names are actually read
    let mut names = Vec::new();
    for _ in 0..count {
        names.push(codec::read_fixed_name(reader, width, what)?);
    }
    Ok(names)
}

fn check_name_table(names: &[String], expected: usize, width: usize, what: &str) -> Result<()> {
    if names.len() != expected {
        return Err(CartoolError::argument(format!(
            "IS03 needs {} {} names, found {}",
            expected,
            what,
            names.len()
        )));
    }
    let what = format!("{} name", what);
    names
        .iter()
        .try_for_each(|name| codec::check_fixed_name(name, width, &what))
}
