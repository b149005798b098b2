//! Simple EEG (`.sef`) continuous recordings

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::{Array2, ArrayView2};
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::{CartoolError, Result};
use crate::formats::{read_path, write_path};

pub const SEF_TAG: &str = "SE01";
const CHANNEL_NAME_WIDTH: usize = 8;

/// Multichannel recording, samples of shape `(n_timeframes, n_channels)`
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousSignal {
    channel_names: Vec<String>,
    n_aux_channels: usize,
    sampling_rate: f32,
    recording_timestamp: Option<NaiveDateTime>,
    samples: Array2<f32>,
    filename: Option<PathBuf>,
}

fn recording_timestamp(fields: [u16; 7]) -> Option<NaiveDateTime> {
    let [year, month, day, hour, minute, second, millisecond] = fields.map(u32::from);
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    date.and_hms_milli_opt(hour, minute, second, millisecond)
        .or_else(|| date.and_hms_opt(hour, minute, second))
}

impl ContinuousSignal {
    pub fn new(channel_names: Vec<String>, sampling_rate: f32, samples: Array2<f32>) -> Result<Self> {
        if channel_names.len() != samples.ncols() {
            return Err(CartoolError::argument(format!(
                "found {} channel names for samples of shape {:?}",
                channel_names.len(),
                samples.shape()
            )));
        }
        Ok(Self {
            channel_names,
            n_aux_channels: 0,
            sampling_rate,
            recording_timestamp: None,
            samples,
            filename: None,
        })
    }

    pub fn with_aux_channels(mut self, n_aux_channels: usize) -> Self {
        self.n_aux_channels = n_aux_channels;
        self
    }

    pub fn with_recording_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.recording_timestamp = Some(timestamp);
        self
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Number of auxiliary channels declared in the header
    pub fn n_aux_channels(&self) -> usize {
        self.n_aux_channels
    }

    pub fn sampling_rate(&self) -> f32 {
        self.sampling_rate
    }

    pub fn recording_timestamp(&self) -> Option<NaiveDateTime> {
        self.recording_timestamp
    }

    pub fn samples(&self) -> ArrayView2<'_, f32> {
        self.samples.view()
    }

    pub fn n_channels(&self) -> usize {
        self.samples.ncols()
    }

    pub fn n_timeframes(&self) -> usize {
        self.samples.nrows()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        codec::expect_tag(reader, &[SEF_TAG], "simple EEG")?;
        let n_channels = codec::read_count(reader, "n_channels")?;
        let n_aux_channels = codec::read_count(reader, "n_aux_channels")?;
        let n_timeframes = codec::read_count(reader, "n_timeframes")?;
        let sampling_rate = codec::read_f32(reader, "sampling rate")?;

        let mut date_fields = [0u16; 7];
        for field in date_fields.iter_mut() {
            *field = codec::read_u16(reader, "recording date")?;
        }
        let recording_timestamp = recording_timestamp(date_fields);
        if recording_timestamp.is_none() {
            log::debug!("Cannot read recording date from {:?}", date_fields);
        }

        log::info!(
            "SEF: {} channels ({} auxiliary), {} timeframes, {} Hz",
            n_channels,
            n_aux_channels,
            n_timeframes,
            sampling_rate
        );

        let mut channel_names = Vec::new();
        for _ in 0..n_channels {
            let name = codec::read_fixed_name(reader, CHANNEL_NAME_WIDTH, "channel name")?;
            channel_names.push(name.trim().to_string());
        }

        let count = codec::element_count(&[n_timeframes, n_channels], "sef")?;
        let payload = codec::read_f32_payload(reader, count, "sef payload")?;
        let samples = Array2::from_shape_vec((n_timeframes, n_channels), payload)
            .map_err(|e| CartoolError::format(format!("sef payload: {}", e)))?;

        Ok(Self {
            channel_names,
            n_aux_channels,
            sampling_rate,
            recording_timestamp,
            samples,
            filename: None,
        })
    }

    /// The recording date is written as zeros
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_tag(writer, SEF_TAG)?;
        codec::write_count(writer, self.n_channels(), "n_channels")?;
        codec::write_count(writer, self.n_aux_channels, "n_aux_channels")?;
        codec::write_count(writer, self.n_timeframes(), "n_timeframes")?;
        codec::write_f32(writer, self.sampling_rate)?;
        for _ in 0..7 {
            codec::write_u16(writer, 0)?;
        }
        for name in &self.channel_names {
            codec::write_fixed_name(writer, name, CHANNEL_NAME_WIDTH, b' ')?;
        }
        codec::write_f32_payload(writer, self.samples.iter().copied())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut signal = read_path(path, |reader| Self::read_from(reader))?;
        signal.filename = Some(path.to_path_buf());
        Ok(signal)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_path(path.as_ref(), |writer| self.write_to(writer))
    }
}

impl fmt::Display for ContinuousSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<ContinuousSignal | {} channels, {} timeframes, sfreq : {}",
            self.n_channels(),
            self.n_timeframes(),
            self.sampling_rate
        )?;
        if let Some(filename) = &self.filename {
            write!(f, ", filename : {}", filename.display())?;
        }
        write!(f, ">")
    }
}
