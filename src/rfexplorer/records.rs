//! Text records reported by the analyzer and the data model they populate.
use serde::Serialize;
use thiserror::Error;

/// Number of comma separated fields in a `C2-F:` configuration record.
pub const CONFIG_FIELD_COUNT: usize = 13;

/// Frequency fields arrive in kHz.
const KHZ: u64 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected {expected} configuration fields, got {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("configuration field {field} is not an integer: {value:?}")]
    NotInteger { field: &'static str, value: String },

    #[error("configuration field {field} is not a valid frequency: {value}")]
    FrequencyOutOfRange { field: &'static str, value: i64 },
}

/// Classification of a `#` text frame by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRecord<'a> {
    /// `Sn<serial>`
    Identity(&'a str),
    /// `C2-M:<main>,<expansion>,<firmware>`
    Setup(&'a str),
    /// `C2-F:<13 integers>`
    Configuration(&'a str),
    /// `K<0|1>`
    TrackingStatus(&'a str),
    Unknown(&'a str),
}

impl<'a> TextRecord<'a> {
    /// Classify a text frame body. The payload excludes the prefix.
    pub fn classify(text: &'a str) -> Self {
        if let Some(rest) = text.strip_prefix("Sn") {
            TextRecord::Identity(rest)
        } else if let Some(rest) = text.strip_prefix("C2-M:") {
            TextRecord::Setup(rest)
        } else if let Some(rest) = text.strip_prefix("C2-F:") {
            TextRecord::Configuration(rest)
        } else if let Some(rest) = text.strip_prefix('K') {
            TextRecord::TrackingStatus(rest)
        } else {
            TextRecord::Unknown(text)
        }
    }
}

/// Parse the payload of a `K` record.
pub fn parse_tracking_status(payload: &str) -> Option<bool> {
    match payload {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Hardware and firmware identification (`C2-M:`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Setup {
    pub main_model: Option<String>,
    pub expansion_model: Option<String>,
    pub firmware_version: Option<String>,
}

impl Setup {
    /// Split into at most three parts; the last part keeps any further commas.
    pub fn parse(payload: &str) -> Self {
        let mut parts = payload.splitn(3, ',').map(str::to_string);
        Setup {
            main_model: parts.next(),
            expansion_model: parts.next(),
            firmware_version: parts.next(),
        }
    }
}

/// Acquisition configuration (`C2-F:`), frequencies scaled to Hz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub start_freq: u64,
    pub freq_step: u64,
    pub amp_top: i64,
    pub amp_bottom: i64,
    pub sweep_points: usize,
    pub exp_module_active: bool,
    pub current_mode: i64,
    pub min_freq: u64,
    pub max_freq: u64,
    pub max_span: u64,
    /// Resolution bandwidth; the device reports 0 when it has none.
    pub rbw: Option<u64>,
    pub amp_offset: i64,
    pub calculator_mode: i64,
}

const FIELD_NAMES: [&str; CONFIG_FIELD_COUNT] = [
    "start_freq",
    "freq_step",
    "amp_top",
    "amp_bottom",
    "sweep_points",
    "exp_module_active",
    "current_mode",
    "min_freq",
    "max_freq",
    "max_span",
    "rbw",
    "amp_offset",
    "calculator_mode",
];

fn khz(field: &'static str, value: i64) -> Result<u64, RecordError> {
    u64::try_from(value)
        .ok()
        .and_then(|v| v.checked_mul(KHZ))
        .ok_or(RecordError::FrequencyOutOfRange { field, value })
}

impl Configuration {
    /// Parse the payload of a `C2-F:` record. All fields must be integers; nothing is
    /// defaulted.
    pub fn parse(payload: &str) -> Result<Self, RecordError> {
        let parts: Vec<&str> = payload.split(',').collect();
        if parts.len() != CONFIG_FIELD_COUNT {
            return Err(RecordError::FieldCount {
                expected: CONFIG_FIELD_COUNT,
                found: parts.len(),
            });
        }
        let mut v = [0i64; CONFIG_FIELD_COUNT];
        for (i, part) in parts.iter().enumerate() {
            v[i] = part
                .trim()
                .parse::<i64>()
                .map_err(|_| RecordError::NotInteger {
                    field: FIELD_NAMES[i],
                    value: part.to_string(),
                })?;
        }
        let sweep_points = usize::try_from(v[4]).map_err(|_| RecordError::NotInteger {
            field: FIELD_NAMES[4],
            value: v[4].to_string(),
        })?;
        let rbw = match v[10] {
            0 => None,
            r => Some(khz(FIELD_NAMES[10], r)?),
        };
        Ok(Configuration {
            start_freq: khz(FIELD_NAMES[0], v[0])?,
            freq_step: khz(FIELD_NAMES[1], v[1])?,
            amp_top: v[2],
            amp_bottom: v[3],
            sweep_points,
            exp_module_active: v[5] != 0,
            current_mode: v[6],
            min_freq: khz(FIELD_NAMES[7], v[7])?,
            max_freq: khz(FIELD_NAMES[8], v[8])?,
            max_span: khz(FIELD_NAMES[9], v[9])?,
            rbw,
            amp_offset: v[11],
            calculator_mode: v[12],
        })
    }

    /// Frequency of the last sweep point, in Hz.
    pub fn stop_freq(&self) -> u64 {
        self.start_freq
            .saturating_add(self.freq_step.saturating_mul(self.sweep_points.saturating_sub(1) as u64))
    }
}
