use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, SummaryError};

// ---------------------------------------------------------------------------
// ParamValue – a single register read from a parameter file
// ---------------------------------------------------------------------------

/// A dynamically-typed register value as found in a JCAMP-DX parameter file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    /// Text with the surrounding `<...>` already stripped.
    Text(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Interpret the value as an `f64`; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret the value as an integer; floats only when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterSet – one parameter file (acqus, acqu2s, procs, ...)
// ---------------------------------------------------------------------------

/// All registers of a single parameter file, keyed by register name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    /// File the registers were read from (`acqus`, `procs`, ...).
    pub section: String,
    pub values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new(section: &str) -> Self {
        ParameterSet {
            section: section.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: ParamValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    fn require(&self, key: &str) -> Result<&ParamValue> {
        self.get(key)
            .ok_or_else(|| SummaryError::missing(&self.section, key))
    }

    pub fn require_f64(&self, key: &str) -> Result<f64> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| SummaryError::invalid(&self.section, key, "a number"))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| SummaryError::invalid(&self.section, key, "an integer"))
    }

    pub fn require_text(&self, key: &str) -> Result<&str> {
        self.require(key)?
            .as_text()
            .ok_or_else(|| SummaryError::invalid(&self.section, key, "text"))
    }

    /// Optional register with a fallback used when it is absent.
    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(ParamValue::as_i64).unwrap_or(default)
    }
}

// ---------------------------------------------------------------------------
// RawExperiment – untyped reader output
// ---------------------------------------------------------------------------

/// Everything the reader found in one experiment directory, still untyped.
#[derive(Debug, Clone)]
pub struct RawExperiment {
    pub path: PathBuf,
    /// Parameter files by name: `acqus`, `acqu2s`, ..., `procs`.
    pub sections: BTreeMap<String, ParameterSet>,
}

impl RawExperiment {
    pub fn section(&self, name: &str) -> Option<&ParameterSet> {
        self.sections.get(name)
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Parameters shared by all dimensions of an acquisition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralParameters {
    pub acquisition_date: NaiveDate,
    /// `acquisition_date` rendered with the configured date format.
    pub acquisition_date_label: String,
    pub pulse_program: String,
    pub dimension_count: usize,
    pub scan_count: i64,
    /// Degrees Celsius, one decimal.
    pub temperature: f64,
}

/// Parameters of one acquisition dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionParameters {
    pub nucleus: String,
    /// Two decimals.
    pub spectral_width: f64,
    /// ppm, two decimals.
    pub carrier_offset: f64,
    pub increments: i64,
}

/// One normalised parameter block, tagged by the role it plays.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterRecord {
    General(GeneralParameters),
    Direct(DimensionParameters),
    Indirect(DimensionParameters),
}

/// The per-experiment summary handed to the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcquisitionParameters {
    pub plot_file: Option<String>,
    pub general: Option<GeneralParameters>,
    pub direct: Option<DimensionParameters>,
    pub indirect: Option<DimensionParameters>,
}

impl AcquisitionParameters {
    /// Fold normalised records into the fixed-shape summary.
    pub fn assemble(records: Vec<ParameterRecord>) -> Self {
        let mut params = AcquisitionParameters::default();
        for record in records {
            match record {
                ParameterRecord::General(g) => params.general = Some(g),
                ParameterRecord::Direct(d) => params.direct = Some(d),
                ParameterRecord::Indirect(d) => params.indirect = Some(d),
            }
        }
        params
    }

    /// Number of acquisition dimensions, 0 when no metadata was usable.
    pub fn dimension_count(&self) -> usize {
        self.general.as_ref().map_or(0, |g| g.dimension_count)
    }
}

/// One experiment subdirectory of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    pub number: u32,
    pub parameters: AcquisitionParameters,
}

/// An experiment directory that could not be summarised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedExperiment {
    pub path: PathBuf,
    pub reason: String,
}

/// The complete summary of a dataset directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub experiments: Vec<Experiment>,
    pub skipped: Vec<SkippedExperiment>,
}

impl Dataset {
    pub fn new(name: &str) -> Self {
        Dataset {
            name: name.to_string(),
            experiments: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Number of summarised experiments.
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpectralTrace – reconstructed 1D spectrum
// ---------------------------------------------------------------------------

/// (chemical shift, intensity) pairs ordered by descending shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralTrace {
    pub shift: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl SpectralTrace {
    pub fn len(&self) -> usize {
        self.shift.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shift.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.shift.iter().copied().zip(self.intensity.iter().copied())
    }
}
