use std::sync::OnceLock;

use regex::Regex;

use super::model::RawExperiment;

/// Name of the primary (direct) dimension parameter file.
pub const DIRECT_SECTION: &str = "acqus";
/// Name of the first indirect dimension parameter file.
pub const INDIRECT_SECTION: &str = "acqu2s";

fn acquisition_key() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^acqu\d*s$").expect("static pattern compiles"))
}

/// Acquisition dimensions found in a raw experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    /// Matching section names, in key order (`acqu2s`, `acqus`, ...).
    pub keys: Vec<String>,
}

impl Dimensions {
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

/// Collect every section named `acqu` + optional index + `s`.
pub fn classify(raw: &RawExperiment) -> Dimensions {
    classify_keys(raw.sections.keys().map(String::as_str))
}

pub fn classify_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Dimensions {
    Dimensions {
        keys: keys
            .into_iter()
            .filter(|k| acquisition_key().is_match(k))
            .map(str::to_string)
            .collect(),
    }
}
