use log::debug;

use super::classify::{Dimensions, DIRECT_SECTION, INDIRECT_SECTION};
use super::model::{
    AcquisitionParameters, DimensionParameters, GeneralParameters, ParameterRecord,
    ParameterSet, RawExperiment,
};
use crate::config::DateConfig;
use crate::error::{Result, SummaryError};

const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Kelvin register to degrees Celsius, one decimal.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round_to(kelvin - ZERO_CELSIUS_IN_KELVIN, 1)
}

/// Absolute carrier offset (Hz) over reference frequency (MHz) gives ppm.
pub fn carrier_offset_ppm(offset_hz: f64, reference_mhz: f64) -> Option<f64> {
    if reference_mhz == 0.0 || !reference_mhz.is_finite() {
        return None;
    }
    Some(round_to(offset_hz / reference_mhz, 2))
}

/// Build the record for one acquisition dimension.
pub fn dimension_parameters(set: &ParameterSet) -> Result<DimensionParameters> {
    let reference = set.require_f64("SFO1")?;
    let offset = set.require_f64("O1")?;
    let carrier_offset = carrier_offset_ppm(offset, reference)
        .ok_or_else(|| SummaryError::invalid(&set.section, "SFO1", "a non-zero frequency"))?;

    Ok(DimensionParameters {
        nucleus: set.require_text("NUC1")?.to_string(),
        spectral_width: round_to(set.require_f64("SW")?, 2),
        carrier_offset,
        increments: set.require_i64("TD")?,
    })
}

/// Build the record shared by all dimensions from the primary parameter file.
pub fn general_parameters(
    set: &ParameterSet,
    dimension_count: usize,
    dates: &DateConfig,
) -> Result<GeneralParameters> {
    let timestamp = set.require_i64("DATE")?;
    let acquisition_date = dates
        .date_of(timestamp)
        .ok_or_else(|| SummaryError::invalid(&set.section, "DATE", "a valid Unix timestamp"))?;

    Ok(GeneralParameters {
        acquisition_date,
        acquisition_date_label: dates.label(acquisition_date),
        pulse_program: set.require_text("PULPROG")?.to_string(),
        dimension_count,
        scan_count: set.require_i64("NS")?,
        temperature: kelvin_to_celsius(set.require_f64("TE")?),
    })
}

/// Turn the classified raw sections into tagged, fixed-shape records.
///
/// The primary file yields a general and a direct record, `acqu2s` an
/// indirect one. Higher dimensions only count toward the dimension count.
pub fn normalize(
    raw: &RawExperiment,
    dims: &Dimensions,
    dates: &DateConfig,
) -> Result<Vec<ParameterRecord>> {
    let mut records = Vec::with_capacity(3);
    for key in &dims.keys {
        let Some(set) = raw.section(key) else {
            continue;
        };
        match key.as_str() {
            DIRECT_SECTION => {
                records.push(ParameterRecord::General(general_parameters(
                    set,
                    dims.count(),
                    dates,
                )?));
                records.push(ParameterRecord::Direct(dimension_parameters(set)?));
            }
            INDIRECT_SECTION => {
                records.push(ParameterRecord::Indirect(dimension_parameters(set)?));
            }
            other => debug!("{}: ignoring {other}", raw.path.display()),
        }
    }
    Ok(records)
}

/// Classified sections straight to the per-experiment summary.
pub fn acquisition_parameters(
    raw: &RawExperiment,
    dims: &Dimensions,
    dates: &DateConfig,
) -> Result<AcquisitionParameters> {
    normalize(raw, dims, dates).map(AcquisitionParameters::assemble)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::TimestampZone;
    use crate::data::classify::classify;
    use crate::data::model::ParamValue;

    fn utc() -> DateConfig {
        DateConfig {
            zone: TimestampZone::Utc,
            ..DateConfig::default()
        }
    }

    fn dimension_set(section: &str, nucleus: &str) -> ParameterSet {
        let mut set = ParameterSet::new(section);
        set.insert("NUC1", ParamValue::Text(nucleus.into()));
        set.insert("SW", ParamValue::Float(20.02536));
        set.insert("O1", ParamValue::Float(1882.0));
        set.insert("SFO1", ParamValue::Float(400.13));
        set.insert("TD", ParamValue::Integer(65536));
        set
    }

    fn primary_set() -> ParameterSet {
        let mut set = dimension_set("acqus", "1H");
        set.insert("DATE", ParamValue::Integer(1_600_000_000));
        set.insert("PULPROG", ParamValue::Text("zg30".into()));
        set.insert("NS", ParamValue::Integer(16));
        set.insert("TE", ParamValue::Float(298.15));
        set
    }

    fn raw(sets: Vec<ParameterSet>) -> RawExperiment {
        RawExperiment {
            path: PathBuf::from("dataset/1"),
            sections: sets
                .into_iter()
                .map(|s| (s.section.clone(), s))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn temperature_in_celsius() {
        assert_eq!(kelvin_to_celsius(298.15), 25.0);
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
        assert_eq!(kelvin_to_celsius(300.0), 26.9);
        assert_eq!(kelvin_to_celsius(310.04), 36.9);
    }

    #[test]
    fn carrier_offset_from_register_pair() {
        // 1882.0 Hz / 400.13 MHz = 4.70347... ppm
        assert_eq!(carrier_offset_ppm(1882.0, 400.13), Some(4.70));
        // 2470.97 Hz / 400.1324708 MHz = 6.17537... ppm
        assert_eq!(carrier_offset_ppm(2470.97, 400.1324708), Some(6.18));
        assert_eq!(carrier_offset_ppm(1882.0, 0.0), None);
    }

    #[test]
    fn ties_round_to_even() {
        // 50 Hz / 400 MHz = 0.125 ppm exactly
        assert_eq!(carrier_offset_ppm(50.0, 400.0), Some(0.12));
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-0.125, 2), -0.12);
    }

    #[test]
    fn dimension_record() {
        let dim = dimension_parameters(&dimension_set("acqus", "1H")).unwrap();
        assert_eq!(
            dim,
            DimensionParameters {
                nucleus: "1H".into(),
                spectral_width: 20.03,
                carrier_offset: 4.70,
                increments: 65536,
            }
        );
    }

    #[test]
    fn general_record() {
        let general = general_parameters(&primary_set(), 1, &utc()).unwrap();
        assert_eq!(
            general.acquisition_date,
            NaiveDate::from_ymd_opt(2020, 9, 13).unwrap()
        );
        assert_eq!(general.acquisition_date_label, "2020-09-13");
        assert_eq!(general.pulse_program, "zg30");
        assert_eq!(general.dimension_count, 1);
        assert_eq!(general.scan_count, 16);
        assert_eq!(general.temperature, 25.0);
    }

    #[test]
    fn missing_register_names_it() {
        let mut set = primary_set();
        set.values.remove("TE");
        let err = general_parameters(&set, 1, &utc()).unwrap_err();
        assert_eq!(err.to_string(), "missing parameter 'TE' in 'acqus'");
        assert!(err.is_recoverable());
    }

    #[test]
    fn zero_reference_frequency_is_invalid() {
        let mut set = dimension_set("acqu2s", "13C");
        set.insert("SFO1", ParamValue::Integer(0));
        assert!(matches!(
            dimension_parameters(&set),
            Err(SummaryError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn two_dimensions_give_direct_and_indirect() {
        let raw = raw(vec![primary_set(), dimension_set("acqu2s", "13C")]);
        let dims = classify(&raw);
        let params = acquisition_parameters(&raw, &dims, &utc()).unwrap();
        assert_eq!(params.dimension_count(), 2);
        assert_eq!(params.direct.unwrap().nucleus, "1H");
        assert_eq!(params.indirect.unwrap().nucleus, "13C");
    }

    #[test]
    fn no_acquisition_sections_give_an_empty_record() {
        let raw = raw(vec![ParameterSet::new("procs")]);
        let dims = classify(&raw);
        let params = acquisition_parameters(&raw, &dims, &utc()).unwrap();
        assert_eq!(params, AcquisitionParameters::default());
        assert_eq!(params.dimension_count(), 0);
    }
}
