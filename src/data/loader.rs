use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use super::model::{ParamValue, ParameterSet, RawExperiment};
use crate::error::{Result, SummaryError};

/// Parameter files searched for in an experiment directory, in order.
const ACQUISITION_FILES: [&str; 4] = ["acqus", "acqu2s", "acqu3s", "acqu4s"];

/// First processed-data set, relative to the experiment directory.
const PDATA_DIR: &str = "pdata/1";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read every parameter file of an experiment directory.
///
/// `acqus` and a raw data file (`fid` for 1D, `ser` otherwise) must exist;
/// anything less is not instrument data. `acqu2s`..`acqu4s` and
/// `pdata/1/procs` are picked up when present.
pub fn load_experiment(dir: &Path) -> Result<RawExperiment> {
    if !dir.join("acqus").is_file() {
        return Err(SummaryError::unreadable(dir, "no acqus file"));
    }
    if !dir.join("fid").is_file() && !dir.join("ser").is_file() {
        return Err(SummaryError::unreadable(dir, "no fid or ser file"));
    }

    let mut sections = BTreeMap::new();
    for name in ACQUISITION_FILES {
        let path = dir.join(name);
        if path.is_file() {
            sections.insert(name.to_string(), read_parameter_file(&path, name)?);
        }
    }

    let procs = dir.join(PDATA_DIR).join("procs");
    if procs.is_file() {
        sections.insert("procs".to_string(), read_parameter_file(&procs, "procs")?);
    }

    debug!(
        "read {} parameter files from {}",
        sections.len(),
        dir.display()
    );
    Ok(RawExperiment {
        path: dir.to_path_buf(),
        sections,
    })
}

/// Read the real part of the first processed 1D spectrum (`pdata/1/1r`).
///
/// Sample layout follows `procs`: `DTYPP` 0 = 32-bit integers, 2 = 64-bit
/// floats; `BYTORDP` 0 = little endian, 1 = big endian. Integer samples are
/// scaled by `2^NC_proc`.
pub fn load_processed_1d(dir: &Path, procs: &ParameterSet) -> Result<Vec<f64>> {
    let path = dir.join(PDATA_DIR).join("1r");
    let bytes = std::fs::read(&path)
        .map_err(|e| SummaryError::unreadable(dir, format!("cannot read {}: {e}", path.display())))?;

    let big_endian = procs.i64_or("BYTORDP", 0) == 1;
    let samples = match procs.i64_or("DTYPP", 0) {
        0 => decode_i32(&bytes, big_endian)
            .ok_or_else(|| SummaryError::unreadable(dir, "1r length is not a multiple of 4"))?,
        2 => decode_f64(&bytes, big_endian)
            .ok_or_else(|| SummaryError::unreadable(dir, "1r length is not a multiple of 8"))?,
        _ => return Err(SummaryError::invalid("procs", "DTYPP", "0 or 2")),
    };

    if samples.is_empty() {
        return Err(SummaryError::unreadable(dir, "1r holds no samples"));
    }

    let exponent = i32::try_from(procs.i64_or("NC_proc", 0))
        .map_err(|_| SummaryError::invalid("procs", "NC_proc", "a 32-bit exponent"))?;
    let scale = 2f64.powi(exponent);
    Ok(samples.into_iter().map(|v| v * scale).collect())
}

fn decode_i32(bytes: &[u8], big_endian: bool) -> Option<Vec<f64>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| {
                let raw = [c[0], c[1], c[2], c[3]];
                let v = if big_endian {
                    i32::from_be_bytes(raw)
                } else {
                    i32::from_le_bytes(raw)
                };
                v as f64
            })
            .collect(),
    )
}

fn decode_f64(bytes: &[u8], big_endian: bool) -> Option<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(8)
            .map(|c| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(c);
                if big_endian {
                    f64::from_be_bytes(raw)
                } else {
                    f64::from_le_bytes(raw)
                }
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// JCAMP-DX parameter files
// ---------------------------------------------------------------------------

fn read_parameter_file(path: &Path, section: &str) -> Result<ParameterSet> {
    let bytes = std::fs::read(path)
        .map_err(|e| SummaryError::unreadable(path, format!("cannot read {section}: {e}")))?;
    // Parameter files are nominally ASCII but often carry Latin-1 in titles.
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_parameters(&text, section))
}

/// Parse the text of a JCAMP-DX parameter file.
///
/// ```text
/// ##$SW= 20.0254          scalar
/// ##$NUC1= <1H>           string
/// ##$D= (0..63)           array header, values follow on the next lines
/// 0 0.1 0 0 ...
/// $$ comment
/// ```
///
/// Core records (`##TITLE=`) are kept under their bare name; `$` is
/// stripped from private records. Malformed lines are ignored.
pub fn parse_parameters(text: &str, section: &str) -> ParameterSet {
    let mut set = ParameterSet::new(section);
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(record) = line.strip_prefix("##") else {
            continue;
        };
        let Some((key, value)) = record.split_once('=') else {
            continue;
        };
        let key = key.trim().trim_start_matches('$');
        if key.is_empty() || key == "END" {
            continue;
        }
        let value = value.trim();

        if value.starts_with('(') && value.contains("..") {
            let mut body = String::new();
            while let Some(next) = lines.peek() {
                if next.starts_with("##") || next.starts_with("$$") {
                    break;
                }
                body.push_str(next);
                body.push(' ');
                lines.next();
            }
            set.insert(key, ParamValue::Array(parse_array(&body)));
        } else if value.starts_with('<') && !value.ends_with('>') {
            // string continued on following lines
            let mut text = value.to_string();
            while let Some(next) = lines.next() {
                text.push('\n');
                text.push_str(next);
                if next.trim_end().ends_with('>') {
                    break;
                }
            }
            set.insert(key, parse_scalar(&text));
        } else {
            set.insert(key, parse_scalar(value));
        }
    }

    set
}

fn parse_scalar(token: &str) -> ParamValue {
    let token = token.trim();
    if let Some(inner) = token.strip_prefix('<') {
        return ParamValue::Text(inner.strip_suffix('>').unwrap_or(inner).to_string());
    }
    if let Ok(i) = token.parse::<i64>() {
        return ParamValue::Integer(i);
    }
    if let Ok(f) = token.parse::<f64>() {
        return ParamValue::Float(f);
    }
    ParamValue::Text(token.to_string())
}

/// Split an array body into values, keeping `<...>` strings intact.
fn parse_array(body: &str) -> Vec<ParamValue> {
    let mut items = Vec::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('<') {
            let end = inner.find('>').unwrap_or(inner.len());
            items.push(ParamValue::Text(inner[..end].to_string()));
            rest = inner.get(end + 1..).unwrap_or("").trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            items.push(parse_scalar(&rest[..end]));
            rest = rest[end..].trim_start();
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACQUS: &str = "\
##TITLE= Parameter file, TopSpin 3.6.2
##JCAMPDX= 5.0
##DATATYPE= Parameter Values
$$ /opt/data/nmr/sucrose/1/acqus
##$DATE= 1600000000
##$NS= 16
##$NUC1= <1H>
##$PULPROG= <zg30>
##$SW= 20.0254
##$D= (0..3)
0 0.1 2e-05
0
##$AUNM= <au_zg
 continued>
##$NUCLEI= (0..1)
<1H> <off>
##END=
";

    #[test]
    fn parses_scalars_strings_and_arrays() {
        let set = parse_parameters(ACQUS, "acqus");
        assert_eq!(set.section, "acqus");
        assert_eq!(set.get("DATE"), Some(&ParamValue::Integer(1_600_000_000)));
        assert_eq!(set.get("NS"), Some(&ParamValue::Integer(16)));
        assert_eq!(set.get("NUC1"), Some(&ParamValue::Text("1H".into())));
        assert_eq!(set.get("SW"), Some(&ParamValue::Float(20.0254)));
        assert_eq!(
            set.get("D"),
            Some(&ParamValue::Array(vec![
                ParamValue::Integer(0),
                ParamValue::Float(0.1),
                ParamValue::Float(2e-5),
                ParamValue::Integer(0),
            ]))
        );
        assert_eq!(
            set.get("NUCLEI"),
            Some(&ParamValue::Array(vec![
                ParamValue::Text("1H".into()),
                ParamValue::Text("off".into()),
            ]))
        );
        assert_eq!(
            set.get("AUNM"),
            Some(&ParamValue::Text("au_zg\n continued".into()))
        );
        assert!(set.get("END").is_none());
        assert!(set.get("TITLE").is_some());
    }

    #[test]
    fn decodes_scaled_little_endian_integers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdata = dir.path().join(PDATA_DIR);
        std::fs::create_dir_all(&pdata).unwrap();
        let bytes: Vec<u8> = [1i32, -2, 3]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        std::fs::write(pdata.join("1r"), bytes).unwrap();

        let mut procs = ParameterSet::new("procs");
        procs.insert("NC_proc", ParamValue::Integer(2));
        let data = load_processed_1d(dir.path(), &procs).unwrap();
        assert_eq!(data, vec![4.0, -8.0, 12.0]);
    }

    #[test]
    fn decodes_big_endian_floats() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdata = dir.path().join(PDATA_DIR);
        std::fs::create_dir_all(&pdata).unwrap();
        let bytes: Vec<u8> = [0.5f64, 1.5].iter().flat_map(|v| v.to_be_bytes()).collect();
        std::fs::write(pdata.join("1r"), bytes).unwrap();

        let mut procs = ParameterSet::new("procs");
        procs.insert("DTYPP", ParamValue::Integer(2));
        procs.insert("BYTORDP", ParamValue::Integer(1));
        let data = load_processed_1d(dir.path(), &procs).unwrap();
        assert_eq!(data, vec![0.5, 1.5]);
    }

    #[test]
    fn oversized_scaling_exponent_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdata = dir.path().join(PDATA_DIR);
        std::fs::create_dir_all(&pdata).unwrap();
        std::fs::write(pdata.join("1r"), 1i32.to_le_bytes()).unwrap();

        let mut procs = ParameterSet::new("procs");
        procs.insert("NC_proc", ParamValue::Integer(1 << 40));
        let err = load_processed_1d(dir.path(), &procs).unwrap_err();
        assert!(matches!(err, SummaryError::InvalidParameter { ref key, .. } if key == "NC_proc"));
    }

    #[test]
    fn truncated_spectrum_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdata = dir.path().join(PDATA_DIR);
        std::fs::create_dir_all(&pdata).unwrap();
        std::fs::write(pdata.join("1r"), [0u8; 6]).unwrap();

        let err = load_processed_1d(dir.path(), &ParameterSet::new("procs")).unwrap_err();
        assert!(matches!(err, SummaryError::UnreadableExperiment { .. }));
    }

    #[test]
    fn directory_without_acqus_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), "not nmr").unwrap();
        let err = load_experiment(dir.path()).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("no acqus file"));
    }

    #[test]
    fn directory_without_raw_data_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("acqus"), ACQUS).unwrap();
        let err = load_experiment(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no fid or ser file"));
    }

    #[test]
    fn picks_up_indirect_and_processing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("acqus"), ACQUS).unwrap();
        std::fs::write(dir.path().join("acqu2s"), "##$NUC1= <13C>\n##END=\n").unwrap();
        std::fs::write(dir.path().join("ser"), [0u8; 8]).unwrap();
        std::fs::create_dir_all(dir.path().join(PDATA_DIR)).unwrap();
        std::fs::write(
            dir.path().join(PDATA_DIR).join("procs"),
            "##$ABSF2= -0.5\n##END=\n",
        )
        .unwrap();

        let raw = load_experiment(dir.path()).unwrap();
        let names: Vec<&str> = raw.sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["acqu2s", "acqus", "procs"]);
        assert_eq!(
            raw.section("procs").unwrap().get("ABSF2"),
            Some(&ParamValue::Float(-0.5))
        );
    }
}
