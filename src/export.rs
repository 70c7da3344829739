use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::model::{Dataset, SpectralTrace};

/// File name of the exported trace table for one experiment.
pub fn trace_file_name(dataset: &str, experiment: u32) -> String {
    format!("trace_1d_{dataset}_exp{experiment}.csv")
}

/// Write a windowed trace as a `chemical_shift,intensity` table.
pub fn write_trace_csv(trace: &SpectralTrace, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer
        .write_record(["chemical_shift", "intensity"])
        .context("writing CSV header")?;
    for (shift, intensity) in trace.points() {
        writer
            .write_record([shift.to_string(), intensity.to_string()])
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Dump the dataset record as pretty JSON to `<output_dir>/<name>.json`.
pub fn write_json(dataset: &Dataset, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.json", dataset.name));
    let text = serde_json::to_string_pretty(dataset).context("serialising dataset")?;
    std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
