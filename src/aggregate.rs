use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::config::{ExperimentOrder, Settings};
use crate::data::classify::{classify, DIRECT_SECTION};
use crate::data::filter::apply_window;
use crate::data::loader::{load_experiment, load_processed_1d};
use crate::data::model::{Dataset, Experiment, RawExperiment, SkippedExperiment};
use crate::data::normalize::acquisition_parameters;
use crate::data::spectrum::build_trace;
use crate::error::{Result, SummaryError};
use crate::export::{trace_file_name, write_trace_csv};
use crate::plot::{PlotRequest, TracePlotter};

/// Outcome of summarising one experiment subdirectory.
pub type ExperimentOutcome = std::result::Result<Experiment, SkippedExperiment>;

/// Dataset name: the last component of the dataset path.
pub fn dataset_name(root: &Path) -> Result<String> {
    let named = match root.file_name() {
        Some(name) => PathBuf::from(name),
        None => root.canonicalize()?,
    };
    named
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(SummaryError::FatalInput {
            path: root.to_path_buf(),
            reason: "has no usable name",
        })
}

/// Summarise every experiment subdirectory of a dataset.
///
/// Subdirectories that are not readable experiments are recorded in
/// `Dataset::skipped` with a warning; only a missing or non-directory root
/// fails the whole run.
pub fn summarize_dataset(
    root: &Path,
    settings: &Settings,
    plotter: &dyn TracePlotter,
) -> Result<Dataset> {
    if !root.exists() {
        return Err(SummaryError::FatalInput {
            path: root.to_path_buf(),
            reason: "does not exist",
        });
    }
    if !root.is_dir() {
        return Err(SummaryError::FatalInput {
            path: root.to_path_buf(),
            reason: "is not a directory",
        });
    }

    let mut dataset = Dataset::new(&dataset_name(root)?);

    let entries = std::fs::read_dir(root)?.map(|entry| entry.map(|e| e.path()));
    for path in experiment_dirs(entries) {
        match summarize_experiment(&path, &dataset.name, settings, plotter) {
            Ok(experiment) => {
                info!("experiment {} summarised", experiment.number);
                dataset.experiments.push(experiment);
            }
            Err(skipped) => {
                warn!(
                    "'{}' has no readable NMR data so ignoring the folder ({})",
                    skipped.path.display(),
                    skipped.reason
                );
                dataset.skipped.push(skipped);
            }
        }
    }

    if settings.order == ExperimentOrder::Numeric {
        dataset.experiments.sort_by_key(|e| e.number);
    }
    Ok(dataset)
}

/// Directories among the listed entries, in listing order. An entry that
/// cannot be read is logged and passed over.
fn experiment_dirs(entries: impl Iterator<Item = std::io::Result<PathBuf>>) -> Vec<PathBuf> {
    entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("ignoring unreadable directory entry: {e}");
                None
            }
        })
        .filter(|path| path.is_dir())
        .collect()
}

/// Summarise one experiment subdirectory, converting any recoverable
/// failure into a skip record.
pub fn summarize_experiment(
    dir: &Path,
    dataset: &str,
    settings: &Settings,
    plotter: &dyn TracePlotter,
) -> ExperimentOutcome {
    let skip = |reason: String| SkippedExperiment {
        path: dir.to_path_buf(),
        reason,
    };

    let number = dir
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| skip("folder name is not an experiment number".into()))?;

    build_experiment(dir, number, dataset, settings, plotter).map_err(|e| {
        if !e.is_recoverable() {
            error!("{}: unexpected failure: {e}", dir.display());
        }
        skip(e.to_string())
    })
}

fn build_experiment(
    dir: &Path,
    number: u32,
    dataset: &str,
    settings: &Settings,
    plotter: &dyn TracePlotter,
) -> Result<Experiment> {
    let raw = load_experiment(dir)?;
    let dims = classify(&raw);
    debug!("{}: {} dimension(s) {:?}", dir.display(), dims.count(), dims.keys);

    let mut parameters = acquisition_parameters(&raw, &dims, &settings.dates)?;
    if parameters.dimension_count() == 0 {
        info!("{}: no acquisition parameters found", dir.display());
    }

    if dims.count() == 1 {
        let nucleus = parameters
            .direct
            .as_ref()
            .map_or("", |d| d.nucleus.as_str())
            .to_string();
        parameters.plot_file = plot_1d(&raw, number, dataset, &nucleus, settings, plotter)?;
    }

    Ok(Experiment { number, parameters })
}

/// Reconstruct, window and plot a 1D spectrum.
///
/// Missing processed data fails the experiment; a failed or empty plot
/// only leaves the plot reference unset.
fn plot_1d(
    raw: &RawExperiment,
    number: u32,
    dataset: &str,
    nucleus: &str,
    settings: &Settings,
    plotter: &dyn TracePlotter,
) -> Result<Option<String>> {
    let acqus = raw
        .section(DIRECT_SECTION)
        .ok_or_else(|| SummaryError::missing(DIRECT_SECTION, "SW"))?;
    let procs = raw
        .section("procs")
        .ok_or_else(|| SummaryError::unreadable(&raw.path, "no processed data (pdata/1/procs)"))?;

    let spectral_width = acqus.require_f64("SW")?;
    let calibration = procs.require_f64("ABSF2")?;
    let intensity = load_processed_1d(&raw.path, procs)?;

    let trace = apply_window(
        &build_trace(spectral_width, intensity, calibration),
        &settings.window,
    );
    if trace.is_empty() {
        info!(
            "experiment {number}: no points between {} and {} ppm, not plotting",
            settings.window.x_min, settings.window.x_max
        );
        return Ok(None);
    }

    if settings.export_traces {
        let path = settings.output_dir.join(trace_file_name(dataset, number));
        match write_trace_csv(&trace, &path) {
            Ok(()) => info!("wrote {}", path.display()),
            Err(e) => warn!("experiment {number}: trace export failed: {e:#}"),
        }
    }

    debug!("experiment {number}: plotting {} points", trace.len());
    let request = PlotRequest {
        dataset,
        experiment: number,
        nucleus,
        trace: &trace,
    };
    match plotter.plot(&request, &settings.output_dir) {
        Ok(file) => {
            info!("wrote {file}");
            Ok(Some(file))
        }
        Err(e) => {
            warn!("experiment {number}: {e}");
            Ok(None)
        }
    }
}
