mod aggregate;
mod config;
mod data;
mod error;
mod export;
mod plot;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use config::{DateConfig, ExperimentOrder, Settings, ShiftWindow, TimestampZone};
use plot::PngPlotter;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "nmr-summary")]
#[command(about = "Parse experimental information from an NMR dataset directory")]
#[command(version)]
struct Args {
    /// Dataset directory whose numbered subdirectories are experiments
    dataset_path: PathBuf,

    /// Maximum chemical shift (ppm) kept in 1D plots
    #[arg(long, default_value_t = 24.0, allow_hyphen_values = true)]
    xmax: f64,

    /// Minimum chemical shift (ppm) kept in 1D plots
    #[arg(long, default_value_t = -5.0, allow_hyphen_values = true)]
    xmin: f64,

    /// Directory for plots, trace tables and the report
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Time zone of the acquisition timestamps: local, utc or +HH:MM
    #[arg(long, env = "NMR_SUMMARY_TZ", default_value = "local", allow_hyphen_values = true)]
    timezone: TimestampZone,

    /// strftime pattern for acquisition dates
    #[arg(long, default_value = "%Y-%m-%d")]
    date_format: String,

    /// Order of experiments in the report
    #[arg(long, value_enum, default_value_t = ExperimentOrder::Numeric)]
    order: ExperimentOrder,

    /// Also write each windowed 1D trace as CSV
    #[arg(long)]
    export_traces: bool,

    /// Also write the dataset summary as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        Ok(Settings {
            window: ShiftWindow::new(self.xmin, self.xmax)?,
            dates: DateConfig::new(self.timezone, &self.date_format)?,
            order: self.order,
            output_dir: self.output_dir.clone(),
            export_traces: self.export_traces,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = args.settings()?;
    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating {}", settings.output_dir.display()))?;

    let dataset = aggregate::summarize_dataset(&args.dataset_path, &settings, &PngPlotter::default())
        .with_context(|| format!("summarising {}", args.dataset_path.display()))?;
    if dataset.is_empty() {
        warn!("{}: no experiment could be summarised", dataset.name);
    } else {
        info!(
            "{}: {} experiment(s) summarised, {} skipped",
            dataset.name,
            dataset.len(),
            dataset.skipped.len()
        );
    }

    let report = report::write_report(&dataset, &settings.output_dir)?;
    info!("wrote {}", report.display());

    if args.json {
        let json = export::write_json(&dataset, &settings.output_dir)?;
        info!("wrote {}", json.display());
    }

    Ok(())
}
