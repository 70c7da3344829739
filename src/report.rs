use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::model::{Dataset, DimensionParameters, Experiment, GeneralParameters};

// ---------------------------------------------------------------------------
// HTML report
// ---------------------------------------------------------------------------

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; color: #222; }
h1 { border-bottom: 2px solid #4a6fa5; }
section { margin-bottom: 2.5em; }
table { border-collapse: collapse; margin: 0.5em 0; }
th, td { border: 1px solid #ccc; padding: 0.25em 0.75em; text-align: left; }
th { background: #eef2f8; }
img { max-width: 100%; }
.skipped { color: #a33; }";

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the dataset record as a standalone HTML document.
pub fn render_html(dataset: &Dataset) -> String {
    let name = escape_html(&dataset.name);
    let mut html = String::new();

    // `write!` into a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{name}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n\
         <h1>Dataset {name}</h1>\n<p>{} experiment(s)</p>\n",
        dataset.experiments.len()
    );

    for experiment in &dataset.experiments {
        render_experiment(&mut html, experiment);
    }

    if !dataset.skipped.is_empty() {
        html.push_str("<section class=\"skipped\">\n<h2>Skipped folders</h2>\n<ul>\n");
        for skipped in &dataset.skipped {
            let _ = writeln!(
                html,
                "<li><code>{}</code>: {}</li>",
                escape_html(&skipped.path.display().to_string()),
                escape_html(&skipped.reason)
            );
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_experiment(html: &mut String, experiment: &Experiment) {
    let params = &experiment.parameters;
    let _ = writeln!(
        html,
        "<section id=\"exp{0}\">\n<h2>Experiment {0}</h2>",
        experiment.number
    );

    match &params.general {
        Some(general) => render_general(html, general),
        None => html.push_str("<p>No acquisition parameters found.</p>\n"),
    }
    if let Some(direct) = &params.direct {
        render_dimension(html, "Direct dimension", direct);
    }
    if let Some(indirect) = &params.indirect {
        render_dimension(html, "Indirect dimension", indirect);
    }
    if let Some(plot) = &params.plot_file {
        let src = escape_html(plot);
        let _ = writeln!(
            html,
            "<img src=\"{src}\" alt=\"spectrum of experiment {}\">",
            experiment.number
        );
    }

    html.push_str("</section>\n");
}

fn render_rows(html: &mut String, caption: &str, rows: &[(&str, String)]) {
    let _ = writeln!(html, "<table>\n<caption>{}</caption>", escape_html(caption));
    for (label, value) in rows {
        let _ = writeln!(
            html,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(label),
            escape_html(value)
        );
    }
    html.push_str("</table>\n");
}

fn render_general(html: &mut String, general: &GeneralParameters) {
    render_rows(
        html,
        "General parameters",
        &[
            ("acquisition date", general.acquisition_date_label.clone()),
            ("pulse program", general.pulse_program.clone()),
            ("number of dimensions", general.dimension_count.to_string()),
            ("number of scans", general.scan_count.to_string()),
            ("temperature", format!("{:.1} °C", general.temperature)),
        ],
    );
}

fn render_dimension(html: &mut String, caption: &str, dim: &DimensionParameters) {
    render_rows(
        html,
        caption,
        &[
            ("nucleus", dim.nucleus.clone()),
            ("spectral width", format!("{:.2}", dim.spectral_width)),
            ("carrier offset", format!("{:.2} ppm", dim.carrier_offset)),
            ("number of increments", dim.increments.to_string()),
        ],
    );
}

/// Write `<output_dir>/<dataset name>.html`.
pub fn write_report(dataset: &Dataset, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.html", dataset.name));
    std::fs::write(&path, render_html(dataset))
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(path)
}
