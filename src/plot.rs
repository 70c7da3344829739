use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::data::model::SpectralTrace;
use crate::error::{Result, SummaryError};

/// Margin added on both sides of the shift range, in ppm.
const X_PADDING: f64 = 0.1;

/// File name of the plot for one experiment of a dataset.
pub fn plot_file_name(dataset: &str, experiment: u32) -> String {
    format!("plot_1d_{dataset}_exp{experiment}.png")
}

/// What a plotter needs to draw one windowed 1D spectrum.
#[derive(Debug, Clone, Copy)]
pub struct PlotRequest<'a> {
    pub dataset: &'a str,
    pub experiment: u32,
    pub nucleus: &'a str,
    pub trace: &'a SpectralTrace,
}

/// Renders a spectrum to an image file and reports the file name.
pub trait TracePlotter {
    fn plot(&self, request: &PlotRequest<'_>, output_dir: &Path) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub line: RGBColor,
    pub line_width: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            background: WHITE,
            line: BLUE,
            line_width: 2,
        }
    }
}

/// PNG plotter drawing the shift axis descending left to right.
#[derive(Clone, Debug, Default)]
pub struct PngPlotter {
    pub style: PlotStyle,
}

impl TracePlotter for PngPlotter {
    fn plot(&self, request: &PlotRequest<'_>, output_dir: &Path) -> Result<String> {
        let file_name = plot_file_name(request.dataset, request.experiment);
        let buffer = render_trace(request, &self.style)?;
        let image = ImageBuffer::<Rgb<u8>, _>::from_raw(self.style.width, self.style.height, buffer)
            .ok_or_else(|| SummaryError::Plot("failed to allocate image buffer".into()))?;
        image.save_with_format(output_dir.join(&file_name), ImageFormat::Png)?;
        Ok(file_name)
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Draw into an RGB buffer. The x axis is plotted negated so that larger
/// shifts sit on the left; tick labels undo the negation.
fn render_trace(request: &PlotRequest<'_>, style: &PlotStyle) -> Result<Vec<u8>> {
    let trace = request.trace;
    if trace.is_empty() {
        return Err(SummaryError::Plot("trace has no points inside the window".into()));
    }

    let (shift_lo, shift_hi) = bounds(&trace.shift);
    let (y_lo, y_hi) = bounds(&trace.intensity);
    let (y_lo, y_hi) = if (y_hi - y_lo).abs() < f64::EPSILON {
        (y_lo - 1.0, y_hi + 1.0)
    } else {
        let pad = (y_hi - y_lo) * 0.05;
        (y_lo - pad, y_hi + pad)
    };

    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;

        let title = format!("{}-{}", request.dataset, request.experiment);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 20).into_font())
            .set_label_area_size(LabelAreaPosition::Left, 30)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(
                -(shift_hi + X_PADDING)..-(shift_lo - X_PADDING),
                y_lo..y_hi,
            )?;

        let x_desc = format!("{}, ppm", request.nucleus);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(x_desc)
            .y_desc("intensity")
            .x_label_formatter(&|x| format!("{:.1}", -*x + 0.0))
            .y_label_formatter(&|_| String::new())
            .draw()?;

        let series = trace.points().map(|(shift, intensity)| (-shift, intensity));
        chart.draw_series(LineSeries::new(
            series,
            style.line.stroke_width(style.line_width),
        ))?;

        root.present()?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_differ_per_experiment() {
        assert_eq!(plot_file_name("sucrose", 1), "plot_1d_sucrose_exp1.png");
        assert_ne!(plot_file_name("sucrose", 1), plot_file_name("sucrose", 2));
        assert_ne!(plot_file_name("a", 10), plot_file_name("a1", 0));
    }

    #[test]
    fn empty_trace_is_a_plot_error() {
        let trace = SpectralTrace::default();
        let request = PlotRequest {
            dataset: "d",
            experiment: 1,
            nucleus: "1H",
            trace: &trace,
        };
        let err = render_trace(&request, &PlotStyle::default()).unwrap_err();
        assert!(matches!(err, SummaryError::Plot(_)));
    }

    #[test]
    fn renders_png_under_the_experiment_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let trace = crate::data::spectrum::build_trace(8.0, vec![1.0, 5.0, 2.0, 0.5], -1.0);
        let request = PlotRequest {
            dataset: "sucrose",
            experiment: 3,
            nucleus: "1H",
            trace: &trace,
        };
        let file = PngPlotter::default().plot(&request, dir.path()).unwrap();

        assert_eq!(file, "plot_1d_sucrose_exp3.png");
        let bytes = std::fs::read(dir.path().join(&file)).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn bounds_of_values() {
        assert_eq!(bounds(&[3.0, -1.0, 2.0]), (-1.0, 3.0));
    }
}
