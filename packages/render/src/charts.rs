//! Inline SVG charts: histograms and grouped box plots.
//!
//! Both are drawn with `plotters` into an in-memory [`SVGBackend`] and
//! embedded in the page as-is.

use plotters::coord::Shift;
use plotters::prelude::{
    ChartBuilder, Circle, Color, DrawingArea, DrawingAreaErrorKind, IntoDrawingArea, IntoFont,
    PathElement, RGBColor, Rectangle, SVGBackend, WHITE,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use pricing_map_models::{BoxPlot, Histogram};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 300;
const BAR: RGBColor = RGBColor(0x00, 0x61, 0x99);
const BOX_FILL: RGBColor = RGBColor(0x9e, 0xca, 0xe1);
const LABEL: RGBColor = RGBColor(0x4b, 0x55, 0x63);
const FONT: &str = "sans-serif";

/// Placeholder drawn when the filtered view has no values.
pub const NO_DATA: &str = "Sem dados para os filtros selecionados";

type DrawResult = Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// Runs `draw` on a white canvas and returns the SVG document.
///
/// A drawing failure is logged and whatever was drawn so far is kept.
fn render(
    title: &str,
    draw: impl FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
) -> String {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        let result = root
            .fill(&WHITE)
            .and_then(|()| draw(&root))
            .and_then(|()| root.present());
        if let Err(e) = result {
            log::warn!("Failed to render chart '{title}': {e}");
        }
    }
    svg.replacen("<svg ", "<svg class=\"chart\" ", 1)
}

fn no_data(root: &DrawingArea<SVGBackend<'_>, Shift>, title: &str) -> DrawResult {
    let centered = Pos::new(HPos::Center, VPos::Center);
    let half_width = i32::try_from(WIDTH / 2).unwrap_or_default();
    root.draw_text(
        title,
        &(FONT, 16).into_font().color(&LABEL).pos(centered),
        (half_width, 24),
    )?;
    root.draw_text(
        NO_DATA,
        &(FONT, 13).into_font().color(&LABEL).pos(centered),
        (half_width, i32::try_from(HEIGHT / 2).unwrap_or_default()),
    )
}

/// Histogram with one filled bar per non-empty bin.
///
/// `label` formats the x-axis ticks.
pub fn histogram_svg(
    histogram: &Histogram,
    title: &str,
    x_caption: &str,
    label: impl Fn(f64) -> String,
) -> String {
    let (Some(first), Some(last)) = (histogram.bins.first(), histogram.bins.last()) else {
        return render(title, |root| no_data(root, title));
    };

    // A single distinct value yields a zero-width bin.
    let pad = if last.end > first.start {
        0.0
    } else {
        (first.start.abs() * 0.05).max(0.5)
    };
    #[allow(clippy::cast_precision_loss)]
    let top = histogram.max_count().max(1) as f64 * 1.1;

    render(title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 16))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((first.start - pad)..(last.end + pad), 0.0..top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(6)
            .y_labels(5)
            .x_desc(x_caption)
            .y_desc("Contagem")
            .label_style((FONT, 11, &LABEL))
            .x_label_formatter(&|x| label(*x))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        chart.draw_series(histogram.bins.iter().filter(|b| b.count > 0).map(|bin| {
            let (start, end) = if bin.end > bin.start {
                (bin.start, bin.end)
            } else {
                (bin.start - pad, bin.end + pad)
            };
            #[allow(clippy::cast_precision_loss)]
            let count = bin.count as f64;
            Rectangle::new([(start, 0.0), (end, count)], BAR.mix(0.85).filled())
        }))?;

        Ok(())
    })
}

/// Box plots side by side, one per group, sharing the vertical scale.
///
/// Whiskers, quartiles and outliers come precomputed in each [`BoxPlot`].
pub fn box_plot_svg(
    plots: &[BoxPlot],
    title: &str,
    x_caption: &str,
    label: impl Fn(f64) -> String,
) -> String {
    let (low, high) = plots
        .iter()
        .flat_map(|p| {
            [p.lower_whisker, p.upper_whisker]
                .into_iter()
                .chain(p.outliers.iter().copied())
        })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if plots.is_empty() || !low.is_finite() {
        return render(title, |root| no_data(root, title));
    }
    let pad = if high > low { (high - low) * 0.05 } else { 1.0 };
    #[allow(clippy::cast_precision_loss)]
    let groups = plots.len() as f64;
    let half = 0.2;

    render(title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 16))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(-0.5..(groups - 0.5), (low - pad)..(high + pad))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_labels(5)
            .x_desc(x_caption)
            .label_style((FONT, 11, &LABEL))
            .x_label_formatter(&|_| String::new())
            .y_label_formatter(&|y| label(*y))
            .draw()?;

        let centers: Vec<(f64, &BoxPlot)> = plots
            .iter()
            .enumerate()
            .map(|(i, plot)| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64;
                (x, plot)
            })
            .collect();

        chart.draw_series(centers.iter().map(|(x, p)| {
            Rectangle::new([(x - half, p.q1), (x + half, p.q3)], BOX_FILL.filled())
        }))?;
        chart.draw_series(centers.iter().map(|(x, p)| {
            Rectangle::new([(x - half, p.q1), (x + half, p.q3)], BAR.stroke_width(1))
        }))?;
        chart.draw_series(centers.iter().flat_map(|(x, p)| {
            let cap = half / 2.0;
            [
                PathElement::new(vec![(*x, p.lower_whisker), (*x, p.q1)], BAR.stroke_width(1)),
                PathElement::new(vec![(*x, p.q3), (*x, p.upper_whisker)], BAR.stroke_width(1)),
                PathElement::new(
                    vec![(x - cap, p.lower_whisker), (x + cap, p.lower_whisker)],
                    BAR.stroke_width(1),
                ),
                PathElement::new(
                    vec![(x - cap, p.upper_whisker), (x + cap, p.upper_whisker)],
                    BAR.stroke_width(1),
                ),
                PathElement::new(
                    vec![(x - half, p.median), (x + half, p.median)],
                    BAR.stroke_width(2),
                ),
            ]
        }))?;
        chart.draw_series(centers.iter().flat_map(|(x, p)| {
            p.outliers
                .iter()
                .map(move |o| Circle::new((*x, *o), 3, BAR.stroke_width(1)))
        }))?;

        let group_style = (FONT, 12)
            .into_font()
            .color(&LABEL)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (x, plot) in &centers {
            let (px, py) = chart.backend_coord(&(*x, low - pad));
            root.draw_text(&plot.group, &group_style, (px, py + 6))?;
        }

        Ok(())
    })
}
