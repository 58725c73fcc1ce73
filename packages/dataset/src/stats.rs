//! Summary statistics, histograms and box plots over a [`FilteredView`].
//!
//! Every function here accepts an empty view and returns an empty or
//! `None`-valued result instead of dividing by zero.

use std::collections::BTreeMap;

use pricing_map_models::{
    BoxPlot, Criterion, CriterionSummary, GeneralSummary, Histogram, HistogramBin, Summary,
};

use crate::FilteredView;

/// Bar count of every histogram on the dashboard.
pub const HISTOGRAM_BINS: usize = 15;

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Count, min, mean and max of `values`, ignoring non-finite entries.
#[must_use]
pub fn summarize(values: &[f64]) -> Summary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Summary::default();
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    Summary {
        count: finite.len(),
        min: finite.iter().copied().reduce(f64::min),
        mean: Some(mean),
        max: finite.iter().copied().reduce(f64::max),
    }
}

/// Mean of `values`, or `None` when empty.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    summarize(values).mean
}

/// Splits `[min, max]` of `values` into `bin_count` equal-width bins.
///
/// When every value is equal a single bin holds them all; an empty input
/// has no bins.
#[must_use]
pub fn histogram(values: &[f64], bin_count: usize) -> Histogram {
    let summary = summarize(values);
    let (Some(min), Some(max)) = (summary.min, summary.max) else {
        return Histogram::default();
    };
    let finite = values.iter().copied().filter(|v| v.is_finite());

    if bin_count == 0 {
        return Histogram::default();
    }
    if max <= min {
        return Histogram {
            bins: vec![HistogramBin {
                start: min,
                end: max,
                count: summary.count,
            }],
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let start = (i as f64).mul_add(width, min);
            HistogramBin {
                start,
                end: if i + 1 == bin_count { max } else { start + width },
                count: 0,
            }
        })
        .collect();

    for value in finite {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (((value - min) / width).floor() as usize).min(bin_count - 1);
        bins[index].count += 1;
    }

    Histogram { bins }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let position = (sorted.len() - 1) as f64 * p;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - position.floor();
    fraction.mul_add(sorted[upper] - sorted[lower], sorted[lower])
}

/// Box plot of `values` labelled `group`, or `None` when empty.
#[must_use]
pub fn box_plot(group: &str, values: &[f64]) -> Option<BoxPlot> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let reach = WHISKER_IQR * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let inside = sorted
        .iter()
        .copied()
        .filter(|v| (low_fence..=high_fence).contains(v));
    let lower_whisker = inside.clone().reduce(f64::min).unwrap_or(q1);
    let upper_whisker = inside.reduce(f64::max).unwrap_or(q3);

    Some(BoxPlot {
        group: group.to_string(),
        count: sorted.len(),
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers: sorted
            .iter()
            .copied()
            .filter(|v| !(low_fence..=high_fence).contains(v))
            .collect(),
    })
}

/// Min/mean/max and histogram of the view's own criterion.
#[must_use]
pub fn criterion_summary(view: &FilteredView<'_>) -> CriterionSummary {
    let criterion = view.criterion();
    let values = view.values(criterion);
    CriterionSummary {
        criterion,
        summary: summarize(&values),
        histogram: histogram(&values, HISTOGRAM_BINS),
    }
}

/// `valor_medio` box plots grouped by state, ordered by state.
#[must_use]
pub fn valor_medio_by_state(view: &FilteredView<'_>) -> Vec<BoxPlot> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for m in view.rows() {
        groups
            .entry(m.record.state.as_str())
            .or_default()
            .push(m.record.derived.valor_medio);
    }
    groups
        .into_iter()
        .filter_map(|(state, values)| box_plot(state, &values))
        .collect()
}

/// Criterion-independent statistics for the general statistics tab.
#[must_use]
pub fn general_summary(view: &FilteredView<'_>) -> GeneralSummary {
    let nota_media = view.values(Criterion::NotaMedia);
    let perim = view.values(Criterion::ValorMunPerim);
    let area = view.values(Criterion::ValorMunArea);

    GeneralSummary {
        municipality_count: view.len(),
        total_area_ha: view.total_area_ha(),
        mean_nota_media: mean(&nota_media),
        mean_valor_mun_perim: mean(&perim),
        mean_valor_mun_area: mean(&area),
        sum_valor_mun_perim: perim.iter().sum(),
        sum_valor_mun_area: area.iter().sum(),
        nota_media_histogram: histogram(&nota_media, HISTOGRAM_BINS),
        valor_medio_by_state: valor_medio_by_state(view),
    }
}
