//! The subset of rows a render works with.

use geo::{Centroid, MultiPolygon, Point};
use pricing_map_models::{Criterion, ValueRange};

use crate::{Municipality, value_range};

/// Square metres per hectare.
const M2_PER_HECTARE: f64 = 10_000.0;

/// Rows that passed the current filters, borrowed from the dataset.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    criterion: Criterion,
    rows: Vec<&'a Municipality>,
}

impl<'a> FilteredView<'a> {
    #[must_use]
    pub const fn new(criterion: Criterion, rows: Vec<&'a Municipality>) -> Self {
        Self { criterion, rows }
    }

    /// Criterion the view was filtered by.
    #[must_use]
    pub const fn criterion(&self) -> Criterion {
        self.criterion
    }

    #[must_use]
    pub fn rows(&self) -> &[&'a Municipality] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `criterion` for every row, in row order.
    #[must_use]
    pub fn values(&self, criterion: Criterion) -> Vec<f64> {
        self.rows.iter().map(|m| m.record.value(criterion)).collect()
    }

    /// `[min, max]` of the view's criterion over the filtered rows (not
    /// the slider bounds).
    #[must_use]
    pub fn value_range(&self) -> Option<ValueRange> {
        value_range(self.rows.iter().map(|m| m.record.value(self.criterion)))
    }

    /// Area-weighted centroid of all filtered polygons combined.
    #[must_use]
    pub fn centroid(&self) -> Option<Point<f64>> {
        let combined: MultiPolygon<f64> = self
            .rows
            .iter()
            .flat_map(|m| m.geometry.0.iter().cloned())
            .collect();
        combined.centroid()
    }

    /// Sum of the measured polygon areas, in hectares.
    #[must_use]
    pub fn total_area_ha(&self) -> f64 {
        self.rows.iter().map(|m| m.area_m2).sum::<f64>() / M2_PER_HECTARE
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pricing_map_models::FilterState;

    use crate::fixtures;

    use super::*;

    fn filter(states: &[&str], criterion: Criterion, min: f64, max: f64) -> FilterState {
        FilterState {
            states: states.iter().map(ToString::to_string).collect(),
            criterion,
            range: ValueRange::new(min, max),
        }
    }

    #[test]
    fn slider_range_selects_rows_and_view_reports_data_bounds() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&filter(&["AL", "SE"], Criterion::NotaMedia, 4.0, 9.0));
        assert_eq!(view.values(Criterion::NotaMedia), vec![5.0, 8.0]);
        assert_eq!(view.value_range(), Some(ValueRange::new(5.0, 8.0)));
    }

    #[test]
    fn empty_state_selection_gives_empty_view() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&filter(&[], Criterion::NotaMedia, 0.0, 10.0));
        assert!(view.is_empty());
        assert_eq!(view.value_range(), None);
        assert_eq!(view.centroid(), None);
        assert_eq!(view.total_area_ha(), 0.0);
    }

    #[test]
    fn shrinking_filters_never_adds_rows() {
        let dataset = fixtures::dataset();
        let state_sets: [&[&str]; 3] = [&["AL", "SE"], &["AL"], &[]];
        let nested_ranges = [(0.0, 10.0), (2.0, 8.0), (3.0, 8.0), (5.0, 8.0), (5.0, 5.0)];

        let mut previous = usize::MAX;
        for states in state_sets {
            let count = dataset
                .filter(&filter(states, Criterion::NotaMedia, 0.0, 10.0))
                .len();
            assert!(count <= previous, "{states:?} grew the view");
            previous = count;
        }

        let mut previous = usize::MAX;
        for (min, max) in nested_ranges {
            let count = dataset
                .filter(&FilterState {
                    states: BTreeSet::from(["AL".to_string(), "SE".to_string()]),
                    criterion: Criterion::NotaMedia,
                    range: ValueRange::new(min, max),
                })
                .len();
            assert!(count <= previous, "[{min}, {max}] grew the view");
            previous = count;
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn centroid_lies_within_filtered_extent() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&filter(&["AL"], Criterion::NotaMedia, 0.0, 10.0));
        let centroid = view.centroid().unwrap();
        assert!((-37.9..=-36.2).contains(&centroid.x()));
        assert!((-9.7..=-9.2).contains(&centroid.y()));
    }

    #[test]
    fn total_area_in_hectares() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&dataset.default_filter());
        let expected: f64 = dataset.municipalities().iter().map(|m| m.area_m2).sum();
        assert!((view.total_area_ha() - expected / 10_000.0).abs() < 1e-6);
    }
}
