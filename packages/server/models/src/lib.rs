#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the pricing map server.
//!
//! Query parameters arrive as loose strings and optional numbers; they
//! are resolved here into a [`FilterState`] against the loaded dataset's
//! state list and criterion bounds.

use std::collections::BTreeSet;

use pricing_map_models::{Criterion, FilterState, Histogram, Summary, ValueRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving query parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The `criterion` parameter names no known column.
    #[error("Unknown criterion '{name}'")]
    UnknownCriterion {
        /// Value as received.
        name: String,
    },

    /// The `tab` parameter names no dashboard tab.
    #[error("Unknown tab '{name}'")]
    UnknownTab {
        /// Value as received.
        name: String,
    },

    /// A range bound is neither empty nor a number.
    #[error("Invalid {name} bound '{value}'")]
    InvalidBound {
        /// `min` or `max`.
        name: &'static str,
        /// Value as received.
        value: String,
    },
}

/// Filter query parameters shared by the dashboard and the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQueryParams {
    /// Dashboard tab (`intro`, `map`, `stats`, `table`). Ignored by the
    /// JSON API.
    pub tab: Option<String>,
    /// Comma-separated state abbreviations. Absent selects every state;
    /// present but empty selects none.
    pub ufs: Option<String>,
    /// Criterion column key, e.g. `nota_media`.
    pub criterion: Option<String>,
    /// Lower bound of the criterion range. Empty reads as absent.
    pub min: Option<String>,
    /// Upper bound of the criterion range. Empty reads as absent.
    pub max: Option<String>,
}

impl FilterQueryParams {
    /// Parses the `criterion` parameter, defaulting to the mean score.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::UnknownCriterion`] for an unrecognized key.
    pub fn criterion(&self) -> Result<Criterion, ParamsError> {
        match self.criterion.as_deref().map(str::trim) {
            None | Some("") => Ok(Criterion::default()),
            Some(name) => name.parse().map_err(|_| ParamsError::UnknownCriterion {
                name: name.to_string(),
            }),
        }
    }

    /// Selected states, restricted to those in `available`.
    #[must_use]
    pub fn states(&self, available: &[String]) -> BTreeSet<String> {
        self.ufs.as_deref().map_or_else(
            || available.iter().cloned().collect(),
            |s| {
                s.split(',')
                    .map(|uf| uf.trim().to_uppercase())
                    .filter(|uf| available.contains(uf))
                    .collect()
            },
        )
    }

    /// Resolves the parameters into a filter snapshot.
    ///
    /// `bounds` is the criterion's global `[min, max]`. A missing, empty or
    /// non-finite bound takes the global value. Two given bounds are
    /// swapped if reversed. The result is intersected with the global
    /// interval, so a range lying entirely outside it selects nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::UnknownCriterion`] for an unrecognized key
    /// and [`ParamsError::InvalidBound`] for a non-numeric bound.
    pub fn filter_state(
        &self,
        available: &[String],
        bounds: impl FnOnce(Criterion) -> Option<ValueRange>,
    ) -> Result<FilterState, ParamsError> {
        let criterion = self.criterion()?;
        let global = bounds(criterion).unwrap_or_else(|| ValueRange::new(0.0, 0.0));
        let min = parse_bound("min", self.min.as_deref())?;
        let max = parse_bound("max", self.max.as_deref())?;

        let requested = match (min, max) {
            (Some(min), Some(max)) => ValueRange::new(min, max),
            (min, max) => ValueRange {
                min: min.unwrap_or(global.min),
                max: max.unwrap_or(global.max),
            },
        };
        let range = requested.intersect(global);

        if min.is_some() || max.is_some() {
            log::debug!(
                "Resolved {criterion} range {min:?}..{max:?} to {}..{}",
                range.min,
                range.max
            );
        }

        Ok(FilterState {
            states: self.states(available),
            criterion,
            range,
        })
    }
}

/// Parses a range bound; empty and non-finite values read as absent.
fn parse_bound(name: &'static str, raw: Option<&str>) -> Result<Option<f64>, ParamsError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .replace(',', ".")
            .parse::<f64>()
            .map(|v| Some(v).filter(|v| v.is_finite()))
            .map_err(|_| ParamsError::InvalidBound {
                name,
                value: value.to_string(),
            }),
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of municipalities loaded.
    pub municipalities: usize,
}

/// A selectable criterion with its global bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCriterion {
    /// Column key.
    pub key: String,
    /// pt-BR label.
    pub label: String,
    /// pt-BR methodology note.
    pub explanation: String,
    /// Whether values are rendered as currency.
    pub currency: bool,
    /// Smallest value over the whole dataset.
    pub min: Option<f64>,
    /// Largest value over the whole dataset.
    pub max: Option<f64>,
}

impl ApiCriterion {
    #[must_use]
    pub fn new(criterion: Criterion, bounds: Option<ValueRange>) -> Self {
        Self {
            key: criterion.key().to_string(),
            label: criterion.label().to_string(),
            explanation: criterion.explanation().to_string(),
            currency: criterion.is_currency(),
            min: bounds.map(|b| b.min),
            max: bounds.map(|b| b.max),
        }
    }
}

/// Display strings of a [`Summary`], `N/A` when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummaryDisplay {
    pub min: String,
    pub mean: String,
    pub max: String,
}

/// Criterion statistics over the filtered rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCriterionStats {
    pub criterion: Criterion,
    pub label: String,
    pub summary: Summary,
    pub display: ApiSummaryDisplay,
    pub histogram: Histogram,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<String> {
        vec!["AL".to_string(), "SE".to_string()]
    }

    fn bounds(_: Criterion) -> Option<ValueRange> {
        Some(ValueRange::new(2.0, 8.0))
    }

    #[test]
    fn absent_parameters_select_everything() {
        let filter = FilterQueryParams::default()
            .filter_state(&states(), bounds)
            .unwrap();
        assert_eq!(filter.states.len(), 2);
        assert_eq!(filter.criterion, Criterion::NotaMedia);
        assert_eq!(filter.range, ValueRange::new(2.0, 8.0));
    }

    #[test]
    fn empty_state_list_selects_nothing() {
        let params = FilterQueryParams {
            ufs: Some(String::new()),
            ..FilterQueryParams::default()
        };
        assert!(params.states(&states()).is_empty());
    }

    #[test]
    fn unknown_states_are_dropped() {
        let params = FilterQueryParams {
            ufs: Some("al, XX".to_string()),
            ..FilterQueryParams::default()
        };
        assert_eq!(params.states(&states()), BTreeSet::from(["AL".to_string()]));
    }

    fn range(min: Option<&str>, max: Option<&str>) -> ValueRange {
        let params = FilterQueryParams {
            min: min.map(str::to_string),
            max: max.map(str::to_string),
            ..FilterQueryParams::default()
        };
        params.filter_state(&states(), bounds).unwrap().range
    }

    #[test]
    fn range_is_swapped_and_clamped() {
        assert_eq!(range(Some("9"), Some("4")), ValueRange::new(4.0, 8.0));
        assert_eq!(range(Some("1"), Some("20")), ValueRange::new(2.0, 8.0));
        assert_eq!(range(Some("NaN"), Some("5")), ValueRange::new(2.0, 5.0));
        assert_eq!(range(None, Some("6,5")), ValueRange::new(2.0, 6.5));
    }

    #[test]
    fn empty_bounds_read_as_absent() {
        assert_eq!(range(Some(""), Some("8")), ValueRange::new(2.0, 8.0));
        assert_eq!(range(Some(" "), Some("")), ValueRange::new(2.0, 8.0));
    }

    #[test]
    fn one_sided_bound_beyond_the_data_selects_nothing() {
        assert!(range(Some("9"), None).is_empty());
        assert!(range(None, Some("1")).is_empty());
        assert!(!range(Some("8"), None).is_empty());
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let params = FilterQueryParams {
            min: Some("abc".to_string()),
            ..FilterQueryParams::default()
        };
        let err = params.filter_state(&states(), bounds).unwrap_err();
        assert_eq!(err.to_string(), "Invalid min bound 'abc'");
    }

    #[test]
    fn unknown_criterion_is_rejected() {
        let params = FilterQueryParams {
            criterion: Some("nota_invalida".to_string()),
            ..FilterQueryParams::default()
        };
        let err = params.filter_state(&states(), bounds).unwrap_err();
        assert_eq!(err.to_string(), "Unknown criterion 'nota_invalida'");
    }

    #[test]
    fn criterion_key_is_parsed() {
        let params = FilterQueryParams {
            criterion: Some("valor_medio".to_string()),
            ..FilterQueryParams::default()
        };
        assert_eq!(params.criterion().unwrap(), Criterion::ValorMedio);
    }

    #[test]
    fn api_criterion_carries_bounds() {
        let api = ApiCriterion::new(Criterion::ValorMunArea, Some(ValueRange::new(1.0, 2.0)));
        assert_eq!(api.key, "valor_mun_area");
        assert!(api.currency);
        assert_eq!(api.max, Some(2.0));
    }
}
