#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory pricing dataset.
//!
//! Reads the precomputed municipality `GeoJSON` once, derives the extra
//! value columns, and answers the dashboard's questions: which rows pass
//! the current filters, and what their summary statistics look like.
//! Nothing in this crate mutates a record after [`Dataset::load`] returns.

pub mod derive;
pub mod filter;
pub mod loader;
pub mod reproject;
pub mod stats;

use std::collections::BTreeSet;
use std::path::Path;

use geo::MultiPolygon;
use pricing_map_models::{Criterion, FilterState, MunicipalityRecord, ValueRange};
use thiserror::Error;

pub use filter::FilteredView;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A property or geometry had an unexpected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// The file declares a coordinate reference system with no known
    /// EPSG definition.
    #[error("Unsupported CRS '{name}'")]
    UnsupportedCrs {
        /// CRS name as declared in the file.
        name: String,
    },

    /// A vertex could not be converted to WGS84.
    #[error("Failed to reproject from EPSG:{code}: {message}")]
    Reprojection {
        /// Source EPSG code.
        code: u16,
        /// Description of what went wrong.
        message: String,
    },

    /// The file contains no features.
    #[error("Dataset contains no municipalities")]
    Empty,
}

/// A municipality row together with its polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub record: MunicipalityRecord,
    /// Outline in geographic degrees (longitude, latitude).
    pub geometry: MultiPolygon<f64>,
    /// Geodesic area of `geometry` on the WGS84 ellipsoid, in square metres.
    pub area_m2: f64,
}

/// The full, read-only pricing dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    municipalities: Vec<Municipality>,
    states: Vec<String>,
}

impl Dataset {
    /// Reads and transforms the `GeoJSON` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file is missing, is not a polygon
    /// `FeatureCollection` in a known CRS, lacks a consumed property,
    /// or has no features. No partial dataset is ever returned.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        log::info!("Loading pricing dataset from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::from_geojson_str(&text)?;
        log::info!(
            "Loaded {} municipalities across {} states",
            dataset.municipalities.len(),
            dataset.states.len()
        );
        Ok(dataset)
    }

    /// Parses a `GeoJSON` document already held in memory.
    ///
    /// # Errors
    ///
    /// See [`Dataset::load`].
    pub fn from_geojson_str(text: &str) -> Result<Self, DatasetError> {
        let municipalities = loader::parse_feature_collection(text)?;
        if municipalities.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self::from_municipalities(municipalities))
    }

    /// Wraps already-built rows.
    #[must_use]
    pub fn from_municipalities(municipalities: Vec<Municipality>) -> Self {
        let states: BTreeSet<String> = municipalities
            .iter()
            .map(|m| m.record.state.clone())
            .collect();
        Self {
            municipalities,
            states: states.into_iter().collect(),
        }
    }

    /// All rows, in file order.
    #[must_use]
    pub fn municipalities(&self) -> &[Municipality] {
        &self.municipalities
    }

    /// Distinct state abbreviations, sorted.
    #[must_use]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Global `[min, max]` of `criterion` over every row.
    #[must_use]
    pub fn bounds(&self, criterion: Criterion) -> Option<ValueRange> {
        value_range(self.municipalities.iter().map(|m| m.record.value(criterion)))
    }

    /// Filter state with every state selected, the default criterion, and
    /// its full range.
    #[must_use]
    pub fn default_filter(&self) -> FilterState {
        let criterion = Criterion::default();
        FilterState {
            states: self.states.iter().cloned().collect(),
            criterion,
            range: self
                .bounds(criterion)
                .unwrap_or_else(|| ValueRange::new(0.0, 0.0)),
        }
    }

    /// Rows passing `filter`, in file order.
    #[must_use]
    pub fn filter(&self, filter: &FilterState) -> FilteredView<'_> {
        FilteredView::new(
            filter.criterion,
            self.municipalities
                .iter()
                .filter(|m| filter.accepts(&m.record))
                .collect(),
        )
    }
}

/// Smallest interval containing every finite value, or `None` if there
/// are none.
pub(crate) fn value_range(values: impl IntoIterator<Item = f64>) -> Option<ValueRange> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<ValueRange>, v| {
            Some(acc.map_or_else(
                || ValueRange::new(v, v),
                |r| ValueRange::new(r.min.min(v), r.max.max(v)),
            ))
        })
}

/// Small in-memory dataset shared by this workspace's tests.
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    /// Three Alagoas/Sergipe municipalities with mean scores 2, 5 and 8.
    pub const THREE_MUNICIPALITIES: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4674" } },
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "fid": 1, "CD_MUN": "2700102", "mun_nome": "Água Branca", "SIGLA_UF": "AL",
                    "nota_veg": 2.0, "nota_area": 1.0, "nota_relevo": 3.0,
                    "nota_insalub": 0.4, "nota_insalub_2": 0.2,
                    "nota_total_q1": 10.0, "nota_total_q2": 11.0, "nota_total_q3": 12.0, "nota_total_q4": 13.0,
                    "nota_media": 2.0, "area_georef": 40000.0, "num_imoveis": 100,
                    "area_car_total": 20000.0, "perimetro_total_car": 900.0,
                    "valor_mun_perim": 1000.0, "valor_mun_area": 3000.0, "populacao": 19000
                },
                "geometry": { "type": "Polygon", "coordinates": [[[-37.9, -9.3], [-37.8, -9.3], [-37.8, -9.2], [-37.9, -9.2], [-37.9, -9.3]]] }
            },
            {
                "type": "Feature",
                "properties": {
                    "fid": 2, "CD_MUN": "2700201", "mun_nome": "Anadia", "SIGLA_UF": "AL",
                    "nota_veg": 3.0, "nota_area": 2.0, "nota_relevo": 2.0,
                    "nota_insalub": 1.5, "nota_insalub_2": 1.5,
                    "nota_total_q1": 9.0, "nota_total_q2": 8.0, "nota_total_q3": 7.0, "nota_total_q4": 6.0,
                    "nota_media": 5.0, "area_georef": 0.0, "num_imoveis": 0,
                    "area_car_total": 0.0, "perimetro_total_car": 0.0,
                    "valor_mun_perim": 5000.0, "valor_mun_area": 7000.0, "populacao": null
                },
                "geometry": { "type": "MultiPolygon", "coordinates": [[[[-36.4, -9.7], [-36.2, -9.7], [-36.2, -9.6], [-36.4, -9.6], [-36.4, -9.7]]]] }
            },
            {
                "type": "Feature",
                "properties": {
                    "fid": 3, "CD_MUN": 2800100, "NM_MUN": "Amparo de São Francisco", "SIGLA_UF": "SE",
                    "nota_veg": "1.0", "nota_area": 3.0, "nota_relevo": 1.0,
                    "nota_insalub": 2.0, "nota_insalub_2": -3.0,
                    "nota_total_q1": 5.0, "nota_total_q2": 5.0, "nota_total_q3": 5.0, "nota_total_q4": 5.0,
                    "nota_media": 8.0, "area_georef": 10000.0, "num_imoveis": 50,
                    "area_car_total": 0.0, "perimetro_total_car": 300.0,
                    "valor_mun_perim": 2500.0, "valor_mun_area": 500.0
                },
                "geometry": { "type": "Polygon", "coordinates": [[[-36.95, -10.15], [-36.9, -10.15], [-36.9, -10.1], [-36.95, -10.1], [-36.95, -10.15]]] }
            }
        ]
    }"#;

    /// Parses [`THREE_MUNICIPALITIES`].
    ///
    /// # Panics
    ///
    /// Panics if the fixture no longer parses.
    #[must_use]
    pub fn dataset() -> super::Dataset {
        super::Dataset::from_geojson_str(THREE_MUNICIPALITIES)
            .expect("fixture dataset must parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_distinct_and_sorted() {
        let dataset = fixtures::dataset();
        assert_eq!(dataset.states(), ["AL".to_string(), "SE".to_string()]);
    }

    #[test]
    fn bounds_span_every_row() {
        let dataset = fixtures::dataset();
        assert_eq!(
            dataset.bounds(Criterion::NotaMedia),
            Some(ValueRange::new(2.0, 8.0))
        );
        assert_eq!(
            dataset.bounds(Criterion::ValorMedio),
            Some(ValueRange::new(1500.0, 6000.0))
        );
    }

    #[test]
    fn default_filter_keeps_everything() {
        let dataset = fixtures::dataset();
        let filter = dataset.default_filter();
        assert_eq!(filter.criterion, Criterion::NotaMedia);
        assert_eq!(dataset.filter(&filter).len(), 3);
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = Dataset::from_geojson_str(r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn missing_file_fails_fast() {
        let err = Dataset::load(Path::new("does/not/exist.geojson")).unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn value_range_ignores_non_finite() {
        assert_eq!(value_range([f64::NAN, 3.0, 1.0]), Some(ValueRange::new(1.0, 3.0)));
        assert_eq!(value_range(std::iter::empty()), None);
    }
}
