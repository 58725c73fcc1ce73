//! Choropleth map scene: styled features, tooltips and the gradient legend.
//!
//! A [`MapScene`] is everything the Leaflet page needs for one render. It
//! is built fresh from a [`FilteredView`] on every request; colors are
//! normalized against the view's own min/max, not the whole dataset's.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use pricing_map_dataset::{FilteredView, Municipality};
use pricing_map_models::{Criterion, MunicipalityRecord, ValueRange};
use serde::Serialize;

use crate::color::{color, gradient};
use crate::format::{criterion_value, decimal, escape_html, reais};

/// Polygon outline color.
pub const OUTLINE_COLOR: &str = "black";
/// Polygon outline width in pixels.
pub const OUTLINE_WEIGHT: f64 = 1.5;
/// Polygon fill opacity.
pub const FILL_OPACITY: f64 = 0.7;
/// Number of color stops sampled for the legend gradient.
pub const LEGEND_SAMPLES: usize = 100;
/// Initial zoom when the view has rows.
pub const DEFAULT_ZOOM: u8 = 9;

/// Map center (latitude, longitude) and zoom used when nothing is selected.
const EMPTY_VIEW_CENTER: [f64; 2] = [-14.235, -51.925];
const EMPTY_VIEW_ZOOM: u8 = 4;

/// Leaflet path style for one polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: String,
    pub color: &'static str,
    pub weight: f64,
    pub fill_opacity: f64,
}

/// Style of `record` for `criterion`, colored within `range` (the view's
/// min/max). Pure: the same inputs always give the same style.
#[must_use]
pub fn feature_style(
    record: &MunicipalityRecord,
    criterion: Criterion,
    range: ValueRange,
) -> FeatureStyle {
    FeatureStyle {
        fill_color: color(record.value(criterion), range.min, range.max),
        color: OUTLINE_COLOR,
        weight: OUTLINE_WEIGHT,
        fill_opacity: FILL_OPACITY,
    }
}

/// Tooltip HTML for one municipality.
#[must_use]
pub fn tooltip_html(record: &MunicipalityRecord, criterion: Criterion) -> String {
    format!(
        "<h4 style=\"text-align:center;font-weight:bold;\">{name}</h4>\
         <b>UF:</b> {state}<br>\
         <b>Área Georreferenciável:</b> {area} ha<br>\
         <b>{label}:</b> {value}<br>\
         <b>Valor Total por Área (R$):</b> {valor_area}<br>\
         <b>Valor Total por Perímetro (R$):</b> {valor_perim}<br>\
         <b>Valor Médio por Imóvel (Área):</b> {por_imovel_area}<br>\
         <b>Valor Médio por Imóvel (Perím.):</b> {por_imovel_perim}<br>",
        name = escape_html(&record.name),
        state = escape_html(&record.state),
        area = decimal(record.holdings.area_georef, 2),
        label = escape_html(criterion.label()),
        value = decimal(record.value(criterion), 2),
        valor_area = decimal(record.holdings.valor_mun_area, 2),
        valor_perim = decimal(record.holdings.valor_mun_perim, 2),
        por_imovel_area = reais(record.derived.valor_medio_car),
        por_imovel_perim = reais(record.derived.val_med_car_perim),
    )
}

/// Horizontal gradient legend labelled with the view's min and max.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub title: String,
    pub colors: Vec<String>,
    pub min_label: String,
    pub max_label: String,
}

impl Legend {
    /// Samples [`LEGEND_SAMPLES`] colors across `range`.
    #[must_use]
    pub fn new(criterion: Criterion, range: ValueRange) -> Self {
        Self {
            title: criterion.label().to_string(),
            colors: gradient(range.min, range.max, LEGEND_SAMPLES),
            min_label: criterion_value(criterion, range.min),
            max_label: criterion_value(criterion, range.max),
        }
    }

    /// Fixed-position legend box injected over the map.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"map-legend\">\
             <b>Legenda: {title}</b><br>\
             <i class=\"map-legend-swatch\" style=\"background: linear-gradient(to right, {stops});\"></i>\
             <div class=\"map-legend-labels\"><span>{min}</span><span>{max}</span></div>\
             </div>",
            title = escape_html(&self.title),
            stops = self.colors.join(","),
            min = escape_html(&self.min_label),
            max = escape_html(&self.max_label),
        )
    }
}

/// Everything the map tab renders for one filter state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub criterion: Criterion,
    /// Latitude, longitude.
    pub center: [f64; 2],
    pub zoom: u8,
    pub features: FeatureCollection,
    /// `None` when the view is empty.
    pub legend: Option<Legend>,
}

impl MapScene {
    /// Builds the scene for `view`.
    #[must_use]
    pub fn build(view: &FilteredView<'_>) -> Self {
        let criterion = view.criterion();
        let range = view.value_range();

        let features = range.map_or_else(Vec::new, |range| {
            view.rows()
                .iter()
                .map(|m| to_feature(m, criterion, range))
                .collect()
        });

        let (center, zoom) = view.centroid().map_or(
            (EMPTY_VIEW_CENTER, EMPTY_VIEW_ZOOM),
            |c| ([c.y(), c.x()], DEFAULT_ZOOM),
        );

        log::debug!(
            "Built map scene for {criterion} with {} features",
            features.len()
        );

        Self {
            criterion,
            center,
            zoom,
            features: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
            legend: range.map(|r| Legend::new(criterion, r)),
        }
    }
}

fn to_feature(m: &Municipality, criterion: Criterion, range: ValueRange) -> Feature {
    let record = &m.record;
    let mut properties = JsonObject::new();
    properties.insert("code".to_string(), record.code.clone().into());
    properties.insert("name".to_string(), record.name.clone().into());
    properties.insert("state".to_string(), record.state.clone().into());
    properties.insert(
        "value".to_string(),
        serde_json::json!(record.value(criterion)),
    );
    properties.insert(
        "style".to_string(),
        serde_json::to_value(feature_style(record, criterion, range))
            .unwrap_or(serde_json::Value::Null),
    );
    properties.insert(
        "tooltip".to_string(),
        tooltip_html(record, criterion).into(),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&m.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pricing_map_dataset::{Dataset, fixtures};
    use pricing_map_models::FilterState;

    use crate::color::FALLBACK_COLOR;

    use super::*;

    fn view_filter(dataset: &Dataset, states: &[&str], criterion: Criterion) -> FilterState {
        FilterState {
            states: states.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
            criterion,
            range: dataset.bounds(criterion).unwrap(),
        }
    }

    #[test]
    fn colors_are_normalized_to_the_view() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&view_filter(&dataset, &["AL"], Criterion::NotaMedia));
        let scene = MapScene::build(&view);

        let fills: Vec<String> = scene
            .features
            .features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["style"]["fillColor"].as_str().unwrap().to_string())
            .collect();
        // AL alone spans 2.0..5.0, so 5.0 is the red end rather than mid-ramp.
        assert_eq!(fills, vec!["#0000ff", "#ff0000"]);
    }

    #[test]
    fn single_row_view_uses_fallback_color() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&view_filter(&dataset, &["SE"], Criterion::NotaMedia));
        let scene = MapScene::build(&view);
        let props = scene.features.features[0].properties.as_ref().unwrap();
        assert_eq!(props["style"]["fillColor"], FALLBACK_COLOR);
        assert_eq!(props["style"]["color"], "black");
        let legend = scene.legend.unwrap();
        assert_eq!(legend.min_label, "8.0");
        assert_eq!(legend.max_label, "8.0");
    }

    #[test]
    fn empty_view_has_no_features_or_legend() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&view_filter(&dataset, &[], Criterion::NotaMedia));
        let scene = MapScene::build(&view);
        assert!(scene.features.features.is_empty());
        assert!(scene.legend.is_none());
        assert_eq!(scene.zoom, 4);
    }

    #[test]
    fn legend_labels_use_currency_for_value_criteria() {
        let legend = Legend::new(Criterion::ValorMedio, ValueRange::new(1500.0, 6000.0));
        assert_eq!(legend.colors.len(), LEGEND_SAMPLES);
        assert_eq!(legend.min_label, "R$ 1.500,00");
        assert_eq!(legend.max_label, "R$ 6.000,00");
        let html = legend.to_html();
        assert!(html.contains("linear-gradient(to right, #0000ff,"));
        assert!(html.contains("Legenda: Valor Médio"));
    }

    #[test]
    fn legend_labels_round_scores() {
        let legend = Legend::new(Criterion::NotaVeg, ValueRange::new(1.234_56, 3.0));
        assert_eq!(legend.min_label, "1.235");
        assert_eq!(legend.max_label, "3.0");
    }

    #[test]
    fn tooltip_lists_currency_fields() {
        let dataset = fixtures::dataset();
        let record = &dataset.municipalities()[0].record;
        let tooltip = tooltip_html(record, Criterion::NotaMedia);
        assert!(tooltip.contains("Água Branca"));
        assert!(tooltip.contains("<b>UF:</b> AL"));
        assert!(tooltip.contains("40.000,00 ha"));
        assert!(tooltip.contains("<b>Nota Média:</b> 2,00"));
        assert!(tooltip.contains("3.000,00"));
        assert!(tooltip.contains("R$ 15,00"));
        assert!(tooltip.contains("R$ 10,00"));
    }

    #[test]
    fn scene_is_centered_on_filtered_geometry() {
        let dataset = fixtures::dataset();
        let view = dataset.filter(&view_filter(&dataset, &["SE"], Criterion::NotaMedia));
        let scene = MapScene::build(&view);
        assert!((scene.center[0] - -10.125).abs() < 1e-6);
        assert!((scene.center[1] - -36.925).abs() < 1e-6);
        assert_eq!(scene.zoom, DEFAULT_ZOOM);
    }
}
