//! `GeoJSON` feature collection parsing.
//!
//! Each feature becomes one [`Municipality`]: the consumed properties are
//! typed into a [`MunicipalityRecord`], the remaining ones are kept for
//! the table, and the geometry is normalized to a [`MultiPolygon`] in
//! WGS84 degrees (reprojected when the file declares another CRS) with
//! its geodesic area measured once.

use std::collections::BTreeMap;

use geo::{BoundingRect, GeodesicArea, MultiPolygon};
use geojson::{Feature, GeoJson, JsonObject};
use pricing_map_models::{Holdings, MunicipalityRecord, Scores};
use serde_json::Value;

use crate::derive::{derive, floor_insalubrity};
use crate::reproject::Reprojector;
use crate::{DatasetError, Municipality};

/// Internal row id written by the upstream export; never displayed.
pub const ROW_ID_PROPERTY: &str = "fid";

/// Properties typed into [`MunicipalityRecord`] fields, plus the derived
/// column names (recomputed here even if the file already carries them).
const CONSUMED_PROPERTIES: &[&str] = &[
    ROW_ID_PROPERTY,
    "CD_MUN",
    "mun_nome",
    "NM_MUN",
    "SIGLA_UF",
    "nota_veg",
    "nota_area",
    "nota_relevo",
    "nota_insalub",
    "nota_insalub_2",
    "nota_total_q1",
    "nota_total_q2",
    "nota_total_q3",
    "nota_total_q4",
    "nota_media",
    "area_georef",
    "num_imoveis",
    "area_car_total",
    "perimetro_total_car",
    "valor_mun_perim",
    "valor_mun_area",
    "valor_medio",
    "valor_medio_car",
    "val_med_car_perim",
];

/// Coordinate reference systems the file may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCrs {
    /// WGS84 longitude/latitude (`EPSG:4326`, `OGC:CRS84`).
    Wgs84,
    /// SIRGAS 2000 (`EPSG:4674`). Its datum coincides with WGS84 to well
    /// under a metre, so coordinates are used unchanged.
    Sirgas2000,
    /// Any other EPSG code, e.g. `EPSG:5880` or a SIRGAS 2000 UTM zone.
    /// Reprojected to WGS84 at load.
    Epsg(u16),
}

impl SourceCrs {
    /// Recognizes `EPSG:4326`, `urn:ogc:def:crs:EPSG::4674`,
    /// `urn:ogc:def:crs:OGC:1.3:CRS84` and similar spellings.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let code = name.rsplit(':').next().unwrap_or(name).trim();
        match code.to_ascii_uppercase().as_str() {
            "4326" | "CRS84" => Some(Self::Wgs84),
            "4674" => Some(Self::Sirgas2000),
            other => other.parse().ok().map(Self::Epsg),
        }
    }
}

/// Parses a `FeatureCollection` into municipalities.
///
/// # Errors
///
/// Returns [`DatasetError`] if the text is not a `FeatureCollection`, its
/// declared CRS is unknown or cannot be reprojected, or any feature is
/// malformed.
pub fn parse_feature_collection(text: &str) -> Result<Vec<Municipality>, DatasetError> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(DatasetError::Conversion {
            message: "Expected a GeoJSON FeatureCollection".to_string(),
        });
    };

    let crs = declared_crs(collection.foreign_members.as_ref())?;
    log::debug!("Source CRS: {crs:?}");
    let reprojector = match crs {
        SourceCrs::Epsg(code) => {
            log::info!("Reprojecting features from EPSG:{code} to EPSG:4326");
            Some(Reprojector::from_epsg(code)?)
        }
        SourceCrs::Wgs84 | SourceCrs::Sirgas2000 => None,
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| parse_feature(index, feature, reprojector.as_ref()))
        .collect()
}

/// Reads the legacy `crs` member. Files without one are RFC 7946 WGS84.
fn declared_crs(foreign_members: Option<&JsonObject>) -> Result<SourceCrs, DatasetError> {
    let Some(crs) = foreign_members.and_then(|m| m.get("crs")) else {
        return Ok(SourceCrs::Wgs84);
    };
    let name = crs["properties"]["name"]
        .as_str()
        .ok_or_else(|| DatasetError::Conversion {
            message: "crs member has no properties.name".to_string(),
        })?;
    SourceCrs::from_name(name).ok_or_else(|| DatasetError::UnsupportedCrs {
        name: name.to_string(),
    })
}

fn parse_feature(
    index: usize,
    feature: Feature,
    reprojector: Option<&Reprojector>,
) -> Result<Municipality, DatasetError> {
    let geometry = feature
        .geometry
        .ok_or_else(|| DatasetError::Conversion {
            message: format!("Feature {index} has no geometry"),
        })?;
    let geometry = to_multipolygon(geometry.try_into()?).ok_or_else(|| {
        DatasetError::Conversion {
            message: format!("Feature {index} is not a Polygon or MultiPolygon"),
        }
    })?;
    let geometry = match reprojector {
        Some(reprojector) => reprojector.project(&geometry)?,
        None => geometry,
    };
    check_geographic(index, &geometry)?;

    let properties = feature.properties.unwrap_or_default();
    let record = parse_record(&properties).map_err(|e| match e {
        DatasetError::Conversion { message } => DatasetError::Conversion {
            message: format!("Feature {index}: {message}"),
        },
        other => other,
    })?;

    let area_m2 = geometry.geodesic_area_unsigned();

    Ok(Municipality {
        record,
        geometry,
        area_m2,
    })
}

/// Normalizes polygonal geometries to a [`MultiPolygon`].
fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Rejects projected coordinates that slipped in without a `crs` member
/// or under a mislabelled one.
fn check_geographic(index: usize, geometry: &MultiPolygon<f64>) -> Result<(), DatasetError> {
    let Some(rect) = geometry.bounding_rect() else {
        return Err(DatasetError::Conversion {
            message: format!("Feature {index} has an empty geometry"),
        });
    };
    let in_range = rect.min().x >= -180.0
        && rect.max().x <= 180.0
        && rect.min().y >= -90.0
        && rect.max().y <= 90.0;
    if in_range {
        Ok(())
    } else {
        Err(DatasetError::Conversion {
            message: format!("Feature {index} has coordinates outside geographic bounds"),
        })
    }
}

/// Types the consumed properties and runs the load-time transformations.
///
/// # Errors
///
/// Returns [`DatasetError::Conversion`] if a consumed property is missing
/// or not numeric.
pub fn parse_record(properties: &JsonObject) -> Result<MunicipalityRecord, DatasetError> {
    let scores = Scores {
        veg: number(properties, "nota_veg")?,
        area: number(properties, "nota_area")?,
        relevo: number(properties, "nota_relevo")?,
        insalub: number(properties, "nota_insalub")?,
        insalub_2: floor_insalubrity(number(properties, "nota_insalub_2")?),
        total_quarters: [
            number(properties, "nota_total_q1")?,
            number(properties, "nota_total_q2")?,
            number(properties, "nota_total_q3")?,
            number(properties, "nota_total_q4")?,
        ],
        media: number(properties, "nota_media")?,
    };

    let holdings = Holdings {
        area_georef: number(properties, "area_georef")?,
        num_imoveis: number(properties, "num_imoveis")?,
        area_car_total: number(properties, "area_car_total")?,
        perimetro_total_car: number(properties, "perimetro_total_car")?,
        valor_mun_perim: number(properties, "valor_mun_perim")?,
        valor_mun_area: number(properties, "valor_mun_area")?,
    };

    let name = text(properties, "mun_nome").or_else(|_| text(properties, "NM_MUN"))?;

    let extra: BTreeMap<String, Value> = properties
        .iter()
        .filter(|(key, _)| !CONSUMED_PROPERTIES.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(MunicipalityRecord {
        code: text(properties, "CD_MUN")?,
        name,
        state: text(properties, "SIGLA_UF")?,
        scores,
        derived: derive(&holdings),
        holdings,
        extra,
    })
}

/// Reads a numeric property. `null` reads as 0; numeric strings are
/// accepted with either `.` or `,` as the decimal separator. `NaN` and
/// infinities are rejected.
fn number(properties: &JsonObject, key: &str) -> Result<f64, DatasetError> {
    let value = match properties.get(key) {
        None => return Err(missing(key)),
        Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| not_numeric(key))?,
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| not_numeric(key))?,
        Some(_) => return Err(not_numeric(key)),
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(not_numeric(key))
    }
}

/// Reads a textual property, accepting numbers (e.g. numeric IBGE codes).
fn text(properties: &JsonObject, key: &str) -> Result<String, DatasetError> {
    match properties.get(key) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(missing(key)),
    }
}

fn missing(key: &str) -> DatasetError {
    DatasetError::Conversion {
        message: format!("missing property '{key}'"),
    }
}

fn not_numeric(key: &str) -> DatasetError {
    DatasetError::Conversion {
        message: format!("property '{key}' is not numeric"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::THREE_MUNICIPALITIES;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.geometry.0.len() == 1));
    }

    #[test]
    fn name_falls_back_to_ibge_column() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        assert_eq!(rows[0].record.name, "Água Branca");
        assert_eq!(rows[2].record.name, "Amparo de São Francisco");
        assert_eq!(rows[2].record.code, "2800100");
    }

    #[test]
    fn insalubrity_is_floored_for_every_row() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        let scores: Vec<f64> = rows.iter().map(|r| r.record.scores.insalub_2).collect();
        assert_eq!(scores, vec![1.0, 1.5, 1.0]);
    }

    #[test]
    fn derived_columns_are_computed() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        assert_eq!(rows[0].record.derived.valor_medio, 2_000.0);
        assert_eq!(rows[1].record.derived.valor_medio_car, 0.0);
        assert_eq!(rows[1].record.derived.val_med_car_perim, 0.0);
        assert_eq!(rows[2].record.derived.valor_medio_car, 0.0);
        assert!((rows[2].record.derived.val_med_car_perim - 50.0).abs() < 1e-9);
    }

    #[test]
    fn numeric_strings_and_nulls() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        assert_eq!(rows[2].record.scores.veg, 1.0);
        assert_eq!(rows[1].record.extra.get("populacao"), Some(&Value::Null));
    }

    #[test]
    fn extra_columns_exclude_row_id_and_consumed_fields() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        let keys: Vec<&str> = rows[0].record.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["populacao"]);
    }

    #[test]
    fn area_is_measured_in_square_metres() {
        let rows = parse_feature_collection(THREE_MUNICIPALITIES).unwrap();
        // A 0.1° x 0.1° cell near 9°S is roughly 11 km x 11 km.
        let area_km2 = rows[0].area_m2 / 1e6;
        assert!((110.0..130.0).contains(&area_km2), "area {area_km2} km²");
    }

    #[test]
    fn crs_names() {
        assert_eq!(SourceCrs::from_name("EPSG:4326"), Some(SourceCrs::Wgs84));
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(SourceCrs::Wgs84)
        );
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:EPSG::4674"),
            Some(SourceCrs::Sirgas2000)
        );
        assert_eq!(
            SourceCrs::from_name("urn:ogc:def:crs:EPSG::5880"),
            Some(SourceCrs::Epsg(5880))
        );
        assert_eq!(SourceCrs::from_name("urn:ogc:def:crs:LOCAL::grid"), None);
    }

    /// The fixture with every geometry replaced by `ring` under `crs`.
    fn with_crs(crs: &str, ring: &[[f64; 2]]) -> String {
        let mut doc: Value = serde_json::from_str(THREE_MUNICIPALITIES).unwrap();
        doc["crs"]["properties"]["name"] = Value::from(crs);
        for feature in doc["features"].as_array_mut().unwrap() {
            feature["geometry"] = serde_json::json!({ "type": "Polygon", "coordinates": [ring] });
        }
        doc.to_string()
    }

    /// A 10 km square whose lower-left corner is `(x, y)`.
    fn square(x: f64, y: f64) -> Vec<[f64; 2]> {
        vec![
            [x, y],
            [x + 10_000.0, y],
            [x + 10_000.0, y + 10_000.0],
            [x, y + 10_000.0],
            [x, y],
        ]
    }

    #[test]
    fn projected_crs_is_reprojected_to_degrees() {
        for (crs, corner, lon) in [
            // SIRGAS 2000 / UTM zone 25S, central meridian 33°W.
            ("urn:ogc:def:crs:EPSG::31985", square(500_000.0, 9_000_000.0), -33.0),
            // SIRGAS 2000 / Brazil Polyconic, central meridian 54°W.
            ("EPSG:5880", square(5_000_000.0, 9_000_000.0), -54.0),
        ] {
            let rows = parse_feature_collection(&with_crs(crs, &corner)).unwrap();
            let rect = rows[0].geometry.bounding_rect().unwrap();
            assert!((rect.min().x - lon).abs() < 0.01, "{crs}: {rect:?}");
            assert!((-9.1..-8.9).contains(&rect.min().y), "{crs}: {rect:?}");
            let area_km2 = rows[0].area_m2 / 1e6;
            assert!((99.0..101.5).contains(&area_km2), "{crs}: {area_km2} km²");
        }
    }

    #[test]
    fn unknown_crs_is_rejected() {
        let text = THREE_MUNICIPALITIES.replace("EPSG::4674", "LOCAL::grid");
        let err = parse_feature_collection(&text).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedCrs { .. }));
    }

    #[test]
    fn projected_coordinates_are_rejected() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{},
            "geometry":{"type":"Polygon","coordinates":[[[5000000,8900000],[5000100,8900000],[5000100,8900100],[5000000,8900000]]]}}]}"#;
        let err = parse_feature_collection(text).unwrap_err();
        assert!(
            matches!(&err, DatasetError::Conversion { message } if message.contains("geographic")),
            "{err}"
        );
    }

    #[test]
    fn point_geometry_is_rejected() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{},"geometry":{"type":"Point","coordinates":[-36.0,-9.0]}}]}"#;
        assert!(parse_feature_collection(text).is_err());
    }

    #[test]
    fn non_finite_numeric_strings_are_rejected() {
        for bad in ["NaN", "inf", "-infinity"] {
            let text = THREE_MUNICIPALITIES.replace(
                "\"nota_media\": 5.0,",
                &format!("\"nota_media\": \"{bad}\","),
            );
            let err = parse_feature_collection(&text).unwrap_err();
            assert!(err.to_string().contains("nota_media"), "{bad}: {err}");
            assert!(err.to_string().contains("Feature 1"), "{bad}: {err}");
        }
    }

    #[test]
    fn missing_property_names_the_column() {
        let text = THREE_MUNICIPALITIES.replace("\"nota_relevo\": 2.0,", "");
        let err = parse_feature_collection(&text).unwrap_err();
        assert!(err.to_string().contains("nota_relevo"), "{err}");
        assert!(err.to_string().contains("Feature 1"), "{err}");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_feature_collection("{ not json"),
            Err(DatasetError::GeoJson(_))
        ));
    }
}
