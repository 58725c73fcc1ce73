//! Reprojection of source geometries into WGS84 longitude/latitude.

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::DatasetError;

const WGS84: u16 = 4326;

/// Maps coordinates from one EPSG CRS to WGS84 degrees.
pub struct Reprojector {
    code: u16,
    source: Proj,
    target: Proj,
}

impl Reprojector {
    /// Looks up the definition of `EPSG:{code}`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnsupportedCrs`] if the code has no known
    /// definition.
    pub fn from_epsg(code: u16) -> Result<Self, DatasetError> {
        let source = Proj::from_epsg_code(code).map_err(|e| DatasetError::UnsupportedCrs {
            name: format!("EPSG:{code} ({e})"),
        })?;
        let target = Proj::from_epsg_code(WGS84).map_err(|e| DatasetError::Reprojection {
            code: WGS84,
            message: e.to_string(),
        })?;
        Ok(Self {
            code,
            source,
            target,
        })
    }

    /// Source EPSG code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Reprojects every vertex of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Reprojection`] if any vertex falls outside
    /// the source projection's domain.
    pub fn project(
        &self,
        geometry: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, DatasetError> {
        geometry.try_map_coords(|coord| self.project_coord(coord))
    }

    fn project_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, DatasetError> {
        // proj4rs works in radians for geographic systems.
        let mut point = if self.source.is_latlong() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.source, &self.target, &mut point).map_err(|e| {
            DatasetError::Reprojection {
                code: self.code,
                message: format!("({}, {}): {e}", coord.x, coord.y),
            }
        })?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    #[test]
    fn utm_origin_maps_to_the_central_meridian() {
        // SIRGAS 2000 / UTM zone 25S, central meridian 33°W.
        let reprojector = Reprojector::from_epsg(31985).unwrap();
        let square = MultiPolygon(vec![polygon![
            (x: 500_000.0, y: 10_000_000.0),
            (x: 501_000.0, y: 10_000_000.0),
            (x: 501_000.0, y: 10_001_000.0),
            (x: 500_000.0, y: 10_000_000.0),
        ]]);
        let projected = reprojector.project(&square).unwrap();
        let first = projected.0[0].exterior().0[0];
        assert!((first.x + 33.0).abs() < 1e-6, "{first:?}");
        assert!(first.y.abs() < 1e-6, "{first:?}");
    }

    #[test]
    fn unknown_code_is_unsupported() {
        assert!(matches!(
            Reprojector::from_epsg(9),
            Err(DatasetError::UnsupportedCrs { .. })
        ));
    }
}
