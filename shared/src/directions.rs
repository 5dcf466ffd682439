use serde::{Deserialize, Serialize};

use crate::geo::{GeoError, GeoPoint};

/// Why a walking-route lookup produced no usable path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectionsError {
    #[error("no routes found{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    NoRoute(Option<String>),
    #[error("route geometry contains an invalid coordinate: {0}")]
    InvalidCoordinate(#[from] GeoError),
    #[error("directions request failed: {0}")]
    Transport(String),
}

/// Subset of the Mapbox Directions v5 response used by the picker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub geometry: LineGeometry,
    /// Metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// GeoJSON `LineString` geometry, coordinates in `[longitude, latitude]` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineGeometry {
    #[serde(rename = "type", default = "line_string")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

fn line_string() -> String {
    "LineString".to_string()
}

impl DirectionsResponse {
    /// Takes the geometry of the first route; later alternatives are ignored.
    pub fn into_first_path(self) -> Result<Vec<GeoPoint>, DirectionsError> {
        let Some(route) = self.routes.into_iter().next() else {
            return Err(DirectionsError::NoRoute(self.message.or(self.code)));
        };
        route
            .geometry
            .coordinates
            .into_iter()
            .map(GeoPoint::from_lng_lat)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DirectionsError::from)
    }
}

/// Path segment of a walking directions request: `walking/{lng},{lat};{lng},{lat}`.
pub fn walking_path(start: GeoPoint, end: GeoPoint) -> String {
    format!(
        "directions/v5/mapbox/walking/{},{};{},{}",
        start.longitude(),
        start.latitude(),
        end.longitude(),
        end.latitude()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_route_geometry_is_extracted() {
        let response: DirectionsResponse = serde_json::from_value(json!({
            "code": "Ok",
            "routes": [
                {"geometry": {"type": "LineString", "coordinates": [[-118.24, 34.05], [-118.23, 34.06]]}, "distance": 1520.4},
                {"geometry": {"type": "LineString", "coordinates": [[0.0, 0.0]]}}
            ]
        }))
        .unwrap();

        let path = response.into_first_path().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].latitude(), 34.05);
        assert_eq!(path[0].longitude(), -118.24);
    }

    #[test]
    fn empty_routes_is_no_route() {
        let response: DirectionsResponse =
            serde_json::from_value(json!({"code": "NoRoute", "routes": []})).unwrap();
        assert_eq!(
            response.into_first_path(),
            Err(DirectionsError::NoRoute(Some("NoRoute".into())))
        );
    }

    #[test]
    fn missing_routes_field_is_no_route() {
        let response: DirectionsResponse =
            serde_json::from_value(json!({"message": "Not Authorized - Invalid Token"})).unwrap();
        assert!(matches!(
            response.into_first_path(),
            Err(DirectionsError::NoRoute(Some(_)))
        ));
    }

    #[test]
    fn out_of_range_geometry_is_rejected() {
        let response: DirectionsResponse = serde_json::from_value(json!({
            "routes": [{"geometry": {"coordinates": [[10.0, 95.0]]}}]
        }))
        .unwrap();
        assert!(matches!(
            response.into_first_path(),
            Err(DirectionsError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn walking_path_uses_lng_lat_order() {
        let start = GeoPoint::new(34.05, -118.24).unwrap();
        let end = GeoPoint::new(34.06, -118.23).unwrap();
        assert_eq!(
            walking_path(start, end),
            "directions/v5/mapbox/walking/-118.24,34.05;-118.23,34.06"
        );
    }
}
