use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
}

/// A validated latitude/longitude pair.
///
/// Serialized as `{"latitude": .., "longitude": ..}`, which is the shape the
/// challenge API stores in `route.coordinates`. Deserialization re-checks the
/// bounds so a malformed record never produces an out-of-range point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point from a GeoJSON-ordered `[longitude, latitude]` pair.
    pub fn from_lng_lat([lng, lat]: [f64; 2]) -> Result<Self, GeoError> {
        Self::new(lat, lng)
    }

    pub fn latitude(self) -> f64 {
        self.latitude
    }

    pub fn longitude(self) -> f64 {
        self.longitude
    }

    pub fn lng_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Parses `"lng,lat"` as typed on a command line or pasted from a map tool.
impl std::str::FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lng, lat) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `lng,lat`, got `{s}`"))?;
        let parse = |field: &str, label: &str| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid {label} `{}`", field.trim()))
        };
        GeoPoint::new(parse(lat, "latitude")?, parse(lng, "longitude")?).map_err(|e| e.to_string())
    }
}
