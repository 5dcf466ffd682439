use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::picker::RouteUpdateEvent;

pub const DEFAULT_CHALLENGE_TYPE: &str = "Day Hike";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCoordinates {
    #[serde(default)]
    pub coordinates: Vec<GeoPoint>,
}

/// Value written into a draft field by name.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    Checked(bool),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(value: String) -> Self {
        FieldInput::Text(value)
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        FieldInput::Checked(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` expects text")]
    ExpectedText(String),
    #[error("field `{0}` is a checkbox")]
    ExpectedCheckbox(&'static str),
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be a number, got `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("difficulty must be between 1 and 10, got {0}")]
    Difficulty(String),
}

/// The in-progress challenge held by a form. Inputs are kept as typed so a
/// half-entered number never loses keystrokes; parsing happens in
/// [`ChallengeDraft::to_payload`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeDraft {
    pub title: String,
    pub challenge_name: String,
    pub elevation_gain: String,
    pub difficulty: String,
    pub how_it_works: String,
    pub country_id: String,
    pub challenge_type: String,
    pub distance: String,
    pub price: String,
    pub color1: String,
    pub color2: String,
    pub image: String,
    pub is_hide: bool,
    pub with_redemption: bool,
    pub route: RouteCoordinates,
}

impl Default for ChallengeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            challenge_name: String::new(),
            elevation_gain: String::new(),
            difficulty: String::new(),
            how_it_works: String::new(),
            country_id: String::new(),
            challenge_type: DEFAULT_CHALLENGE_TYPE.to_string(),
            distance: String::new(),
            price: String::new(),
            color1: String::new(),
            color2: String::new(),
            image: String::new(),
            is_hide: false,
            with_redemption: false,
            route: RouteCoordinates::default(),
        }
    }
}

impl ChallengeDraft {
    /// Writes one field by its wire name (`title`, `elevationGain`, `isHide`, ...).
    pub fn set_field(&mut self, name: &str, input: FieldInput) -> Result<(), DraftError> {
        let text = match name {
            "title" => &mut self.title,
            "challengeName" => &mut self.challenge_name,
            "elevationGain" | "elevation" => &mut self.elevation_gain,
            "difficulty" => &mut self.difficulty,
            "howItWorks" => &mut self.how_it_works,
            "countryId" => &mut self.country_id,
            "challengeType" => &mut self.challenge_type,
            "distance" => &mut self.distance,
            "price" => &mut self.price,
            "color1" => &mut self.color1,
            "color2" => &mut self.color2,
            "image" => &mut self.image,
            "isHide" => return set_checked(&mut self.is_hide, "isHide", input),
            "withRedemption" => {
                return set_checked(&mut self.with_redemption, "withRedemption", input);
            }
            other => return Err(DraftError::UnknownField(other.to_string())),
        };
        match input {
            FieldInput::Text(value) => {
                *text = value;
                Ok(())
            }
            FieldInput::Checked(_) => Err(DraftError::ExpectedText(name.to_string())),
        }
    }

    /// Replaces the stored coordinates with `[start, ...waypoints, end]`.
    pub fn apply_route_update(&mut self, event: &RouteUpdateEvent) {
        self.route.coordinates = event.ordered_points();
    }

    /// Gradient colours in field order, blanks dropped. A draft with only
    /// `color2` set yields just that colour.
    pub fn combined_colors(&self) -> Vec<String> {
        [&self.color1, &self.color2]
            .into_iter()
            .filter(|color| !color.is_empty())
            .cloned()
            .collect()
    }

    pub fn to_payload(&self) -> Result<ChallengePayload, DraftError> {
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(DraftError::Required(field))
            } else {
                Ok(value.to_string())
            }
        };
        let number = |value: &str, field: &'static str| {
            let value = required(value, field)?;
            value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or(DraftError::InvalidNumber { field, value })
        };

        let difficulty = required(&self.difficulty, "difficulty")?;
        let difficulty = match difficulty.parse::<u8>() {
            Ok(level @ 1..=10) => level,
            _ => return Err(DraftError::Difficulty(difficulty)),
        };

        Ok(ChallengePayload {
            id: None,
            title: required(&self.title, "title")?,
            challenge_name: self.challenge_name.trim().to_string(),
            elevation_gain: number(&self.elevation_gain, "elevationGain")?,
            difficulty,
            how_it_works: required(&self.how_it_works, "howItWorks")?,
            country_id: required(&self.country_id, "countryId")?,
            challenge_type: self.challenge_type.clone(),
            distance: number(&self.distance, "distance")?,
            price: number(&self.price, "price")?,
            color: self.combined_colors(),
            image: required(&self.image, "image")?,
            is_hide: self.is_hide,
            with_redemption: self.with_redemption,
            route: self.route.clone(),
        })
    }

    /// Merges a stored record over the empty draft.
    pub fn from_record(record: &ChallengeRecord) -> Self {
        let mut draft = Self::default();
        let text = |value: &Option<String>, into: &mut String| {
            if let Some(value) = value {
                *into = value.clone();
            }
        };
        let scalar = |value: &Option<Scalar>, into: &mut String| {
            if let Some(value) = value {
                *into = value.to_input();
            }
        };

        text(&record.title, &mut draft.title);
        text(&record.challenge_name, &mut draft.challenge_name);
        scalar(&record.elevation_gain, &mut draft.elevation_gain);
        scalar(&record.difficulty, &mut draft.difficulty);
        text(&record.how_it_works, &mut draft.how_it_works);
        scalar(&record.country_id, &mut draft.country_id);
        text(&record.challenge_type, &mut draft.challenge_type);
        scalar(&record.distance, &mut draft.distance);
        scalar(&record.price, &mut draft.price);
        text(&record.image, &mut draft.image);
        draft.is_hide = record.is_hide.unwrap_or(draft.is_hide);
        draft.with_redemption = record.with_redemption.unwrap_or(draft.with_redemption);

        let mut gradient = record.color_gradient.iter();
        draft.color1 = gradient.next().cloned().unwrap_or_default();
        draft.color2 = gradient.next().cloned().unwrap_or_default();

        if let Some(route) = &record.route {
            draft.route = route.clone();
        }
        draft
    }
}

fn set_checked(slot: &mut bool, name: &'static str, input: FieldInput) -> Result<(), DraftError> {
    match input {
        FieldInput::Checked(value) => {
            *slot = value;
            Ok(())
        }
        FieldInput::Text(_) => Err(DraftError::ExpectedCheckbox(name)),
    }
}

/// Body sent to the create and update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub challenge_name: String,
    pub elevation_gain: f64,
    pub difficulty: u8,
    pub how_it_works: String,
    pub country_id: String,
    pub challenge_type: String,
    pub distance: f64,
    pub price: f64,
    pub color: Vec<String>,
    pub image: String,
    pub is_hide: bool,
    pub with_redemption: bool,
    pub route: RouteCoordinates,
}

/// A number or a numeric string; stored records mix both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn to_input(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

/// A challenge as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub challenge_name: Option<String>,
    #[serde(default, alias = "elevation")]
    pub elevation_gain: Option<Scalar>,
    #[serde(default)]
    pub difficulty: Option<Scalar>,
    #[serde(default)]
    pub how_it_works: Option<String>,
    #[serde(default)]
    pub country_id: Option<Scalar>,
    #[serde(default)]
    pub challenge_type: Option<String>,
    #[serde(default)]
    pub distance: Option<Scalar>,
    #[serde(default)]
    pub price: Option<Scalar>,
    #[serde(default)]
    pub color_gradient: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_hide: Option<bool>,
    #[serde(default)]
    pub with_redemption: Option<bool>,
    #[serde(default)]
    pub route: Option<RouteCoordinates>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ChallengeRecord {
    pub fn first_and_last_points(&self) -> Option<(GeoPoint, GeoPoint)> {
        let coordinates = &self.route.as_ref()?.coordinates;
        Some((*coordinates.first()?, *coordinates.last()?))
    }
}

/// Records from a listing response body. `data` is either a map of category
/// name to record list or a plain list; entries that do not parse as a record
/// are skipped.
pub fn records_from_listing(body: serde_json::Value) -> Vec<ChallengeRecord> {
    use serde_json::Value;

    let groups: Vec<Value> = match body.get("data") {
        Some(Value::Object(map)) => map.values().cloned().collect(),
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    groups
        .into_iter()
        .flat_map(|group| match group {
            Value::Array(items) => items,
            single => vec![single],
        })
        .filter_map(|item| match serde_json::from_value::<ChallengeRecord>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("skipping malformed challenge record: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn filled() -> ChallengeDraft {
        ChallengeDraft {
            title: "Griffith Loop".into(),
            elevation_gain: "1200".into(),
            difficulty: "4".into(),
            how_it_works: "Walk it".into(),
            country_id: "3".into(),
            distance: "5.5".into(),
            price: "19.99".into(),
            image: "https://cdn.example.com/griffith.jpg".into(),
            ..ChallengeDraft::default()
        }
    }

    #[test]
    fn default_draft_is_day_hike() {
        let draft = ChallengeDraft::default();
        assert_eq!(draft.challenge_type, "Day Hike");
        assert!(draft.route.coordinates.is_empty());
        assert!(!draft.is_hide);
    }

    #[test]
    fn set_field_by_wire_name() {
        let mut draft = ChallengeDraft::default();
        draft.set_field("title", "Ridge".into()).unwrap();
        draft.set_field("elevationGain", "900".into()).unwrap();
        draft.set_field("isHide", true.into()).unwrap();
        assert_eq!(draft.title, "Ridge");
        assert_eq!(draft.elevation_gain, "900");
        assert!(draft.is_hide);
    }

    #[test]
    fn set_field_rejects_unknown_and_mismatched() {
        let mut draft = ChallengeDraft::default();
        assert_eq!(
            draft.set_field("colour", "#fff".into()),
            Err(DraftError::UnknownField("colour".into()))
        );
        assert_eq!(
            draft.set_field("withRedemption", "yes".into()),
            Err(DraftError::ExpectedCheckbox("withRedemption"))
        );
        assert_eq!(
            draft.set_field("price", true.into()),
            Err(DraftError::ExpectedText("price".into()))
        );
    }

    #[test]
    fn route_update_replaces_coordinates_in_order() {
        let mut draft = ChallengeDraft::default();
        draft.route.coordinates = vec![point(9.0, 9.0)];
        let event = RouteUpdateEvent {
            start: point(0.0, 0.0),
            end: point(2.0, 2.0),
            waypoints: vec![point(1.0, 1.0)],
            route: vec![point(0.0, 0.0), point(2.0, 2.0)],
        };
        draft.apply_route_update(&event);
        assert_eq!(
            draft.route.coordinates,
            vec![point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)]
        );
    }

    #[test]
    fn flattened_pairs_keep_latitude_and_longitude() {
        let mut draft = ChallengeDraft::default();
        draft.apply_route_update(&RouteUpdateEvent {
            start: point(34.05, -118.24),
            end: point(34.06, -118.23),
            waypoints: Vec::new(),
            route: Vec::new(),
        });
        let json = serde_json::to_value(&draft.route).unwrap();
        assert_eq!(
            json,
            json!({"coordinates": [
                {"latitude": 34.05, "longitude": -118.24},
                {"latitude": 34.06, "longitude": -118.23}
            ]})
        );
    }

    #[test]
    fn combined_colors_drops_blanks_in_order() {
        let mut draft = ChallengeDraft::default();
        draft.color2 = "#FFFFFF".into();
        assert_eq!(draft.combined_colors(), vec!["#FFFFFF".to_string()]);

        draft.color1 = "#000000".into();
        draft.color2 = String::new();
        assert_eq!(draft.combined_colors(), vec!["#000000".to_string()]);

        draft.color1 = String::new();
        assert!(draft.combined_colors().is_empty());

        draft.color1 = "#111111".into();
        draft.color2 = "#222222".into();
        assert_eq!(draft.combined_colors(), vec!["#111111", "#222222"]);
    }

    #[test]
    fn payload_uses_camel_case_and_parsed_numbers() {
        let mut draft = filled();
        draft.color1 = "#111111".into();
        draft.route.coordinates = vec![point(34.05, -118.24)];
        let json = serde_json::to_value(draft.to_payload().unwrap()).unwrap();

        assert_eq!(json["elevationGain"], json!(1200.0));
        assert_eq!(json["difficulty"], json!(4));
        assert_eq!(json["howItWorks"], json!("Walk it"));
        assert_eq!(json["challengeType"], json!("Day Hike"));
        assert_eq!(json["color"], json!(["#111111"]));
        assert_eq!(json["isHide"], json!(false));
        assert_eq!(
            json["route"]["coordinates"][0],
            json!({"latitude": 34.05, "longitude": -118.24})
        );
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn payload_requires_inputs() {
        let mut draft = filled();
        draft.title = "   ".into();
        assert_eq!(draft.to_payload(), Err(DraftError::Required("title")));

        let mut draft = filled();
        draft.distance = "far".into();
        assert!(matches!(
            draft.to_payload(),
            Err(DraftError::InvalidNumber { field: "distance", .. })
        ));
    }

    #[test]
    fn payload_checks_difficulty_range() {
        for bad in ["0", "11", "4.5", "-1"] {
            let mut draft = filled();
            draft.difficulty = bad.into();
            assert_eq!(draft.to_payload(), Err(DraftError::Difficulty(bad.into())));
        }
        let mut draft = filled();
        draft.difficulty = "10".into();
        assert_eq!(draft.to_payload().unwrap().difficulty, 10);
    }

    #[test]
    fn payload_allows_empty_route() {
        let payload = filled().to_payload().unwrap();
        assert!(payload.route.coordinates.is_empty());
    }

    #[test]
    fn record_hydrates_draft() {
        let record: ChallengeRecord = serde_json::from_value(json!({
            "_id": "66a1",
            "title": "Griffith Loop",
            "elevation": 1200,
            "difficulty": "4",
            "howItWorks": "Walk it",
            "countryId": 3,
            "challengeType": "Multi Day",
            "distance": 5.5,
            "price": 19.99,
            "colorGradient": ["#111111", "#222222"],
            "image": "https://cdn.example.com/griffith.jpg",
            "isHide": true,
            "route": {"coordinates": [
                {"latitude": 34.05, "longitude": -118.24},
                {"latitude": 34.055, "longitude": -118.235},
                {"latitude": 34.06, "longitude": -118.23}
            ]},
            "createdAt": "2024-11-30T10:00:00.000Z"
        }))
        .unwrap();

        let draft = ChallengeDraft::from_record(&record);
        assert_eq!(draft.title, "Griffith Loop");
        assert_eq!(draft.elevation_gain, "1200");
        assert_eq!(draft.difficulty, "4");
        assert_eq!(draft.country_id, "3");
        assert_eq!(draft.distance, "5.5");
        assert_eq!(draft.challenge_type, "Multi Day");
        assert_eq!(draft.color1, "#111111");
        assert_eq!(draft.color2, "#222222");
        assert!(draft.is_hide);
        assert!(!draft.with_redemption);
        assert_eq!(draft.route.coordinates.len(), 3);
        assert_eq!(
            record.first_and_last_points(),
            Some((point(34.05, -118.24), point(34.06, -118.23)))
        );
    }

    #[test]
    fn sparse_record_keeps_defaults() {
        let record: ChallengeRecord =
            serde_json::from_value(json!({"_id": "1", "colorGradient": ["#abcdef"]})).unwrap();
        let draft = ChallengeDraft::from_record(&record);
        assert_eq!(draft.challenge_type, "Day Hike");
        assert_eq!(draft.color1, "#abcdef");
        assert_eq!(draft.color2, "");
        assert_eq!(record.first_and_last_points(), None);
    }

    #[test]
    fn listing_flattens_category_map() {
        let body = json!({"data": {
            "Day Hike": [{"_id": "1", "title": "A"}, {"_id": "2", "title": "B"}],
            "Multi Day": [{"_id": "3", "title": "C"}]
        }});
        let mut ids: Vec<String> = records_from_listing(body).into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn listing_accepts_plain_list_and_skips_garbage() {
        let body = json!({"data": [{"_id": "1"}, {"title": "no id"}, [{"_id": "2"}]]});
        let ids: Vec<String> = records_from_listing(body).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn listing_without_data_is_empty() {
        assert!(records_from_listing(json!({"message": "ok"})).is_empty());
    }
}
