//! Types and pure logic shared by the admin CLI and the web frontend.

pub mod directions;
pub mod draft;
pub mod form;
pub mod geo;
pub mod picker;

use serde::{Deserialize, Serialize};

pub use directions::{DirectionsError, DirectionsResponse};
pub use draft::{ChallengeDraft, ChallengePayload, ChallengeRecord, FieldInput, RouteCoordinates};
pub use form::{ChallengeForm, FormTransition, Notice, SubmitOutcome, SubmitRequest};
pub use geo::GeoPoint;
pub use picker::{MapConfig, MapSurface, PickerAction, RoutePicker, RouteUpdateEvent};

/// Error body returned by the challenge API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
