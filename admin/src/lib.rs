pub mod api;
pub mod config;
pub mod directions;
pub mod error;
pub mod session;
pub mod surface;

pub use api::ChallengeApi;
pub use config::AdminConfig;
pub use directions::DirectionsClient;
pub use error::AdminError;
pub use session::{PickerSession, RoutePlan, submit};
