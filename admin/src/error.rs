use thiserror::Error;

use shared::DirectionsError;
use shared::draft::DraftError;
use shared::picker::PickerError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("route lookup failed: {0}")]
    Directions(#[from] DirectionsError),
    #[error("route picker error: {0}")]
    Picker(#[from] PickerError),
    #[error("invalid challenge draft: {0}")]
    Draft(#[from] DraftError),
    #[error("challenge {0} not found")]
    NotFound(String),
    #[error("challenge listing failed: {0}")]
    Listing(String),
}
