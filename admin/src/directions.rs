use shared::directions::{DirectionsResponse, walking_path};
use shared::picker::{MapConfig, RouteQuery};
use shared::{DirectionsError, GeoPoint};

use crate::config::AdminConfig;
use crate::error::AdminError;

/// Walking directions over HTTP. One attempt per lookup, no retry.
#[derive(Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    config: MapConfig,
}

impl DirectionsClient {
    pub fn new(config: &AdminConfig) -> Result<Self, AdminError> {
        config.require_token()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config: config.map.clone(),
        })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub async fn walking_route(&self, query: &RouteQuery) -> Result<Vec<GeoPoint>, DirectionsError> {
        tracing::debug!(
            "directions request {}",
            walking_path(query.start, query.end)
        );
        let response = self
            .http
            .get(query.url(&self.config))
            .send()
            .await
            .map_err(|err| DirectionsError::Transport(err.to_string()))?;

        let status = response.status();
        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|err| DirectionsError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(DirectionsError::Transport(format!(
                "{status}: {}",
                body.message.or(body.code).unwrap_or_default()
            )));
        }

        let path = body.into_first_path()?;
        tracing::debug!("directions returned {} points", path.len());
        Ok(path)
    }
}
