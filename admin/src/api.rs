use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use shared::form::LIST_CHALLENGES_PATH;
use shared::draft::records_from_listing;
use shared::{ChallengeRecord, SubmitOutcome, SubmitRequest};

use crate::config::AdminConfig;
use crate::error::AdminError;

/// Client for the challenge administration endpoints.
#[derive(Clone)]
pub struct ChallengeApi {
    http: reqwest::Client,
    root: String,
}

impl ChallengeApi {
    pub fn new(config: &AdminConfig) -> Result<Self, AdminError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            root: config.api_root.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.root)
    }

    /// Sends a create or update request. Never fails: transport problems are
    /// reported as [`SubmitOutcome::Failed`] so the form can show them.
    pub async fn submit(&self, request: &SubmitRequest) -> SubmitOutcome {
        let url = self.url(request.endpoint.path());
        tracing::info!("POST {url}");

        let response = match self.http.post(&url).json(&request.payload).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("challenge request to {url} failed: {err}");
                return SubmitOutcome::transport_error();
            }
        };
        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => {
                let outcome = SubmitOutcome::from_response(status, &body);
                tracing::debug!("{url} answered {status}: {outcome:?}");
                outcome
            }
            Err(err) => {
                tracing::error!("reading response from {url} failed: {err}");
                SubmitOutcome::transport_error()
            }
        }
    }

    /// Fetches every challenge, flattening the per-category groups the
    /// listing endpoint returns.
    pub async fn list(&self) -> Result<Vec<ChallengeRecord>, AdminError> {
        let url = self.url(LIST_CHALLENGES_PATH);
        let response = self.http.post(&url).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(AdminError::Listing(format!("{status}: {message}")));
        }
        let records = records_from_listing(body);
        tracing::info!("fetched {} challenges", records.len());
        Ok(records)
    }

    pub async fn find(&self, id: &str) -> Result<ChallengeRecord, AdminError> {
        self.list()
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| AdminError::NotFound(id.to_string()))
    }
}

pub fn created_date(record: &ChallengeRecord) -> Option<NaiveDate> {
    let raw = record.created_at.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_date_parses_rfc3339() {
        let record: ChallengeRecord =
            serde_json::from_value(json!({"_id": "1", "createdAt": "2024-11-30T23:30:00.000-02:00"}))
                .unwrap();
        assert_eq!(
            created_date(&record),
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );

        let record: ChallengeRecord =
            serde_json::from_value(json!({"_id": "1", "createdAt": "yesterday"})).unwrap();
        assert_eq!(created_date(&record), None);
    }
}
