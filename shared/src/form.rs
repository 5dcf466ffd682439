use serde::Serialize;

use crate::ApiError;
use crate::draft::{ChallengeDraft, ChallengePayload, ChallengeRecord, DraftError, FieldInput};
use crate::picker::{PickerSeed, RouteUpdateEvent};

pub const ADD_CHALLENGE_PATH: &str = "/v1/challenge/admin/add-challenge";
pub const EDIT_CHALLENGE_PATH: &str = "/v1/challenge/admin/edit-challenge";
pub const LIST_CHALLENGES_PATH: &str = "/v1/challenge/get-challenges";
pub const LISTING_SCREEN: &str = "/trail";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Create,
    Update,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Create => ADD_CHALLENGE_PATH,
            Endpoint::Update => EDIT_CHALLENGE_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitRequest {
    #[serde(skip)]
    pub endpoint: Endpoint,
    #[serde(flatten)]
    pub payload: ChallengePayload,
}

/// How the server answered a create/update request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// 2xx with a usable body.
    Accepted(serde_json::Value),
    /// 2xx without a success indicator.
    Rejected { message: Option<String> },
    /// Non-2xx status or the request never completed.
    Failed { message: Option<String> },
}

impl SubmitOutcome {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let body: Option<serde_json::Value> = serde_json::from_slice(body).ok();
        let message = body
            .as_ref()
            .and_then(|value| serde_json::from_value::<ApiError>(value.clone()).ok())
            .map(|err| err.message)
            .filter(|message| !message.is_empty());

        if !(200..300).contains(&status) {
            return SubmitOutcome::Failed { message };
        }
        match body {
            Some(value) if !is_falsy(&value) => SubmitOutcome::Accepted(value),
            _ => SubmitOutcome::Rejected { message },
        }
    }

    pub fn transport_error() -> Self {
        SubmitOutcome::Failed { message: None }
    }
}

/// Bodies that carry no success indicator: nothing, `null`, `false`, zero,
/// `""`, or an object with `"success": false`.
fn is_falsy(body: &serde_json::Value) -> bool {
    use serde_json::Value;

    match body {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Object(_) => body.get("success") == Some(&Value::Bool(false)),
        Value::Bool(true) | Value::Array(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTransition {
    Stay,
    NavigateToListing,
}

/// Create/edit controller for a challenge: owns the draft, the picker seeds
/// and the submission state.
#[derive(Debug, Clone)]
pub struct ChallengeForm {
    mode: FormMode,
    draft: ChallengeDraft,
    seed: PickerSeed,
    pending: bool,
    notice: Option<Notice>,
}

impl ChallengeForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: ChallengeDraft::default(),
            seed: PickerSeed::default(),
            pending: false,
            notice: None,
        }
    }

    pub fn edit(record: &ChallengeRecord) -> Self {
        let seed = record
            .first_and_last_points()
            .map(|(start, end)| PickerSeed {
                start: Some(start),
                end: Some(end),
            })
            .unwrap_or_default();
        Self {
            mode: FormMode::Edit {
                id: record.id.clone(),
            },
            draft: ChallengeDraft::from_record(record),
            seed,
            pending: false,
            notice: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &ChallengeDraft {
        &self.draft
    }

    pub fn seed(&self) -> PickerSeed {
        self.seed
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_field(&mut self, name: &str, input: FieldInput) -> Result<(), DraftError> {
        self.draft.set_field(name, input)
    }

    pub fn apply_route_update(&mut self, event: &RouteUpdateEvent) {
        self.draft.apply_route_update(event);
        if matches!(self.mode, FormMode::Edit { .. }) {
            self.seed = PickerSeed {
                start: Some(event.start),
                end: Some(event.end),
            };
        }
    }

    /// Builds the request to send, or `None` when a submission is already in
    /// flight or the draft fails input validation (the reason is left in
    /// [`ChallengeForm::notice`]).
    pub fn begin_submit(&mut self) -> Option<SubmitRequest> {
        if self.pending {
            tracing::debug!("submission already in flight, ignoring");
            return None;
        }
        self.notice = None;

        let mut payload = match self.draft.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.notice = Some(Notice::Error(err.to_string()));
                return None;
            }
        };
        let endpoint = match &self.mode {
            FormMode::Create => Endpoint::Create,
            FormMode::Edit { id } => {
                payload.id = Some(id.clone());
                Endpoint::Update
            }
        };

        self.pending = true;
        tracing::info!(
            "submitting challenge `{}` with {} route points",
            payload.title,
            payload.route.coordinates.len()
        );
        Some(SubmitRequest { endpoint, payload })
    }

    pub fn finish_submit(&mut self, outcome: SubmitOutcome) -> FormTransition {
        self.pending = false;
        let (verb, gerund, past) = match self.mode {
            FormMode::Create => ("add", "adding", "added"),
            FormMode::Edit { .. } => ("update", "updating", "updated"),
        };

        match outcome {
            SubmitOutcome::Accepted(body) => {
                tracing::info!("challenge {past}: {body}");
                self.notice = Some(Notice::Success(format!(
                    "Challenge {past} successfully!"
                )));
                if self.mode == FormMode::Create {
                    self.draft = ChallengeDraft::default();
                    self.seed = PickerSeed::default();
                }
                FormTransition::NavigateToListing
            }
            SubmitOutcome::Rejected { message } => {
                let message = message.unwrap_or_else(|| "Unexpected error.".to_string());
                tracing::warn!("challenge {verb} rejected: {message}");
                self.notice = Some(Notice::Error(format!(
                    "Failed to {verb} challenge: {message}"
                )));
                FormTransition::Stay
            }
            SubmitOutcome::Failed { message } => {
                let message = message.unwrap_or_else(|| "Please try again.".to_string());
                tracing::warn!("challenge {verb} failed: {message}");
                self.notice = Some(Notice::Error(format!(
                    "Error {gerund} challenge: {message}"
                )));
                FormTransition::Stay
            }
        }
    }
}
