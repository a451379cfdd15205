use crate::{Error, decode::Artifact, transport::UploadMessage};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// State that lives for exactly one submission.
#[derive(Debug)]
pub struct SubmissionContext {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub prediction_url: String,
    consent: bool,
    pub message: UploadMessage,
}

impl SubmissionContext {
    pub fn new(prediction_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            prediction_url: prediction_url.into(),
            consent: false,
            message: UploadMessage::new(),
        }
    }

    pub fn elapsed(&self) -> TimeDelta {
        Utc::now() - self.started_at
    }

    pub fn grant_consent(&mut self, granted: bool) {
        self.consent = granted;
    }

    /// Returns the consent flag and clears it.
    pub fn take_consent(&mut self) -> bool {
        std::mem::replace(&mut self.consent, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NoServiceSelected,
    ConsentDeclined,
}

#[derive(Debug)]
pub struct PartFailure {
    pub index: usize,
    pub tag: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    pub artifacts: Vec<Artifact>,
    /// Reply indices whose type tag has no decoder.
    pub skipped: Vec<usize>,
    pub failures: Vec<PartFailure>,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    Aborted(AbortReason),
    Completed(SubmissionReport),
}

impl SubmissionOutcome {
    pub fn report(&self) -> Option<&SubmissionReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Aborted(_) => None,
        }
    }
}
