use chrono::{DateTime, Local};
use serde::Serialize;

use super::track::TrackReference;

/// Result of processing one reference. Exactly one is produced per reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success {
        reference: TrackReference,
        title: String,
    },
    Failure {
        reference: TrackReference,
        message: String,
    },
}

impl ProcessingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessEntry {
    pub reference: TrackReference,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub reference: TrackReference,
    pub message: String,
}

/// Aggregate of one batch run, entries in completion order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub successes: Vec<SuccessEntry>,
    pub failures: Vec<FailureEntry>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            successes: Vec::new(),
            failures: Vec::new(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, outcome: ProcessingOutcome) {
        match outcome {
            ProcessingOutcome::Success { reference, title } => {
                self.successes.push(SuccessEntry { reference, title })
            }
            ProcessingOutcome::Failure { reference, message } => {
                self.failures.push(FailureEntry { reference, message })
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn processed(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// true once every reference of the run has an outcome
    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }
}
