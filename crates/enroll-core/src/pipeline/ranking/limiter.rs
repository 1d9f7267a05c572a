use std::sync::Arc;

use serde::Serialize;

use super::directory::{ApplicationDirectory, DirectoryError};
use super::domain::{ApplicationStatus, SlotId};
use crate::pipeline::profile::ProfileId;

/// Total applications one applicant may ever make against one slot,
/// counting rejected ones.
pub const MAX_ATTEMPTS: usize = 3;

/// Precondition check consulted by the application-submission flow.
/// Reads the directory, never mutates it.
pub struct AttemptLimiter<D> {
    directory: Arc<D>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptDenialReason {
    /// All three lifetime attempts for this (applicant, slot) pair are
    /// used up, whatever their statuses.
    AttemptsExhausted,
    /// A pending or accepted application for the pair already exists;
    /// only one non-rejected application is allowed at a time.
    ActiveApplicationExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    Allowed,
    Denied(AttemptDenialReason),
}

impl AttemptDecision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, AttemptDecision::Allowed)
    }
}

impl<D> AttemptLimiter<D>
where
    D: ApplicationDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub fn can_submit(
        &self,
        applicant: &ProfileId,
        slot: &SlotId,
    ) -> Result<AttemptDecision, DirectoryError> {
        let attempts = self.directory.attempts(applicant, slot)?;

        if attempts.len() >= MAX_ATTEMPTS {
            return Ok(AttemptDecision::Denied(
                AttemptDenialReason::AttemptsExhausted,
            ));
        }

        if attempts
            .iter()
            .any(|application| application.status != ApplicationStatus::Rejected)
        {
            return Ok(AttemptDecision::Denied(
                AttemptDenialReason::ActiveApplicationExists,
            ));
        }

        Ok(AttemptDecision::Allowed)
    }
}
