use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::pipeline::profile::{ApplicantProfile, ProfileId, ProfileStore, ProfileStoreError};
use crate::pipeline::ranking::directory::{ApplicationDirectory, DirectoryError};
use crate::pipeline::ranking::domain::{
    Application, ApplicationId, ApplicationStatus, FundingBasis, SlotId,
};
use crate::pipeline::ranking::engine::RankingEngine;
use crate::pipeline::ranking::limiter::AttemptLimiter;

#[derive(Default)]
pub(super) struct MemoryDirectory {
    applications: Mutex<Vec<Application>>,
}

impl MemoryDirectory {
    pub(super) fn push(&self, application: Application) {
        self.applications
            .lock()
            .expect("directory mutex poisoned")
            .push(application);
    }
}

impl ApplicationDirectory for MemoryDirectory {
    fn for_slot(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
    ) -> Result<Vec<Application>, DirectoryError> {
        Ok(self
            .applications
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .filter(|application| &application.slot == slot && application.funding_basis == basis)
            .cloned()
            .collect())
    }

    fn attempts(
        &self,
        applicant: &ProfileId,
        slot: &SlotId,
    ) -> Result<Vec<Application>, DirectoryError> {
        Ok(self
            .applications
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .filter(|application| {
                &application.applicant == applicant && &application.slot == slot
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfiles {
    profiles: Mutex<HashMap<ProfileId, ApplicantProfile>>,
}

impl MemoryProfiles {
    pub(super) fn with_score(&self, id: &str, score: Option<f64>) {
        let id = ProfileId(id.to_string());
        let mut profile = ApplicantProfile::new(id.clone());
        profile.calculated_average_grade = score;
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(id, profile);
    }
}

impl ProfileStore for MemoryProfiles {
    fn fetch(&self, id: &ProfileId) -> Result<Option<ApplicantProfile>, ProfileStoreError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(id)
            .cloned())
    }

    fn set_current_job(
        &self,
        id: &ProfileId,
        job: &crate::pipeline::extraction::domain::JobId,
    ) -> Result<(), ProfileStoreError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.get_mut(id).ok_or(ProfileStoreError::NotFound)?;
        profile.current_job_id = Some(job.clone());
        Ok(())
    }

    fn apply_score(
        &self,
        id: &ProfileId,
        job: &crate::pipeline::extraction::domain::JobId,
        score: Option<f64>,
    ) -> Result<bool, ProfileStoreError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.get_mut(id).ok_or(ProfileStoreError::NotFound)?;
        if profile.current_job_id.as_ref() != Some(job) {
            return Ok(false);
        }
        profile.calculated_average_grade = score;
        Ok(true)
    }
}

pub(super) fn created(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().expect("valid time")
}

pub(super) fn application(
    id: &str,
    applicant: &str,
    slot: &str,
    basis: FundingBasis,
    priority: u32,
    status: ApplicationStatus,
    created_secs: i64,
) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        applicant: ProfileId(applicant.to_string()),
        slot: SlotId(slot.to_string()),
        funding_basis: basis,
        priority,
        status,
        created_at: created(created_secs),
    }
}

pub(super) fn build_engine(
    ttl: Duration,
) -> (
    Arc<MemoryDirectory>,
    Arc<MemoryProfiles>,
    RankingEngine<MemoryDirectory, MemoryProfiles>,
) {
    let directory = Arc::new(MemoryDirectory::default());
    let profiles = Arc::new(MemoryProfiles::default());
    let engine = RankingEngine::new(directory.clone(), profiles.clone(), ttl);
    (directory, profiles, engine)
}

pub(super) fn build_limiter() -> (Arc<MemoryDirectory>, AttemptLimiter<MemoryDirectory>) {
    let directory = Arc::new(MemoryDirectory::default());
    let limiter = AttemptLimiter::new(directory.clone());
    (directory, limiter)
}

/// Three-way fixture: C outscores everyone, A and B tie on score and
/// separate on priority.
pub(super) fn seed_three_way(directory: &MemoryDirectory, profiles: &MemoryProfiles) {
    profiles.with_score("alice", Some(4.5));
    profiles.with_score("bella", Some(4.5));
    profiles.with_score("clara", Some(4.8));

    directory.push(application(
        "app-a",
        "alice",
        "slot-1",
        FundingBasis::Budget,
        1,
        ApplicationStatus::Pending,
        10,
    ));
    directory.push(application(
        "app-b",
        "bella",
        "slot-1",
        FundingBasis::Budget,
        2,
        ApplicationStatus::Pending,
        5,
    ));
    directory.push(application(
        "app-c",
        "clara",
        "slot-1",
        FundingBasis::Budget,
        5,
        ApplicationStatus::Pending,
        20,
    ));
}
