use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::profile::ProfileId;

/// Identifier wrapper for admission applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// A specific specialty at a specific building, the unit of admission
/// capacity applications compete for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub String);

/// Admission track: state-funded or paid. Ranking is computed per basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingBasis {
    Budget,
    Commercial,
}

impl FundingBasis {
    pub const fn label(self) -> &'static str {
        match self {
            FundingBasis::Budget => "budget",
            FundingBasis::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// An admission application as read from the external application
/// store. This pipeline never creates or mutates these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: ProfileId,
    pub slot: SlotId,
    pub funding_basis: FundingBasis,
    /// Positive, 1 is the highest priority.
    pub priority: u32,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// One leaderboard row. Transient: computed fresh per query (modulo the
/// short-lived cache) and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub application_id: ApplicationId,
    pub applicant: ProfileId,
    pub score: Option<f64>,
    pub priority: u32,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub rank: u32,
}
