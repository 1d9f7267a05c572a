//! Competitive ranking of applications for scarce admission slots, and
//! the attempt limiter guarding repeat submissions.

pub mod directory;
pub mod domain;
pub mod engine;
pub mod limiter;
pub mod router;

#[cfg(test)]
mod tests;

pub use directory::{ApplicationDirectory, DirectoryError};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, FundingBasis, RankingEntry, SlotId,
};
pub use engine::{RankingEngine, RankingError};
pub use limiter::{AttemptDecision, AttemptDenialReason, AttemptLimiter, MAX_ATTEMPTS};
pub use router::ranking_router;
