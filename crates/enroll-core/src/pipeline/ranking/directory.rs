use super::domain::{Application, FundingBasis, SlotId};
use crate::pipeline::profile::ProfileId;

/// Read-only view over the external application store. Application
/// rows are created and deleted by out-of-scope functionality; the
/// ranking engine and the attempt limiter only read them.
pub trait ApplicationDirectory: Send + Sync {
    /// Applications competing for one slot on one funding basis.
    fn for_slot(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
    ) -> Result<Vec<Application>, DirectoryError>;

    /// All applications, any status, one applicant has ever made
    /// against one slot.
    fn attempts(
        &self,
        applicant: &ProfileId,
        slot: &SlotId,
    ) -> Result<Vec<Application>, DirectoryError>;
}

/// Error enumeration for application directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("application directory unavailable: {0}")]
    Unavailable(String),
}
