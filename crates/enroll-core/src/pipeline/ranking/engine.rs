use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use super::directory::{ApplicationDirectory, DirectoryError};
use super::domain::{FundingBasis, RankingEntry, SlotId};
use crate::pipeline::profile::{ProfileId, ProfileStore, ProfileStoreError};

struct CacheEntry {
    computed_at: Instant,
    entries: Vec<RankingEntry>,
}

/// Orders competing applications for one slot and funding basis.
///
/// Ordering precedence: descending applicant score (higher is better,
/// absent score sorts last), ascending priority (1 beats 2), ascending
/// submission time. Rank is the 1-based position in that total order.
///
/// A TTL cache keyed by (slot, basis) fronts the computation. Entries
/// expire on TTL only, never on write, so a leaderboard can lag a
/// mutation by up to the TTL. A zero TTL disables caching.
pub struct RankingEngine<D, P> {
    directory: Arc<D>,
    profiles: Arc<P>,
    cache: Mutex<HashMap<(SlotId, FundingBasis), CacheEntry>>,
    ttl: Duration,
}

impl<D, P> RankingEngine<D, P>
where
    D: ApplicationDirectory,
    P: ProfileStore,
{
    pub fn new(directory: Arc<D>, profiles: Arc<P>, ttl: Duration) -> Self {
        Self {
            directory,
            profiles,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The full ordered leaderboard for a slot and funding basis.
    pub fn leaderboard(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
    ) -> Result<Vec<RankingEntry>, RankingError> {
        if self.ttl > Duration::ZERO {
            let cache = self.cache.lock().expect("ranking cache mutex poisoned");
            if let Some(cached) = cache.get(&(slot.clone(), basis)) {
                if cached.computed_at.elapsed() < self.ttl {
                    return Ok(cached.entries.clone());
                }
            }
        }

        let entries = self.compute(slot, basis)?;

        if self.ttl > Duration::ZERO {
            let mut cache = self.cache.lock().expect("ranking cache mutex poisoned");
            cache.insert(
                (slot.clone(), basis),
                CacheEntry {
                    computed_at: Instant::now(),
                    entries: entries.clone(),
                },
            );
        }

        Ok(entries)
    }

    /// 1-based position of one applicant's application on the
    /// leaderboard, or `None` when they have none there.
    pub fn rank_of(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
        applicant: &ProfileId,
    ) -> Result<Option<u32>, RankingError> {
        Ok(self
            .leaderboard(slot, basis)?
            .into_iter()
            .find(|entry| &entry.applicant == applicant)
            .map(|entry| entry.rank))
    }

    fn compute(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
    ) -> Result<Vec<RankingEntry>, RankingError> {
        let applications = self.directory.for_slot(slot, basis)?;

        let mut entries = Vec::with_capacity(applications.len());
        for application in applications {
            let score = self
                .profiles
                .fetch(&application.applicant)?
                .and_then(|profile| profile.calculated_average_grade);

            entries.push(RankingEntry {
                application_id: application.id,
                applicant: application.applicant,
                score,
                priority: application.priority,
                status: application.status.label(),
                created_at: application.created_at,
                rank: 0,
            });
        }

        entries.sort_by(|a, b| {
            score_descending(a.score, b.score)
                .then_with(|| a.priority.cmp(&b.priority))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = index as u32 + 1;
        }

        debug!(slot = %slot.0, basis = basis.label(), entries = entries.len(), "leaderboard computed");
        Ok(entries)
    }
}

/// Higher score first; an application whose applicant has no extracted
/// score ranks after every scored one.
fn score_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Error raised by the ranking engine.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Profiles(#[from] ProfileStoreError),
}
