use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::directory::ApplicationDirectory;
use super::domain::{FundingBasis, SlotId};
use super::engine::RankingEngine;
use super::limiter::{AttemptDecision, AttemptLimiter};
use crate::pipeline::profile::{ProfileId, ProfileStore};

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardQuery {
    pub(crate) slot: String,
    pub(crate) funding_basis: FundingBasis,
    /// When the caller is an applicant, their own rank is included.
    pub(crate) applicant: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptsQuery {
    pub(crate) applicant: String,
    pub(crate) slot: String,
}

/// Router builder exposing the leaderboard and the attempt check.
pub fn ranking_router<D, P>(
    engine: Arc<RankingEngine<D, P>>,
    limiter: Arc<AttemptLimiter<D>>,
) -> Router
where
    D: ApplicationDirectory + 'static,
    P: ProfileStore + 'static,
{
    Router::new()
        .route("/api/v1/leaderboard", get(leaderboard_handler::<D, P>))
        .with_state(engine)
        .merge(
            Router::new()
                .route(
                    "/api/v1/application-attempts",
                    get(attempts_handler::<D>),
                )
                .with_state(limiter),
        )
}

pub(crate) async fn leaderboard_handler<D, P>(
    State(engine): State<Arc<RankingEngine<D, P>>>,
    Query(query): Query<LeaderboardQuery>,
) -> Response
where
    D: ApplicationDirectory + 'static,
    P: ProfileStore + 'static,
{
    let slot = SlotId(query.slot);
    match engine.leaderboard(&slot, query.funding_basis) {
        Ok(entries) => {
            let own_rank = query.applicant.as_ref().and_then(|applicant| {
                entries
                    .iter()
                    .find(|entry| entry.applicant.0 == *applicant)
                    .map(|entry| entry.rank)
            });

            let mut payload = json!({
                "slot": slot.0,
                "funding_basis": query.funding_basis.label(),
                "entries": entries,
            });
            if let Some(rank) = own_rank {
                payload["own_rank"] = json!(rank);
            }
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn attempts_handler<D>(
    State(limiter): State<Arc<AttemptLimiter<D>>>,
    Query(query): Query<AttemptsQuery>,
) -> Response
where
    D: ApplicationDirectory + 'static,
{
    let applicant = ProfileId(query.applicant);
    let slot = SlotId(query.slot);

    match limiter.can_submit(&applicant, &slot) {
        Ok(AttemptDecision::Allowed) => {
            (StatusCode::OK, axum::Json(json!({ "allowed": true }))).into_response()
        }
        Ok(AttemptDecision::Denied(reason)) => {
            let payload = json!({ "allowed": false, "reason": reason });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
