//! Matchmaking handlers
//!
//! Entering and leaving the waiting pool, plus the caller's current state.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use vibe_service::{
    dto::{MatchRequest, MatchStatusResponse, PoolQuery, PoolSnapshotResponse, WaitQuery},
    MatchCoordinator, MatchStatus, PoolManager,
};

use crate::extractors::{AuthUser, ModePath, ValidatedJson, ValidatedQuery};
use crate::response::{Accepted, ApiResult, NoContent};
use crate::state::AppState;

/// Start searching for a counterpart
///
/// POST /match/requests
///
/// 200 when a pairing exists (new or already active), 202 while waiting.
pub async fn request_match(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<MatchRequest>,
) -> ApiResult<Response> {
    let ctx = state.match_context();
    let status = MatchCoordinator::new(ctx)
        .request_match(auth.user_id, body.mode)
        .await?;

    let view = MatchStatusResponse::for_viewer(&status, auth.user_id, ctx.now());
    Ok(match status {
        MatchStatus::Waiting { .. } => Accepted(Json(view)).into_response(),
        _ => Json(view).into_response(),
    })
}

/// Stop searching
///
/// DELETE /match/requests
pub async fn cancel_match(State(state): State<AppState>, auth: AuthUser) -> ApiResult<NoContent> {
    MatchCoordinator::new(state.match_context())
        .cancel(auth.user_id)
        .await?;
    Ok(NoContent)
}

/// GET /match/status
pub async fn match_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MatchStatusResponse>> {
    let ctx = state.match_context();
    let status = MatchCoordinator::new(ctx).status(auth.user_id).await?;
    Ok(Json(MatchStatusResponse::for_viewer(&status, auth.user_id, ctx.now())))
}

/// Long-poll until another client's arbiter pass pairs the caller
///
/// GET /match/wait?timeout_secs=
pub async fn wait_for_match(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<WaitQuery>,
) -> ApiResult<Json<MatchStatusResponse>> {
    let ctx = state.match_context();
    let coordinator = MatchCoordinator::new(ctx);

    let status = match coordinator
        .wait_for_pairing(auth.user_id, query.timeout())
        .await?
    {
        Some(pairing) => MatchStatus::Paired { pairing },
        None => coordinator.status(auth.user_id).await?,
    };

    Ok(Json(MatchStatusResponse::for_viewer(&status, auth.user_id, ctx.now())))
}

/// Oldest-first snapshot of one mode's pool
///
/// GET /match/pool/{mode}?limit=
pub async fn pool_snapshot(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(path): Path<ModePath>,
    ValidatedQuery(query): ValidatedQuery<PoolQuery>,
) -> ApiResult<Json<PoolSnapshotResponse>> {
    let mode = path.mode()?;
    let entries = PoolManager::new(state.match_context())
        .list(mode, query.limit())
        .await?;
    Ok(Json(PoolSnapshotResponse::new(mode, &entries)))
}
