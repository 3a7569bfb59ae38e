//! Pairing handlers
//!
//! Consent votes, skips and countdown expiry. Only the two participants may
//! see or act on a pairing.

use axum::{
    extract::{Path, State},
    Json,
};
use vibe_service::{
    dto::{AbandonResponse, ConsentResponse, PairingResponse},
    MatchCoordinator,
};

use crate::extractors::{AuthUser, PairingIdPath};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /pairings/{pairing_id}
pub async fn get_pairing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PairingIdPath>,
) -> ApiResult<Json<PairingResponse>> {
    let pairing_id = path.pairing_id()?;
    let ctx = state.match_context();

    let pairing = MatchCoordinator::new(ctx)
        .get_pairing(pairing_id, auth.user_id)
        .await?;

    Ok(Json(PairingResponse::for_viewer(&pairing, auth.user_id, ctx.now())))
}

/// Vote to reveal each other
///
/// POST /pairings/{pairing_id}/consent
pub async fn submit_consent(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PairingIdPath>,
) -> ApiResult<Json<ConsentResponse>> {
    let pairing_id = path.pairing_id()?;
    let ctx = state.match_context();

    let result = MatchCoordinator::new(ctx)
        .vote(pairing_id, auth.user_id)
        .await?;

    Ok(Json(ConsentResponse::for_viewer(&result, auth.user_id, ctx.now())))
}

/// End the pairing early; costs the skipper
///
/// POST /pairings/{pairing_id}/skip
pub async fn skip_pairing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PairingIdPath>,
) -> ApiResult<Json<AbandonResponse>> {
    let pairing_id = path.pairing_id()?;
    let ctx = state.match_context();

    let result = MatchCoordinator::new(ctx)
        .skip(pairing_id, auth.user_id)
        .await?;

    Ok(Json(AbandonResponse::for_viewer(&result, auth.user_id, ctx.now())))
}

/// The caller's countdown reached zero
///
/// POST /pairings/{pairing_id}/expire
pub async fn expire_pairing(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<PairingIdPath>,
) -> ApiResult<Json<AbandonResponse>> {
    let pairing_id = path.pairing_id()?;
    let ctx = state.match_context();

    let result = MatchCoordinator::new(ctx)
        .expire(pairing_id, auth.user_id)
        .await?;

    Ok(Json(AbandonResponse::for_viewer(&result, auth.user_id, ctx.now())))
}
