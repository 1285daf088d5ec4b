// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: the client shell's adapters onto
//! the daily update engine and reroll policy.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{PhraseSelection, User};
use crate::services::RerollOutcome;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/selection", get(get_selection))
        .route("/api/daily-update", post(daily_update))
        .route("/api/done", post(toggle_done))
        .route("/api/reroll", post(consume_reroll))
        .route("/api/device", put(update_device))
        .route("/api/account", delete(delete_account))
}

// ─── Responses ───────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: Option<String>,
    pub streak: u32,
    pub rerolls: u32,
    pub done: bool,
    pub timezone: Option<String>,
    pub last_sign_in: String,
    pub updated_phrase_date: String,
}

impl UserResponse {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            streak: user.streak,
            rerolls: user.rerolls,
            done: user.done,
            timezone: user.timezone.clone(),
            last_sign_in: format_utc_rfc3339(user.last_sign_in),
            updated_phrase_date: format_utc_rfc3339(user.updated_phrase_date),
        }
    }
}

/// Today's phrase selection, as the widget and home view render it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub phrase_index: u32,
    pub phrase: String,
    pub letter_variants: Vec<u8>,
}

impl SelectionResponse {
    fn new(state: &AppState, selection: &PhraseSelection) -> Self {
        Self {
            phrase_index: selection.phrase_index,
            phrase: state
                .catalog
                .get(selection.phrase_index)
                .unwrap_or_default()
                .to_string(),
            letter_variants: selection.letter_variants.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUpdateResponse {
    pub user: UserResponse,
    pub selection: SelectionResponse,
    pub selection_changed: bool,
    pub reroll_granted: bool,
    /// `false` means the store write failed; local state still advanced
    /// and the client may retry (non-fatal).
    pub persisted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDoneResponse {
    pub user: UserResponse,
    pub persisted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerollResponse {
    pub user: UserResponse,
    pub selection: SelectionResponse,
    pub persisted: bool,
}

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

// ─── Helpers ─────────────────────────────────────────────────

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = fetch_user(&state, &auth.user_id).await?;
    Ok(Json(UserResponse::from_user(&user)))
}

/// Get today's cached selection without re-deriving it (widget read path).
async fn get_selection(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<SelectionResponse>> {
    let user = fetch_user(&state, &auth.user_id).await?;
    let selection = state.engine.current_selection(&user);
    Ok(Json(SelectionResponse::new(&state, &selection)))
}

// ─── Daily Update ────────────────────────────────────────────

/// Run the once-per-day evaluation: weekly reroll grant, streak rollover
/// and phrase rollover. Invoked on app foreground and on receipt of the
/// silent refresh push.
async fn daily_update(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DailyUpdateResponse>> {
    let now = chrono::Utc::now();
    let user = fetch_user(&state, &auth.user_id).await?;

    let (user, reroll_granted) = state.reroll.check_weekly_grant(user, now).await?;
    let outcome = state.engine.evaluate(user, now).await?;

    state.sessions.publish(&outcome.user);

    Ok(Json(DailyUpdateResponse {
        selection: SelectionResponse::new(&state, &outcome.selection),
        user: UserResponse::from_user(&outcome.user),
        selection_changed: outcome.selection_changed,
        reroll_granted,
        persisted: outcome.persisted,
    }))
}

/// Toggle today's "done" flag (the only path that grows the streak).
async fn toggle_done(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ToggleDoneResponse>> {
    let now = chrono::Utc::now();
    let user = fetch_user(&state, &auth.user_id).await?;

    let outcome = state.engine.toggle_done(user, now).await?;
    state.sessions.publish(&outcome.user);

    Ok(Json(ToggleDoneResponse {
        user: UserResponse::from_user(&outcome.user),
        persisted: outcome.persisted,
    }))
}

/// Spend a reroll credit for an immediate new phrase.
async fn consume_reroll(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<RerollResponse>> {
    let user = fetch_user(&state, &auth.user_id).await?;

    match state.reroll.consume_reroll(user).await? {
        RerollOutcome::Rejected => Err(AppError::BadRequest(
            "No reroll credits available".to_string(),
        )),
        RerollOutcome::Applied {
            user,
            selection,
            persisted,
        } => {
            state.sessions.publish(&user);
            Ok(Json(RerollResponse {
                selection: SelectionResponse::new(&state, &selection),
                user: UserResponse::from_user(&user),
                persisted,
            }))
        }
    }
}

// ─── Device Registration ─────────────────────────────────────

/// Push-delivery details refreshed at login.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdateRequest {
    #[validate(length(min = 1, max = 4096))]
    pub fcm_token: String,
    #[validate(length(min = 1, max = 64))]
    pub timezone: String,
}

/// Refresh the user's push token and timezone.
async fn update_device(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<DeviceUpdateRequest>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.timezone.parse::<Tz>().is_err() {
        return Err(AppError::BadRequest(format!(
            "Unknown timezone: {}",
            payload.timezone
        )));
    }

    let mut user = fetch_user(&state, &auth.user_id).await?;
    user.fcm_token = Some(payload.fcm_token);
    user.timezone = Some(payload.timezone);

    state.db.update_device(&user).await?;
    state.sessions.publish(&user);

    Ok(Json(UserResponse::from_user(&user)))
}

// ─── Account Deletion ────────────────────────────────────────

/// Delete the user's record and clear local state.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %auth.user_id, "User-initiated account deletion");

    state.db.delete_user(&auth.user_id).await?;
    state.selections.remove(&auth.user_id);
    state.sessions.clear(&auth.user_id);

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: "Account deleted. All data has been removed.".to_string(),
    }))
}
