//! Authentication route handlers.
//!
//! Handles registration, login and logout against local password accounts.
//! A successful login or registration hands back whatever the order flow
//! parked in the session before the customer was sent to log in.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::checkout::{Checkpoint, resume};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// The user now in the session plus the resumed checkpoint.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: CurrentUser,
    pub checkpoint: Checkpoint,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<CurrentUser>,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/register`
///
/// Creates the account and logs it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let details = Registration {
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
    };
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password, details)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");
    let response = start_session(&session, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let user = match AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    Ok(Json(start_session(&session, user).await?))
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse { user })
}

async fn start_session(session: &Session, user: CurrentUser) -> Result<SessionResponse> {
    // Read the checkpoint after the id is cycled; the data carries over.
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let checkpoint = resume(session).await?;
    if !checkpoint.is_empty() {
        tracing::info!(
            user_id = %user.id,
            has_draft = checkpoint.order_draft.is_some(),
            "Resuming parked checkpoint"
        );
    }

    Ok(SessionResponse { user, checkpoint })
}
