use crate::AppState;
use crate::models::outcome::{Operation, OutcomeView};
use crate::presentation;
use crate::state::PortalView;
use axum::{Json, extract::State};
use portal_core::error::AppError;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

#[derive(Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

/// Outcome of a lifecycle action plus the refreshed portal snapshot.
#[derive(Serialize)]
pub struct ActionResponse {
    #[serde(flatten)]
    pub outcome: OutcomeView,
    pub portal: PortalView,
}

pub async fn create_password_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UsernameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let outcome = state.orchestrator.create_password(&payload.username).await;

    let mut portal = shared.lock().await;
    let view = presentation::apply_outcome(&shared, &mut portal, Operation::CreatePassword, outcome);
    Ok(Json(ActionResponse {
        outcome: view,
        portal: PortalView::from_state(&portal),
    }))
}

pub async fn create_two_factor_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UsernameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let outcome = state.orchestrator.create_two_factor(&payload.username).await;

    let mut portal = shared.lock().await;
    let view =
        presentation::apply_outcome(&shared, &mut portal, Operation::CreateTwoFactor, outcome);
    Ok(Json(ActionResponse {
        outcome: view,
        portal: PortalView::from_state(&portal),
    }))
}
