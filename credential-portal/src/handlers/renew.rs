use crate::AppState;
use crate::handlers::account::{ActionResponse, UsernameRequest};
use crate::models::outcome::Operation;
use crate::presentation;
use crate::state::PortalView;
use axum::{Json, extract::State};
use portal_core::error::AppError;
use tower_sessions::Session;

/// Regenerates the password only; the 2FA secret is never touched here.
pub async fn renew_password_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UsernameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let outcome = state.orchestrator.renew_password(&payload.username).await;

    let mut portal = shared.lock().await;
    let view = presentation::apply_outcome(&shared, &mut portal, Operation::RenewPassword, outcome);
    Ok(Json(ActionResponse {
        outcome: view,
        portal: PortalView::from_state(&portal),
    }))
}
