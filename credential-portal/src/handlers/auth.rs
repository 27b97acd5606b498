use crate::AppState;
use crate::handlers::account::ActionResponse;
use crate::models::notification::Severity;
use crate::models::outcome::Operation;
use crate::orchestrator::flows::AuthenticateState;
use crate::presentation::{self, Page};
use crate::state::PortalView;
use axum::{Json, extract::State};
use portal_core::error::AppError;
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub two_factor_code: String,
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    {
        // Visible to concurrent /state polls while the backend call is out.
        let mut portal = shared.lock().await;
        portal.authenticate = AuthenticateState::Submitted;
    }
    let outcome = state
        .orchestrator
        .authenticate(
            &payload.username,
            &payload.password,
            &payload.two_factor_code,
        )
        .await;

    let mut portal = shared.lock().await;
    let view = presentation::apply_outcome(&shared, &mut portal, Operation::Authenticate, outcome);
    Ok(Json(ActionResponse {
        outcome: view,
        portal: PortalView::from_state(&portal),
    }))
}

/// Clears the identity unconditionally and returns to the home page with a
/// farewell notification.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PortalView>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let mut portal = shared.lock().await;

    portal.session.logout();
    portal.navigate(Page::Home);
    portal
        .notifications
        .push(Arc::clone(&shared), Severity::Info, "Déconnexion réussie");

    Ok(Json(PortalView::from_state(&portal)))
}
