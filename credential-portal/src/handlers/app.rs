use crate::AppState;
use crate::presentation::Page;
use crate::state::PortalView;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use portal_core::error::AppError;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

pub async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "credential-portal",
        "status": "ok",
    }))
}

pub async fn health_check() -> &'static str {
    "OK"
}

/// Snapshot of the caller's portal: current page, session, notifications,
/// and flow state. Polled by the frontend.
pub async fn portal_state_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PortalView>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let portal = shared.lock().await;
    Ok(Json(PortalView::from_state(&portal)))
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    pub page: Page,
}

pub async fn navigate_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<PortalView>, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let mut portal = shared.lock().await;
    portal.navigate(payload.page);
    Ok(Json(PortalView::from_state(&portal)))
}

pub async fn dismiss_notification_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let mut portal = shared.lock().await;
    if portal.notifications.dismiss(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Notification inconnue: {id}"
        )))
    }
}

/// Serves the live QR artifact of a flow slot as a PNG.
pub async fn qr_handler(
    State(state): State<AppState>,
    session: Session,
    Path(slot): Path<String>,
) -> Result<Response, AppError> {
    let shared = state.portals.for_session(&session).await?;
    let portal = shared.lock().await;

    let artifact = match slot.as_str() {
        "password" => portal.create_account.password_qr(),
        "two-factor" => portal.create_account.two_factor_qr(),
        "renewal" => portal.renewal_qr(),
        other => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Emplacement de QR inconnu: {other}"
            )));
        }
    };

    match artifact {
        Some(qr) => Ok((
            [(header::CONTENT_TYPE, qr.content_type().to_string())],
            qr.bytes().clone(),
        )
            .into_response()),
        None => Err(AppError::NotFound(anyhow::anyhow!(
            "Aucun QR code actif pour cet emplacement"
        ))),
    }
}
