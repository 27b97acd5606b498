use crate::config::CredentialServiceSettings;
use crate::models::qr::QrArtifact;
use crate::models::session::AuthenticatedSession;
use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy raised by the credential service boundary.
///
/// Every backend response maps to exactly one variant; the orchestrator alone
/// decides flow transitions from them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Expired(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),
}

/// Response body shape, decided once at the boundary by content-type and
/// never inferred downstream.
#[derive(Debug)]
pub enum ApiBody {
    Image(Bytes),
    Json(serde_json::Value),
    Text(String),
}

struct ApiResponse {
    status: StatusCode,
    content_type: String,
    body: ApiBody,
}

#[derive(Debug, Deserialize)]
struct AuthEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<AuthUserPayload>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUserPayload {
    username: String,
    days_until_expiration: u32,
}

/// Typed client for the remote credential-generation backend.
///
/// Translates lifecycle intents into backend calls and normalizes every
/// response into the `CredentialError` taxonomy. Holds no credential state.
pub struct CredentialClient {
    client: Client,
    settings: CredentialServiceSettings,
}

impl CredentialClient {
    pub fn new(settings: CredentialServiceSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    /// Requests password issuance for a username with no existing record.
    pub async fn create_password(&self, username: &str) -> Result<QrArtifact, CredentialError> {
        self.request_qr(
            "/generate-password-qrcode",
            serde_json::json!({ "username": username }),
        )
        .await
    }

    /// Requests TOTP secret issuance. The backend rejects this with not-found
    /// until a password record exists for the username.
    pub async fn create_two_factor(&self, username: &str) -> Result<QrArtifact, CredentialError> {
        self.request_qr(
            "/generate-2fa-secret",
            serde_json::json!({ "username": username, "renew": false }),
        )
        .await
    }

    /// Regenerates only the password and resets the validity window. Any
    /// existing 2FA secret is left untouched by the backend.
    pub async fn renew_password(&self, username: &str) -> Result<QrArtifact, CredentialError> {
        self.request_qr(
            "/renew-password-qrcode",
            serde_json::json!({ "username": username }),
        )
        .await
    }

    /// Validates all three factors jointly; the call is a single indivisible
    /// request and never partially succeeds.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, CredentialError> {
        let response = self
            .post(
                "/auth-user",
                serde_json::json!({
                    "username": username,
                    "password": password,
                    "twoFactorCode": code,
                }),
            )
            .await?;

        let response = Self::read_body(response).await?;

        // The envelope is authoritative regardless of the HTTP status: some
        // backend revisions pair `{"status": "expired", ...}` with a 401.
        if let ApiBody::Json(value) = &response.body {
            if let Ok(envelope) = serde_json::from_value::<AuthEnvelope>(value.clone()) {
                return Self::resolve_auth_envelope(envelope);
            }
        }

        if !response.status.is_success() {
            return Err(Self::classify_failure(response.status, &response.body));
        }
        Err(CredentialError::Transport(
            "Réponse d'authentification invalide (JSON attendu)".to_string(),
        ))
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, CredentialError> {
        let url = format!("{}{}", self.settings.url, path);

        self.client
            .post(&url)
            .timeout(Duration::from_secs(self.settings.timeout_seconds))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                CredentialError::Transport(format!("Erreur réseau: {e}"))
            })
    }

    /// Reads the body once, tagging it by content-type. Non-image bodies are
    /// parsed structured-first with a raw-text fallback.
    async fn read_body(response: reqwest::Response) -> Result<ApiResponse, CredentialError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CredentialError::Transport(format!("Erreur réseau: {e}")))?;

        let body = if content_type.starts_with("image/") {
            ApiBody::Image(bytes)
        } else {
            match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(value) => ApiBody::Json(value),
                Err(_) => ApiBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }

    async fn request_qr(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<QrArtifact, CredentialError> {
        let response = self.post(path, body).await?;
        let response = Self::read_body(response).await?;

        if !response.status.is_success() {
            return Err(Self::classify_failure(response.status, &response.body));
        }

        match response.body {
            ApiBody::Image(bytes) if !bytes.is_empty() => {
                tracing::debug!(size = bytes.len(), "QR code received");
                Ok(QrArtifact::new(bytes, response.content_type))
            }
            ApiBody::Image(_) => Err(CredentialError::Transport(
                "QR code vide reçu de l'API".to_string(),
            )),
            _ => Err(CredentialError::Transport(
                "Réponse inattendue du service (image attendue)".to_string(),
            )),
        }
    }

    /// Maps a non-2xx response to exactly one taxonomy variant. A structured
    /// `code` discriminant wins; matching on localized message text is kept
    /// only as a compatibility shim for backends that predate the contract.
    fn classify_failure(status: StatusCode, body: &ApiBody) -> CredentialError {
        let (code, message) = match body {
            ApiBody::Json(value) => (
                value
                    .get("code")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Erreur API: {}", status.as_u16())),
            ),
            ApiBody::Text(text) if !text.trim().is_empty() => (None, text.trim().to_string()),
            _ => (None, format!("Erreur API: {}", status.as_u16())),
        };

        if let Some(code) = code {
            match code.as_str() {
                "already_exists" => return CredentialError::AlreadyExists(message),
                "not_found" => return CredentialError::NotFound(message),
                "expired" => return CredentialError::Expired(message),
                "validation" => return CredentialError::Validation(message),
                other => {
                    tracing::warn!(code = other, "Unknown error code from credential service");
                }
            }
        }

        // Compatibility shim: older backends only signal these cases through
        // localized message text.
        if message.contains("existe déjà") {
            return CredentialError::AlreadyExists(message);
        }
        if message.contains("n'existe pas") || message.contains("does not exist") {
            return CredentialError::NotFound(message);
        }

        match status {
            StatusCode::CONFLICT => CredentialError::AlreadyExists(message),
            StatusCode::NOT_FOUND => CredentialError::NotFound(message),
            s if s.is_client_error() => CredentialError::Validation(message),
            _ => CredentialError::Transport(message),
        }
    }

    fn resolve_auth_envelope(
        envelope: AuthEnvelope,
    ) -> Result<AuthenticatedSession, CredentialError> {
        let message = envelope
            .message
            .unwrap_or_else(|| "Échec de l'authentification".to_string());

        match envelope.status.as_str() {
            "success" => match envelope.user {
                Some(user) => Ok(AuthenticatedSession {
                    username: user.username,
                    days_until_expiration: user.days_until_expiration,
                }),
                None => Err(CredentialError::Transport(
                    "Réponse d'authentification invalide (utilisateur manquant)".to_string(),
                )),
            },
            "expired" => Err(CredentialError::Expired(message)),
            // Some backend revisions flag expiry through the action hint only.
            "error" if envelope.action.as_deref() == Some("renew_credentials") => {
                Err(CredentialError::Expired(message))
            }
            _ => Err(CredentialError::Rejected(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_code_wins_over_status() {
        let body = ApiBody::Json(serde_json::json!({
            "code": "not_found",
            "message": "bob n'existe pas"
        }));
        let err = CredentialClient::classify_failure(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err, CredentialError::NotFound("bob n'existe pas".into()));
    }

    #[test]
    fn french_already_exists_shim_applies_to_plain_text() {
        let body = ApiBody::Text("alice existe déjà".to_string());
        let err = CredentialClient::classify_failure(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err, CredentialError::AlreadyExists("alice existe déjà".into()));
    }

    #[test]
    fn conflict_status_maps_to_already_exists() {
        let body = ApiBody::Json(serde_json::json!({ "message": "duplicate user" }));
        let err = CredentialClient::classify_failure(StatusCode::CONFLICT, &body);
        assert_eq!(err, CredentialError::AlreadyExists("duplicate user".into()));
    }

    #[test]
    fn server_errors_map_to_transport() {
        let body = ApiBody::Text(String::new());
        let err = CredentialClient::classify_failure(StatusCode::BAD_GATEWAY, &body);
        assert_eq!(err, CredentialError::Transport("Erreur API: 502".into()));
    }

    #[test]
    fn expired_envelope_is_distinct_from_rejection() {
        let envelope: AuthEnvelope = serde_json::from_value(serde_json::json!({
            "status": "expired",
            "message": "Identifiants expirés",
            "action": "renew_credentials"
        }))
        .unwrap();
        let err = CredentialClient::resolve_auth_envelope(envelope).unwrap_err();
        assert_eq!(err, CredentialError::Expired("Identifiants expirés".into()));
    }

    #[test]
    fn renew_action_hint_promotes_error_to_expired() {
        let envelope: AuthEnvelope = serde_json::from_value(serde_json::json!({
            "status": "error",
            "message": "Identifiants expirés",
            "action": "renew_credentials"
        }))
        .unwrap();
        let err = CredentialClient::resolve_auth_envelope(envelope).unwrap_err();
        assert_eq!(err, CredentialError::Expired("Identifiants expirés".into()));
    }

    #[test]
    fn error_envelope_is_rejected_credentials() {
        let envelope: AuthEnvelope = serde_json::from_value(serde_json::json!({
            "status": "error",
            "message": "Mot de passe incorrect"
        }))
        .unwrap();
        let err = CredentialClient::resolve_auth_envelope(envelope).unwrap_err();
        assert_eq!(err, CredentialError::Rejected("Mot de passe incorrect".into()));
    }

    #[test]
    fn success_envelope_without_user_is_transport_error() {
        let envelope: AuthEnvelope =
            serde_json::from_value(serde_json::json!({ "status": "success" })).unwrap();
        let err = CredentialClient::resolve_auth_envelope(envelope).unwrap_err();
        assert!(matches!(err, CredentialError::Transport(_)));
    }
}
