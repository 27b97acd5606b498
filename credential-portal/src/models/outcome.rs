use crate::models::qr::QrArtifact;
use crate::models::session::AuthenticatedSession;
use crate::services::credential_client::CredentialError;
use serde::Serialize;

/// Credential lifecycle operations the portal can issue.
///
/// Keys the in-flight guard and the per-operation metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePassword,
    CreateTwoFactor,
    Authenticate,
    RenewPassword,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreatePassword => "create_password",
            Operation::CreateTwoFactor => "create_two_factor",
            Operation::Authenticate => "authenticate",
            Operation::RenewPassword => "renew_password",
        }
    }
}

/// Normalized, tagged result of any lifecycle operation.
///
/// Exactly one tag per backend response; the orchestrator is the only
/// component that decides flow transitions from these, and the presentation
/// layer only renders them.
#[derive(Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    Success(SuccessPayload),
    AlreadyExists(String),
    NotFound(String),
    Expired(String),
    RejectedCredentials(String),
    ValidationError(String),
    TransportError(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum SuccessPayload {
    /// Password issued; the QR artifact is owned by the requesting flow.
    PasswordIssued(QrArtifact),
    /// TOTP secret issued, with its provisioning QR.
    TwoFactorIssued(QrArtifact),
    /// Password regenerated; the 2FA secret is untouched.
    Renewed(QrArtifact),
    Authenticated(AuthenticatedSession),
}

impl OperationOutcome {
    pub fn tag(&self) -> &'static str {
        match self {
            OperationOutcome::Success(_) => "success",
            OperationOutcome::AlreadyExists(_) => "already_exists",
            OperationOutcome::NotFound(_) => "not_found",
            OperationOutcome::Expired(_) => "expired",
            OperationOutcome::RejectedCredentials(_) => "rejected_credentials",
            OperationOutcome::ValidationError(_) => "validation_error",
            OperationOutcome::TransportError(_) => "transport_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success(_))
    }
}

impl From<CredentialError> for OperationOutcome {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::AlreadyExists(msg) => OperationOutcome::AlreadyExists(msg),
            CredentialError::NotFound(msg) => OperationOutcome::NotFound(msg),
            CredentialError::Expired(msg) => OperationOutcome::Expired(msg),
            CredentialError::Rejected(msg) => OperationOutcome::RejectedCredentials(msg),
            CredentialError::Validation(msg) => OperationOutcome::ValidationError(msg),
            CredentialError::Transport(msg) => OperationOutcome::TransportError(msg),
        }
    }
}

/// Wire representation of an outcome tag, used by the JSON handlers.
#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OutcomeView {
    pub fn new(outcome: &OperationOutcome) -> Self {
        let message = match outcome {
            OperationOutcome::Success(_) => None,
            OperationOutcome::AlreadyExists(msg)
            | OperationOutcome::NotFound(msg)
            | OperationOutcome::Expired(msg)
            | OperationOutcome::RejectedCredentials(msg)
            | OperationOutcome::ValidationError(msg)
            | OperationOutcome::TransportError(msg) => Some(msg.clone()),
        };
        Self {
            outcome: outcome.tag(),
            message,
        }
    }
}
