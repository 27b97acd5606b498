use crate::models::outcome::{OperationOutcome, SuccessPayload};
use crate::models::qr::QrArtifact;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateAccountState {
    Start,
    PasswordIssued,
    TwoFactorIssued,
    Complete,
}

/// Account-creation flow instance.
///
/// The password and 2FA steps are user-driven and may be invoked in either
/// order; the backend rejects a standalone 2FA request until a password
/// record exists. The flow is `Complete` only when both artifacts were issued
/// within this instance; a partial success leaves the flow re-enterable for
/// the missing step without re-requesting the other.
#[derive(Debug, Default)]
pub struct CreateAccountFlow {
    password_qr: Option<QrArtifact>,
    two_factor_qr: Option<QrArtifact>,
}

impl CreateAccountFlow {
    pub fn state(&self) -> CreateAccountState {
        match (&self.password_qr, &self.two_factor_qr) {
            (None, None) => CreateAccountState::Start,
            (Some(_), None) => CreateAccountState::PasswordIssued,
            (None, Some(_)) => CreateAccountState::TwoFactorIssued,
            (Some(_), Some(_)) => CreateAccountState::Complete,
        }
    }

    /// Stores the issued password QR, dropping any artifact it replaces.
    pub fn password_issued(&mut self, qr: QrArtifact) {
        self.password_qr = Some(qr);
    }

    /// Stores the issued 2FA QR, dropping any artifact it replaces.
    pub fn two_factor_issued(&mut self, qr: QrArtifact) {
        self.two_factor_qr = Some(qr);
    }

    pub fn password_qr(&self) -> Option<&QrArtifact> {
        self.password_qr.as_ref()
    }

    pub fn two_factor_qr(&self) -> Option<&QrArtifact> {
        self.two_factor_qr.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.state() == CreateAccountState::Complete
    }

    /// Releases both artifacts when the flow is exited.
    pub fn reset(&mut self) {
        self.password_qr = None;
        self.two_factor_qr = None;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticateState {
    #[default]
    Start,
    Submitted,
    Authenticated,
    Rejected,
    ExpiredRedirect,
}

/// Resolves a submitted authentication into its terminal flow state.
/// `ExpiredRedirect` is distinct from `Rejected`: it triggers the deferred
/// transition to the renew flow instead of a retry prompt.
pub fn resolve_authentication(outcome: &OperationOutcome) -> AuthenticateState {
    match outcome {
        OperationOutcome::Success(SuccessPayload::Authenticated(_)) => {
            AuthenticateState::Authenticated
        }
        OperationOutcome::Expired(_) => AuthenticateState::ExpiredRedirect,
        _ => AuthenticateState::Rejected,
    }
}
