//! Credential lifecycle orchestrator: the only place that decides which
//! backend call is legal next and how its outcome classifies.

pub mod flows;
pub mod inflight;

use crate::models::outcome::{Operation, OperationOutcome, SuccessPayload};
use crate::services::credential_client::CredentialClient;
use crate::services::metrics;
use inflight::InFlightGuard;
use std::sync::Arc;
use std::time::Duration;

/// Delay before the deferred expired-credentials redirect fires, leaving the
/// user time to read the explanatory notification.
pub const EXPIRED_REDIRECT_DELAY: Duration = Duration::from_secs(2);

pub struct LifecycleOrchestrator {
    client: Arc<CredentialClient>,
    inflight: InFlightGuard,
}

impl LifecycleOrchestrator {
    pub fn new(client: Arc<CredentialClient>) -> Self {
        Self {
            client,
            inflight: InFlightGuard::new(),
        }
    }

    /// Requests password issuance for the username. `AlreadyExists` is
    /// terminal for the create-account flow; the user is redirected to renew.
    pub async fn create_password(&self, username: &str) -> OperationOutcome {
        let username = match validated_username(username) {
            Ok(u) => u,
            Err(outcome) => return outcome,
        };
        let _permit = match self.inflight.try_acquire(&username, Operation::CreatePassword) {
            Some(permit) => permit,
            None => return duplicate_submission(),
        };

        let outcome = match self.client.create_password(&username).await {
            Ok(qr) => OperationOutcome::Success(SuccessPayload::PasswordIssued(qr)),
            Err(err) => OperationOutcome::from(err),
        };
        self.record(Operation::CreatePassword, &username, &outcome);
        outcome
    }

    /// Requests TOTP secret issuance. Yields `NotFound` until a password
    /// record exists; the user is told to issue the password first.
    pub async fn create_two_factor(&self, username: &str) -> OperationOutcome {
        let username = match validated_username(username) {
            Ok(u) => u,
            Err(outcome) => return outcome,
        };
        let _permit = match self.inflight.try_acquire(&username, Operation::CreateTwoFactor) {
            Some(permit) => permit,
            None => return duplicate_submission(),
        };

        let outcome = match self.client.create_two_factor(&username).await {
            Ok(qr) => OperationOutcome::Success(SuccessPayload::TwoFactorIssued(qr)),
            Err(err) => OperationOutcome::from(err),
        };
        self.record(Operation::CreateTwoFactor, &username, &outcome);
        outcome
    }

    /// Validates all three factors jointly. `Expired` must route to the renew
    /// flow, not a retry prompt.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        code: &str,
    ) -> OperationOutcome {
        let username = match validated_username(username) {
            Ok(u) => u,
            Err(outcome) => return outcome,
        };
        if password.trim().is_empty() {
            return OperationOutcome::ValidationError("Mot de passe requis".to_string());
        }
        if code.trim().is_empty() {
            return OperationOutcome::ValidationError("Code 2FA requis".to_string());
        }
        let _permit = match self.inflight.try_acquire(&username, Operation::Authenticate) {
            Some(permit) => permit,
            None => return duplicate_submission(),
        };

        let outcome = match self.client.authenticate(&username, password, code).await {
            Ok(session) => OperationOutcome::Success(SuccessPayload::Authenticated(session)),
            Err(err) => OperationOutcome::from(err),
        };
        self.record(Operation::Authenticate, &username, &outcome);
        outcome
    }

    /// Regenerates only the password; the 2FA secret is immutable once issued
    /// and this flow never offers to renew it.
    pub async fn renew_password(&self, username: &str) -> OperationOutcome {
        let username = match validated_username(username) {
            Ok(u) => u,
            Err(outcome) => return outcome,
        };
        let _permit = match self.inflight.try_acquire(&username, Operation::RenewPassword) {
            Some(permit) => permit,
            None => return duplicate_submission(),
        };

        let outcome = match self.client.renew_password(&username).await {
            Ok(qr) => OperationOutcome::Success(SuccessPayload::Renewed(qr)),
            Err(err) => OperationOutcome::from(err),
        };
        self.record(Operation::RenewPassword, &username, &outcome);
        outcome
    }

    fn record(&self, operation: Operation, username: &str, outcome: &OperationOutcome) {
        metrics::record_operation(operation.as_str(), outcome.tag());
        if outcome.is_success() {
            tracing::info!(operation = operation.as_str(), %username, "Operation succeeded");
        } else {
            tracing::warn!(
                operation = operation.as_str(),
                %username,
                outcome = outcome.tag(),
                "Operation failed"
            );
        }
    }
}

/// Rejects empty or whitespace-only usernames locally, before any backend
/// call, and returns the trimmed identity otherwise.
fn validated_username(username: &str) -> Result<String, OperationOutcome> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(OperationOutcome::ValidationError(
            "Veuillez saisir un nom d'utilisateur".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn duplicate_submission() -> OperationOutcome {
    OperationOutcome::ValidationError("operation already in progress".to_string())
}
