//! Maps orchestrator outcomes to pages and notifications. Renders only; all
//! classification happens upstream in the client and orchestrator.

use crate::models::notification::Severity;
use crate::models::outcome::{Operation, OperationOutcome, OutcomeView, SuccessPayload};
use crate::orchestrator::EXPIRED_REDIRECT_DELAY;
use crate::orchestrator::flows::resolve_authentication;
use crate::state::{PortalState, ScheduledRedirect, SharedPortal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Screens of the portal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Home,
    CreateAccount,
    Login,
    RenewCredentials,
    Dashboard,
}

/// Maps each outcome to exactly one notification severity. Warnings carry
/// corrective guidance; errors do not imply a redirect.
pub fn severity_for(outcome: &OperationOutcome) -> Severity {
    match outcome {
        OperationOutcome::Success(_) => Severity::Success,
        OperationOutcome::AlreadyExists(_)
        | OperationOutcome::NotFound(_)
        | OperationOutcome::Expired(_) => Severity::Warning,
        OperationOutcome::RejectedCredentials(_)
        | OperationOutcome::ValidationError(_)
        | OperationOutcome::TransportError(_) => Severity::Error,
    }
}

/// One user-facing message per outcome, with the corrective guidance the
/// original portal attached to recoverable failures.
pub fn notification_message(operation: Operation, outcome: &OperationOutcome) -> String {
    match (operation, outcome) {
        (Operation::CreatePassword, OperationOutcome::Success(_)) => {
            "Mot de passe généré et QR Code affiché avec succès".to_string()
        }
        (Operation::CreateTwoFactor, OperationOutcome::Success(_)) => {
            "Secret 2FA généré et QR Code affiché avec succès".to_string()
        }
        (Operation::RenewPassword, OperationOutcome::Success(_)) => {
            "Mot de passe régénéré avec succès ! Le secret 2FA reste inchangé.".to_string()
        }
        (
            Operation::Authenticate,
            OperationOutcome::Success(SuccessPayload::Authenticated(session)),
        ) => format!(
            "Authentification réussie ! ({} jours avant expiration)",
            session.days_until_expiration
        ),
        (Operation::Authenticate, OperationOutcome::Success(_)) => {
            "Authentification réussie !".to_string()
        }
        (Operation::CreatePassword, OperationOutcome::AlreadyExists(msg)) => {
            format!("{msg} Utilisez la page de renouvellement pour mettre à jour vos identifiants.")
        }
        (Operation::CreateTwoFactor, OperationOutcome::AlreadyExists(msg)) => {
            format!("{msg} Utilisez la page de renouvellement.")
        }
        (Operation::CreateTwoFactor, OperationOutcome::NotFound(msg)) => {
            format!("{msg} Créez d'abord le mot de passe.")
        }
        (Operation::RenewPassword, OperationOutcome::NotFound(msg)) => {
            format!("{msg} Créez d'abord un compte.")
        }
        // Only authentication schedules the deferred redirect; other
        // operations must not promise one.
        (Operation::Authenticate, OperationOutcome::Expired(msg)) => {
            format!("{msg} Redirection vers la régénération...")
        }
        (
            _,
            OperationOutcome::AlreadyExists(msg)
            | OperationOutcome::NotFound(msg)
            | OperationOutcome::Expired(msg)
            | OperationOutcome::RejectedCredentials(msg)
            | OperationOutcome::ValidationError(msg)
            | OperationOutcome::TransportError(msg),
        ) => msg.clone(),
    }
}

/// Applies an operation outcome to the portal: pushes exactly one
/// notification, stores issued artifacts in their flow slot, performs forced
/// navigation, and schedules the deferred renew redirect on expiry.
pub fn apply_outcome(
    shared: &SharedPortal,
    portal: &mut PortalState,
    operation: Operation,
    outcome: OperationOutcome,
) -> OutcomeView {
    let view = OutcomeView::new(&outcome);
    let severity = severity_for(&outcome);
    let message = notification_message(operation, &outcome);
    portal
        .notifications
        .push(Arc::clone(shared), severity, message);

    if operation == Operation::Authenticate {
        portal.authenticate = resolve_authentication(&outcome);
    }

    match outcome {
        OperationOutcome::Success(SuccessPayload::PasswordIssued(qr)) => {
            portal.create_account.password_issued(qr);
        }
        OperationOutcome::Success(SuccessPayload::TwoFactorIssued(qr)) => {
            portal.create_account.two_factor_issued(qr);
        }
        OperationOutcome::Success(SuccessPayload::Renewed(qr)) => {
            portal.renewed(qr);
        }
        OperationOutcome::Success(SuccessPayload::Authenticated(session)) => {
            portal.session.login(session);
            portal.navigate(Page::Dashboard);
        }
        OperationOutcome::Expired(_) if operation == Operation::Authenticate => {
            schedule_expired_redirect(Arc::clone(shared), portal);
        }
        _ => {}
    }

    view
}

/// Schedules the deferred transition to the renew flow after expired
/// credentials. The delay lets the user read the notification first; any
/// navigation before it fires cancels it.
pub fn schedule_expired_redirect(shared: SharedPortal, portal: &mut PortalState) {
    let task = tokio::spawn({
        let shared = Arc::clone(&shared);
        async move {
            tokio::time::sleep(EXPIRED_REDIRECT_DELAY).await;
            let mut portal = shared.lock().await;
            portal.complete_pending_redirect();
        }
    });
    portal.set_pending_redirect(ScheduledRedirect::new(
        Page::RenewCredentials,
        task.abort_handle(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::AuthenticatedSession;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn shared() -> SharedPortal {
        Arc::new(Mutex::new(PortalState::default()))
    }

    #[test]
    fn severity_follows_the_taxonomy() {
        assert_eq!(
            severity_for(&OperationOutcome::AlreadyExists("x".into())),
            Severity::Warning
        );
        assert_eq!(
            severity_for(&OperationOutcome::NotFound("x".into())),
            Severity::Warning
        );
        assert_eq!(
            severity_for(&OperationOutcome::Expired("x".into())),
            Severity::Warning
        );
        assert_eq!(
            severity_for(&OperationOutcome::RejectedCredentials("x".into())),
            Severity::Error
        );
        assert_eq!(
            severity_for(&OperationOutcome::TransportError("x".into())),
            Severity::Error
        );
    }

    #[test]
    fn already_exists_guidance_points_to_renewal() {
        let message = notification_message(
            Operation::CreatePassword,
            &OperationOutcome::AlreadyExists("alice existe déjà".into()),
        );
        assert_eq!(
            message,
            "alice existe déjà Utilisez la page de renouvellement pour mettre à jour vos identifiants."
        );
    }

    #[test]
    fn two_factor_not_found_tells_user_to_create_password_first() {
        let message = notification_message(
            Operation::CreateTwoFactor,
            &OperationOutcome::NotFound("bob n'existe pas".into()),
        );
        assert_eq!(message, "bob n'existe pas Créez d'abord le mot de passe.");
    }

    #[test]
    fn only_authentication_promises_the_renew_redirect() {
        let expired = OperationOutcome::Expired("Identifiants expirés".into());
        assert_eq!(
            notification_message(Operation::Authenticate, &expired),
            "Identifiants expirés Redirection vers la régénération..."
        );
        assert_eq!(
            notification_message(Operation::CreatePassword, &expired),
            "Identifiants expirés"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_redirect_fires_after_the_delay() {
        let shared = shared();
        {
            let mut portal = shared.lock().await;
            let outcome = OperationOutcome::Expired("Identifiants expirés".into());
            apply_outcome(&shared, &mut portal, Operation::Authenticate, outcome);
            assert!(portal.has_pending_redirect());
            assert_eq!(portal.page(), Page::Home);
        }

        tokio::time::sleep(EXPIRED_REDIRECT_DELAY + Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let portal = shared.lock().await;
        assert_eq!(portal.page(), Page::RenewCredentials);
        assert!(!portal.has_pending_redirect());
    }

    #[tokio::test(start_paused = true)]
    async fn navigating_away_cancels_the_scheduled_redirect() {
        let shared = shared();
        {
            let mut portal = shared.lock().await;
            let outcome = OperationOutcome::Expired("Identifiants expirés".into());
            apply_outcome(&shared, &mut portal, Operation::Authenticate, outcome);
            portal.navigate(Page::Home);
            assert!(!portal.has_pending_redirect());
        }

        tokio::time::sleep(EXPIRED_REDIRECT_DELAY + Duration::from_millis(100)).await;
        tokio::task::yield_now().await;

        let portal = shared.lock().await;
        assert_eq!(portal.page(), Page::Home);
    }

    #[tokio::test]
    async fn authenticated_success_logs_in_and_navigates_to_dashboard() {
        let shared = shared();
        let mut portal = shared.lock().await;
        let outcome = OperationOutcome::Success(SuccessPayload::Authenticated(
            AuthenticatedSession {
                username: "dave".into(),
                days_until_expiration: 12,
            },
        ));
        apply_outcome(&shared, &mut portal, Operation::Authenticate, outcome);
        assert!(portal.session.is_authenticated());
        assert_eq!(portal.page(), Page::Dashboard);
        assert_eq!(portal.notifications.list().len(), 1);
        assert_eq!(
            portal.notifications.list()[0].message,
            "Authentification réussie ! (12 jours avant expiration)"
        );
    }
}
