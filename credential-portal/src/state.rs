//! Explicit portal application state: current page, authenticated session,
//! live notifications, and flow slots. One instance per browser session,
//! in memory only, gone on restart.

use crate::models::notification::Notification;
use crate::models::qr::QrArtifact;
use crate::models::session::{AuthenticatedSession, SessionState};
use crate::notifications::NotificationCenter;
use crate::orchestrator::flows::{AuthenticateState, CreateAccountFlow, CreateAccountState};
use crate::presentation::Page;
use anyhow::anyhow;
use dashmap::DashMap;
use portal_core::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tower_sessions::Session;
use uuid::Uuid;

pub type SharedPortal = Arc<Mutex<PortalState>>;

/// A timed, cancellable page transition (expired credentials → renew).
#[derive(Debug)]
pub struct ScheduledRedirect {
    pub target: Page,
    handle: AbortHandle,
}

impl ScheduledRedirect {
    pub fn new(target: Page, handle: AbortHandle) -> Self {
        Self { target, handle }
    }
}

#[derive(Debug, Default)]
pub struct PortalState {
    page: Page,
    pub session: SessionState,
    pub notifications: NotificationCenter,
    pub create_account: CreateAccountFlow,
    pub authenticate: AuthenticateState,
    renewal_qr: Option<QrArtifact>,
    pending_redirect: Option<ScheduledRedirect>,
}

impl PortalState {
    pub fn page(&self) -> Page {
        self.page
    }

    /// User-driven navigation. Cancels any pending deferred redirect and
    /// releases the QR artifacts of a flow being exited. The dashboard is
    /// only reachable while authenticated; otherwise it falls back to home.
    pub fn navigate(&mut self, target: Page) -> Page {
        self.cancel_pending_redirect();
        self.apply_navigation(target)
    }

    fn apply_navigation(&mut self, target: Page) -> Page {
        if self.page == Page::CreateAccount && target != Page::CreateAccount {
            self.create_account.reset();
        }
        if self.page == Page::RenewCredentials && target != Page::RenewCredentials {
            self.renewal_qr = None;
        }
        if self.page == Page::Login && target != Page::Login {
            self.authenticate = AuthenticateState::Start;
        }

        let target = if target == Page::Dashboard && !self.session.is_authenticated() {
            Page::Home
        } else {
            target
        };
        self.page = target;
        target
    }

    /// Stores the renewal QR, dropping any artifact it replaces.
    pub fn renewed(&mut self, qr: QrArtifact) {
        self.renewal_qr = Some(qr);
    }

    pub fn renewal_qr(&self) -> Option<&QrArtifact> {
        self.renewal_qr.as_ref()
    }

    pub fn set_pending_redirect(&mut self, redirect: ScheduledRedirect) {
        self.cancel_pending_redirect();
        self.pending_redirect = Some(redirect);
    }

    pub fn cancel_pending_redirect(&mut self) {
        if let Some(redirect) = self.pending_redirect.take() {
            redirect.handle.abort();
        }
    }

    /// Called by the redirect timer task once its delay has elapsed.
    pub fn complete_pending_redirect(&mut self) {
        if let Some(redirect) = self.pending_redirect.take() {
            self.apply_navigation(redirect.target);
        }
    }

    pub fn has_pending_redirect(&self) -> bool {
        self.pending_redirect.is_some()
    }
}

/// Serializable snapshot of a portal instance, returned by every handler so
/// the frontend can render without further classification.
#[derive(Debug, Serialize)]
pub struct PortalView {
    pub page: Page,
    pub session: Option<AuthenticatedSession>,
    pub notifications: Vec<Notification>,
    pub create_account: CreateAccountState,
    pub authenticate: AuthenticateState,
    pub has_password_qr: bool,
    pub has_two_factor_qr: bool,
    pub has_renewal_qr: bool,
    pub pending_redirect: bool,
}

impl PortalView {
    pub fn from_state(portal: &PortalState) -> Self {
        Self {
            page: portal.page(),
            session: portal.session.current().cloned(),
            notifications: portal.notifications.list().to_vec(),
            create_account: portal.create_account.state(),
            authenticate: portal.authenticate,
            has_password_qr: portal.create_account.password_qr().is_some(),
            has_two_factor_qr: portal.create_account.two_factor_qr().is_some(),
            has_renewal_qr: portal.renewal_qr().is_some(),
            pending_redirect: portal.has_pending_redirect(),
        }
    }
}

/// Portals idle longer than this are dropped, matching the session-cookie
/// inactivity expiry in `startup.rs`.
pub const PORTAL_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct PortalEntry {
    portal: SharedPortal,
    last_seen: Instant,
}

/// Portal instances keyed by the id stored in the browser session cookie.
#[derive(Clone, Default)]
pub struct PortalRegistry {
    inner: Arc<DashMap<Uuid, PortalEntry>>,
}

const PORTAL_ID_KEY: &str = "portal_id";

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the portal bound to this browser session, creating both the
    /// session id and the portal on first contact.
    pub async fn for_session(&self, session: &Session) -> Result<SharedPortal, AppError> {
        self.evict_idle();

        let id = match session
            .get::<Uuid>(PORTAL_ID_KEY)
            .await
            .map_err(|e| AppError::InternalError(anyhow!("Session error: {e}")))?
        {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session
                    .insert(PORTAL_ID_KEY, id)
                    .await
                    .map_err(|e| AppError::InternalError(anyhow!("Session error: {e}")))?;
                id
            }
        };

        Ok(self.touch(id))
    }

    /// Returns the portal for the id, refreshing its idle clock; creates it
    /// on first contact.
    fn touch(&self, id: Uuid) -> SharedPortal {
        let mut entry = self.inner.entry(id).or_insert_with(|| PortalEntry {
            portal: Arc::new(Mutex::new(PortalState::default())),
            last_seen: Instant::now(),
        });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.portal)
    }

    /// Drops portals whose session cookie has expired. Runs on every lookup,
    /// so the map is bounded by the count of sessions active within the TTL.
    fn evict_idle(&self) {
        let now = Instant::now();
        self.inner
            .retain(|_, entry| now.duration_since(entry.last_seen) < PORTAL_IDLE_TTL);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn qr() -> QrArtifact {
        QrArtifact::new(Bytes::from_static(b"\x89PNG"), "image/png")
    }

    #[test]
    fn dashboard_requires_an_authenticated_session() {
        let mut portal = PortalState::default();
        assert_eq!(portal.navigate(Page::Dashboard), Page::Home);

        portal.session.login(AuthenticatedSession {
            username: "alice".into(),
            days_until_expiration: 90,
        });
        assert_eq!(portal.navigate(Page::Dashboard), Page::Dashboard);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_portals_are_evicted_after_the_session_expiry() {
        let registry = PortalRegistry::new();
        registry.touch(Uuid::new_v4());

        tokio::time::advance(PORTAL_IDLE_TTL + Duration::from_secs(1)).await;
        let fresh_id = Uuid::new_v4();
        registry.touch(fresh_id);
        registry.evict_idle();
        assert_eq!(registry.len(), 1);

        // A lookup refreshes the idle clock.
        tokio::time::advance(PORTAL_IDLE_TTL - Duration::from_secs(1)).await;
        registry.touch(fresh_id);
        tokio::time::advance(Duration::from_secs(2)).await;
        registry.evict_idle();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn leaving_a_flow_releases_its_artifacts() {
        let mut portal = PortalState::default();
        portal.navigate(Page::CreateAccount);
        portal.create_account.password_issued(qr());

        portal.navigate(Page::Home);
        assert!(portal.create_account.password_qr().is_none());

        portal.navigate(Page::RenewCredentials);
        portal.renewed(qr());
        portal.navigate(Page::Home);
        assert!(portal.renewal_qr().is_none());
    }
}
