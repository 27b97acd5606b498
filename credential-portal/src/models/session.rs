use serde::{Deserialize, Serialize};

/// Identity established by a successful authentication.
///
/// `days_until_expiration` is authoritative from the backend; the portal never
/// computes or decrements it locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub username: String,
    pub days_until_expiration: u32,
}

/// Single source of truth for "is someone logged in, and with what remaining
/// validity". Held in memory only; destroyed on logout or portal restart.
///
/// An `AuthenticatedSession` can only be produced by a successful
/// `authenticate` call, so `login` is unreachable from any failure outcome.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Option<AuthenticatedSession>,
}

impl SessionState {
    pub fn login(&mut self, session: AuthenticatedSession) {
        tracing::info!(username = %session.username, "User logged in");
        self.current = Some(session);
    }

    /// Clears the identity unconditionally; always succeeds.
    pub fn logout(&mut self) -> Option<AuthenticatedSession> {
        if let Some(session) = &self.current {
            tracing::info!(username = %session.username, "User logged out");
        }
        self.current.take()
    }

    pub fn current(&self) -> Option<&AuthenticatedSession> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}
