//! Transient notification store with per-entry auto-expiry timers.

use crate::models::notification::{Notification, Severity};
use crate::state::SharedPortal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Delay after which a notification expires on its own.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Holds the live notifications of one portal instance.
///
/// Every push schedules a cancellable expiry task keyed by the notification
/// id; explicit dismissal aborts it. Both paths leave the list without the
/// entry and without a residual timer.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
    timers: HashMap<Uuid, AbortHandle>,
}

impl NotificationCenter {
    pub fn push(
        &mut self,
        shared: SharedPortal,
        severity: Severity,
        message: impl Into<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push(Notification {
            id,
            severity,
            message: message.into(),
        });

        let task = tokio::spawn(async move {
            tokio::time::sleep(NOTIFICATION_TTL).await;
            let mut portal = shared.lock().await;
            portal.notifications.expire(id);
        });
        self.timers.insert(id, task.abort_handle());
        id
    }

    /// Explicit dismissal before expiry; aborts the pending timer.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        if let Some(handle) = self.timers.remove(&id) {
            handle.abort();
        }
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        before != self.entries.len()
    }

    /// Auto-expiry path: the timer already fired, only bookkeeping remains.
    fn expire(&mut self, id: Uuid) {
        self.timers.remove(&id);
        self.entries.retain(|n| n.id != id);
    }

    pub fn list(&self) -> &[Notification] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn has_timer(&self, id: Uuid) -> bool {
        self.timers.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PortalState;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn auto_expiry_and_dismissal_both_leave_no_trace() {
        let shared: SharedPortal = Arc::new(Mutex::new(PortalState::default()));

        let (kept, dismissed) = {
            let mut portal = shared.lock().await;
            let kept = portal
                .notifications
                .push(Arc::clone(&shared), Severity::Info, "expire on your own");
            let dismissed = portal
                .notifications
                .push(Arc::clone(&shared), Severity::Success, "dismiss me");
            assert!(portal.notifications.dismiss(dismissed));
            assert_eq!(portal.notifications.list().len(), 1);
            assert!(!portal.notifications.has_timer(dismissed));
            (kept, dismissed)
        };

        tokio::time::sleep(NOTIFICATION_TTL + Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let portal = shared.lock().await;
        assert!(portal.notifications.is_empty());
        assert!(!portal.notifications.has_timer(kept));
        assert!(!portal.notifications.has_timer(dismissed));
    }

    #[tokio::test]
    async fn dismissing_an_unknown_id_is_a_no_op() {
        let shared: SharedPortal = Arc::new(Mutex::new(PortalState::default()));
        let mut portal = shared.lock().await;
        assert!(!portal.notifications.dismiss(Uuid::new_v4()));
    }
}
