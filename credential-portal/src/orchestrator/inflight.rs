use crate::models::Operation;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Tracks outstanding backend requests keyed by `(username, operation)`.
///
/// The backend is not guaranteed idempotent under concurrent identical
/// requests, so a duplicate submission is refused while the first is still in
/// flight. The permit releases its key on drop, so early returns and panics
/// cannot leak an entry.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    entries: Arc<DashMap<(String, Operation), ()>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, username: &str, operation: Operation) -> Option<InFlightPermit> {
        let key = (username.to_string(), operation);
        match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightPermit {
                    entries: Arc::clone(&self.entries),
                    key,
                })
            }
        }
    }

    pub fn is_in_flight(&self, username: &str, operation: Operation) -> bool {
        self.entries
            .contains_key(&(username.to_string(), operation))
    }
}

pub struct InFlightPermit {
    entries: Arc<DashMap<(String, Operation), ()>>,
    key: (String, Operation),
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.entries.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_submission_is_refused_while_in_flight() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire("alice", Operation::CreatePassword);
        assert!(permit.is_some());
        assert!(guard.try_acquire("alice", Operation::CreatePassword).is_none());

        // Different operation or different username is independent.
        assert!(guard.try_acquire("alice", Operation::CreateTwoFactor).is_some());
        assert!(guard.try_acquire("bob", Operation::CreatePassword).is_some());
    }

    #[test]
    fn permit_drop_releases_the_key() {
        let guard = InFlightGuard::new();
        {
            let _permit = guard.try_acquire("alice", Operation::Authenticate);
            assert!(guard.is_in_flight("alice", Operation::Authenticate));
        }
        assert!(!guard.is_in_flight("alice", Operation::Authenticate));
        assert!(guard.try_acquire("alice", Operation::Authenticate).is_some());
    }
}
