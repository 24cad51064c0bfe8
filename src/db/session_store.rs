// src/db/session_store.rs
//
// Expiring key-value state: step sessions and captcha codes. Entries vanish
// on their own after the configured TTL.

use std::time::Duration;

use moka::sync::Cache;

use crate::models::workflow::{CaptchaAction, WorkflowKind, WorkflowState};

const MAX_ENTRIES: u64 = 100_000;

#[derive(Clone)]
pub struct WorkflowStore {
    cache: Cache<String, WorkflowState>,
}

impl WorkflowStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn key(kind: WorkflowKind, token: &str) -> String {
        format!("{}:{token}", kind.key_prefix())
    }

    pub fn get(&self, kind: WorkflowKind, token: &str) -> Option<WorkflowState> {
        self.cache.get(&Self::key(kind, token))
    }

    // Last write wins.
    pub fn put(&self, kind: WorkflowKind, token: &str, state: WorkflowState) {
        self.cache.insert(Self::key(kind, token), state);
    }

    pub fn clear(&self, kind: WorkflowKind, token: &str) {
        self.cache.invalidate(&Self::key(kind, token));
    }
}

#[derive(Clone)]
pub struct CaptchaStore {
    cache: Cache<String, String>,
}

impl CaptchaStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn key(action: CaptchaAction, target: &str) -> String {
        format!("{}:{target}", action.as_str())
    }

    /// Stores a code, replacing any earlier one for the same target.
    pub fn issue(&self, action: CaptchaAction, target: &str, code: String) {
        self.cache.insert(Self::key(action, target), code);
    }

    /// True if `code` matches; a matching code is consumed.
    pub fn consume(&self, action: CaptchaAction, target: &str, code: &str) -> bool {
        let key = Self::key(action, target);
        match self.cache.get(&key) {
            Some(stored) if stored == code => {
                self.cache.invalidate(&key);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_state_is_scoped_by_kind_and_token() {
        let store = WorkflowStore::new(Duration::from_secs(60));
        store.put(WorkflowKind::UserRegister, "t1", WorkflowState::AwaitingContact);

        assert_eq!(
            store.get(WorkflowKind::UserRegister, "t1"),
            Some(WorkflowState::AwaitingContact)
        );
        assert_eq!(store.get(WorkflowKind::VendorRegister, "t1"), None);
        assert_eq!(store.get(WorkflowKind::UserRegister, "t2"), None);

        store.clear(WorkflowKind::UserRegister, "t1");
        assert_eq!(store.get(WorkflowKind::UserRegister, "t1"), None);
    }

    #[test]
    fn captcha_codes_are_single_use() {
        let store = CaptchaStore::new(Duration::from_secs(60));
        store.issue(CaptchaAction::Register, "13800138000", "123456".into());

        assert!(!store.consume(CaptchaAction::ResetPassword, "13800138000", "123456"));
        assert!(!store.consume(CaptchaAction::Register, "13800138000", "654321"));
        assert!(store.consume(CaptchaAction::Register, "13800138000", "123456"));
        assert!(!store.consume(CaptchaAction::Register, "13800138000", "123456"));
    }
}
