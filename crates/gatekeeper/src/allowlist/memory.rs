//! In-memory allowlist used by tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{AllowlistLookup, LookupError};

#[derive(Debug, Default)]
pub struct MemoryAllowlist {
    emails: HashSet<String>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryAllowlist {
    pub fn new(emails: &[&str]) -> Self {
        Self {
            emails: emails.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following lookup fail as if the store were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AllowlistLookup for MemoryAllowlist {
    async fn contains(&self, identity: &str) -> Result<bool, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LookupError::Unavailable("connection refused".to_string()));
        }
        Ok(self.emails.contains(identity))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
