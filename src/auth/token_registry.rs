use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// In-memory registry of revoked token ids.
///
/// Each entry carries the token's own expiry so the registry can drop it once
/// the token would have been rejected anyway; expired entries are pruned on
/// every insert, keeping the set bounded by the number of tokens revoked
/// within one token lifetime. Safe for concurrent insert and lookup.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    revoked: DashMap<String, DateTime<Utc>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            revoked: DashMap::new(),
        }
    }

    /// Records a token id as invalidated until `expires_at`.
    pub fn invalidate(&self, token_id: impl Into<String>, expires_at: DateTime<Utc>) {
        self.prune(Utc::now());
        self.revoked.insert(token_id.into(), expires_at);
    }

    /// Reports whether a token id has been invalidated and is still within
    /// its natural lifetime.
    pub fn is_invalidated(&self, token_id: &str) -> bool {
        self.revoked
            .get(token_id)
            .map(|expiry| *expiry > Utc::now())
            .unwrap_or(false)
    }

    fn prune(&self, now: DateTime<Utc>) {
        self.revoked.retain(|_, expiry| *expiry > now);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.revoked.len()
    }
}
