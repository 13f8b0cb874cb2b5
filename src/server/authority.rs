//! The version authority: a single server-held record that changes exactly
//! once per committed catalog mutation.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

/// Length of a generated version token.
/// 22 alphanumeric characters carry ~130 bits, plenty for uniqueness.
const TOKEN_LEN: usize = 22;

/// The authority's current record: an opaque token plus the time it was
/// issued. Tokens compare by equality only; no ordering is promised.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionStamp {
    pub version: String,
    pub last_updated: DateTime<Utc>,
}

impl VersionStamp {
    fn issue() -> Self {
        Self {
            version: new_token(),
            last_updated: Utc::now(),
        }
    }
}

/// Generate a fresh opaque version token.
fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Holds the canonical version token, read-only to clients.
///
/// Only the mutation layer calls [`invalidate`](Self::invalidate), strictly
/// after its write has committed. A client that observes token `V` is
/// therefore guaranteed that every mutation committed before `V` was issued
/// is visible on a fetch made now.
#[derive(Debug)]
pub struct VersionAuthority {
    current: RwLock<VersionStamp>,
}

impl VersionAuthority {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(VersionStamp::issue()),
        }
    }

    /// Read the current stamp.
    pub async fn current(&self) -> VersionStamp {
        self.current.read().await.clone()
    }

    /// Regenerate the token. Called by the invalidator after a committed
    /// mutation; never on a failed one.
    pub async fn invalidate(&self) -> VersionStamp {
        let mut current = self.current.write().await;
        let previous = current.version.clone();
        *current = VersionStamp::issue();
        debug!(from = %previous, to = %current.version, "Catalog version invalidated");
        current.clone()
    }
}

impl Default for VersionAuthority {
    fn default() -> Self {
        Self::new()
    }
}
