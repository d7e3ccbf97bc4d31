//! # Thread-Affinity Guard
//!
//! Rejects connector calls made from the designated foreground thread.
//!
//! Connector operations suspend while waiting on the host; running them on
//! the UI/foreground thread would freeze the embedding application. The
//! guard turns that mistake into an immediate, typed failure instead of a
//! silent stall: the check runs before any transport interaction, so a
//! violating call has no transport-visible side effect.

use std::thread::{self, ThreadId};

use tracing::error;

use merchlink_core::{ConnectorError, ConnectorResult};

/// Guard holding the identity of the designated foreground thread.
///
/// The embedding application registers its foreground thread once, at
/// context construction, and every public connector operation checks
/// against it.
#[derive(Debug, Clone)]
pub struct ForegroundGuard {
    foreground: Option<ThreadId>,
}

impl ForegroundGuard {
    /// Registers the current thread as the guarded foreground thread.
    ///
    /// Call this from the UI thread during application startup.
    pub fn register() -> Self {
        ForegroundGuard {
            foreground: Some(thread::current().id()),
        }
    }

    /// Guards an explicit thread id.
    pub fn for_thread(id: ThreadId) -> Self {
        ForegroundGuard {
            foreground: Some(id),
        }
    }

    /// A guard that never rejects.
    ///
    /// For embeddings with no foreground thread (headless services, tools).
    pub fn disabled() -> Self {
        ForegroundGuard { foreground: None }
    }

    /// Fails with `ThreadAffinity` if called from the guarded thread.
    pub fn check(&self, method: &str) -> ConnectorResult<()> {
        if self.foreground == Some(thread::current().id()) {
            error!(method, "connector call rejected on foreground thread");
            return Err(ConnectorError::ThreadAffinity {
                method: method.to_string(),
            });
        }
        Ok(())
    }
}
