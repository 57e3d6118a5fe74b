//! Cancellation-bearing call context
//!
//! Every repository operation takes a [`CallContext`]. Session factories use
//! the context id to scope sessions — in particular, transaction state is
//! keyed by context, so `begin`/`commit`/`rollback` and the operations meant
//! to run inside the transaction must share one context. Cancelling the
//! context aborts subsequent session work for it.

use std::fmt;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Opaque identity of a call context
///
/// UUIDv7, so ids created later sort after ids created earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(Uuid);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A cancellation-bearing call context
///
/// Cloning a context shares its cancellation state and id; a clone is the
/// same logical context, not a child.
///
/// # Example
///
/// ```rust
/// use unirepo::context::CallContext;
///
/// let ctx = CallContext::new();
/// assert!(!ctx.is_cancelled());
/// ctx.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    id: ContextId,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Create a fresh, uncancelled context
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ContextId(Uuid::now_v7()),
            cancellation: CancellationToken::new(),
        }
    }

    /// The context's identity
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The underlying cancellation token
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether the context has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Wait until the context is cancelled
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_distinct() {
        let a = CallContext::new();
        let b = CallContext::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_clone_shares_identity_and_cancellation() {
        let ctx = CallContext::new();
        let clone = ctx.clone();
        assert_eq!(ctx.id(), clone.id());

        ctx.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let ctx = CallContext::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        ctx.cancel();
        handle.await.expect("waiter should finish");
    }
}
