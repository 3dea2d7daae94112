//! Error types for the navigation layer.

/// Errors that can occur while resolving a navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// A navigation decision was requested before the session finished
    /// booting. The boot sequence must run `initialize()` first.
    #[error("session not initialized, navigation refused")]
    NotReady,

    /// Redirects kept bouncing without settling on a destination.
    #[error("redirect loop starting at {from} ({hops} hops)")]
    RedirectLoop { from: String, hops: usize },
}
