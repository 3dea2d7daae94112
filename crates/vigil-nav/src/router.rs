//! In-process router with a history stack.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Location, NavDecision, NavigationError, NavigationGuard};

/// How a navigation lands in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    /// Add a new history entry.
    Push,
    /// Overwrite the current entry (so "back" skips it).
    Replace,
}

/// Moves the user between pages.
///
/// Every navigation goes through the guard; the returned location is where
/// the user actually ended up after redirects.
pub trait Navigator: Send + Sync {
    /// Where the user is now.
    fn current(&self) -> Location;

    /// Navigates to `to`.
    ///
    /// # Errors
    /// [`NavigationError::NotReady`] before boot, or
    /// [`NavigationError::RedirectLoop`] if redirects never settle.
    fn navigate(&self, to: Location, mode: NavMode) -> Result<Location, NavigationError>;

    fn push(&self, to: Location) -> Result<Location, NavigationError> {
        self.navigate(to, NavMode::Push)
    }

    fn replace(&self, to: Location) -> Result<Location, NavigationError> {
        self.navigate(to, NavMode::Replace)
    }
}

/// A [`Navigator`] that keeps its history in memory.
pub struct HistoryRouter {
    guard: Arc<NavigationGuard>,
    history: Mutex<Vec<Location>>,
}

impl HistoryRouter {
    /// A router with empty history. `current()` is `/` until the first
    /// navigation.
    pub fn new(guard: Arc<NavigationGuard>) -> Self {
        Self {
            guard,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// A copy of every history entry, oldest first.
    pub fn history(&self) -> Vec<Location> {
        self.lock().clone()
    }

    /// Pops the current entry and returns the new current location.
    ///
    /// The previous page is re-checked by the guard, so "back" into a
    /// protected page after logout still lands on login.
    ///
    /// # Errors
    /// Same as [`Navigator::navigate`].
    pub fn back(&self) -> Result<Location, NavigationError> {
        let previous = {
            let mut history = self.lock();
            if history.len() < 2 {
                return Ok(history.last().cloned().unwrap_or_else(|| Location::new("/")));
            }
            history.pop();
            history.last().cloned().unwrap_or_else(|| Location::new("/"))
        };
        self.navigate(previous, NavMode::Replace)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Location>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Follows aliases and guard redirects until a destination sticks.
    fn resolve(&self, to: Location) -> Result<Location, NavigationError> {
        let max = self.guard.config().max_redirects;
        let origin = to.full_path();
        let mut target = to;

        for _ in 0..=max {
            if let Some(alias) = self.guard.routes().alias_target(target.path()) {
                tracing::debug!(from = %target, to = alias, "following route alias");
                target = Location::parse(alias);
                continue;
            }
            match self.guard.decide(&target)? {
                NavDecision::Proceed => return Ok(target),
                NavDecision::Redirect(next) => {
                    tracing::debug!(from = %target, to = %next, "guard redirected");
                    target = next;
                }
            }
        }

        tracing::warn!(from = %origin, hops = max, "navigation redirect loop");
        Err(NavigationError::RedirectLoop {
            from: origin,
            hops: max,
        })
    }
}

impl Navigator for HistoryRouter {
    fn current(&self) -> Location {
        self.lock()
            .last()
            .cloned()
            .unwrap_or_else(|| Location::new("/"))
    }

    fn navigate(&self, to: Location, mode: NavMode) -> Result<Location, NavigationError> {
        let landed = self.resolve(to)?;

        let mut history = self.lock();
        match mode {
            NavMode::Replace if !history.is_empty() => {
                if let Some(slot) = history.last_mut() {
                    *slot = landed.clone();
                }
            }
            _ => history.push(landed.clone()),
        }

        tracing::debug!(at = %landed, ?mode, depth = history.len(), "navigated");
        Ok(landed)
    }
}
