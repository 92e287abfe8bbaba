//! Ordered listener registry with copy-on-dispatch.
//!
//! DESIGN
//! ======
//! A registry is a list, not a set: registering the same handle twice means
//! it runs twice, and `remove` drops one occurrence. Handles are compared by
//! pointer identity, so callers keep the `Arc` they registered if they want
//! to remove it later.
//!
//! Dispatch iterates a snapshot taken before the first call. A listener that
//! removes itself (or another) still sees the current event; one added during
//! dispatch first runs on the next event.

use std::fmt;
use std::sync::Arc;

/// Shared callback handle for events of type `E`.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Wrap a closure into a listener handle.
pub fn listener<E, F>(f: F) -> Listener<E>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub struct Listeners<E> {
    entries: Vec<Listener<E>>,
}

impl<E> Listeners<E> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add(&mut self, listener: Listener<E>) {
        self.entries.push(listener);
    }

    /// Remove the first registration of `listener`. Returns whether one was found.
    pub fn remove(&mut self, listener: &Listener<E>) -> bool {
        let Some(pos) = self.entries.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        self.entries.remove(pos);
        true
    }

    /// Copy of the current handles, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries.clone()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.entries.len()).finish()
    }
}

/// Invoke every handle in order with the same event.
pub fn dispatch<E>(listeners: &[Listener<E>], event: &E) {
    for listener in listeners {
        listener(event);
    }
}

#[cfg(test)]
#[path = "listeners_test.rs"]
mod tests;
