//! Listener registries.
//!
//! Both connectivity and sync progress fan out to any number of observers.
//! A [`Registry`] hands back a [`Subscription`] per listener; dropping it (or
//! calling [`Subscription::unsubscribe`]) removes exactly that listener.
//! Listeners are invoked without the registry lock held, so a listener may
//! subscribe or unsubscribe from inside its own callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// Set of listeners for events of type `T`.
///
/// Clones share the same listener set.
pub struct Registry<T> {
    inner: Arc<Mutex<Listeners<T>>>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.len())
            .finish()
    }
}

fn lock<T>(inner: &Mutex<Listeners<T>>) -> MutexGuard<'_, Listeners<T>> {
    // A panicking listener runs outside the lock, so poisoning can only come
    // from a bug here; the data is still consistent.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: 'static> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = lock(&self.inner);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let removed = {
                        let mut listeners = lock(&inner);
                        listeners
                            .entries
                            .iter()
                            .position(|(entry_id, _)| *entry_id == id)
                            .map(|index| listeners.entries.remove(index))
                    };
                    // Dropped outside the lock: the listener may own subscriptions too.
                    drop(removed);
                }
            })),
        }
    }

    /// Invoke every current listener with `event`.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }
}

impl<T> Registry<T> {
    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    /// True if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one registered listener.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unregister the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener registered for the registry's whole lifetime.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
