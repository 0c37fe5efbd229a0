//! Connectivity tracking.
//!
//! The platform (or the reachability probe task) feeds raw online/offline
//! signals into [`ConnectivityObserver::set_online`]. Listeners hear only
//! transitions, never repeats of the current state.

use crate::notify::{Registry, Subscription};
use std::sync::atomic::{AtomicBool, Ordering};

/// Current connectivity plus change listeners.
#[derive(Debug)]
pub struct ConnectivityObserver {
    online: AtomicBool,
    listeners: Registry<bool>,
}

impl ConnectivityObserver {
    /// Create an observer with a known initial state.
    pub fn new(initially_online: bool) -> Self {
        Self {
            online: AtomicBool::new(initially_online),
            listeners: Registry::new(),
        }
    }

    /// Latest known state.
    pub fn current(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Listen for transitions; the listener receives the new state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.listeners.subscribe(move |online: &bool| listener(*online))
    }

    /// Feed a connectivity signal. Returns true if the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }

        if online {
            tracing::info!("Connectivity restored");
        } else {
            tracing::info!("Connectivity lost, writes will be queued");
        }
        self.listeners.emit(&online);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(observer: &ConnectivityObserver) -> (Arc<Mutex<Vec<bool>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = observer.subscribe({
            let seen = Arc::clone(&seen);
            move |online| seen.lock().unwrap().push(online)
        });
        (seen, sub)
    }

    #[test]
    fn reports_initial_state() {
        assert!(ConnectivityObserver::new(true).current());
        assert!(!ConnectivityObserver::new(false).current());
    }

    #[test]
    fn notifies_only_on_transitions() {
        let observer = ConnectivityObserver::new(false);
        let (seen, _sub) = recorder(&observer);

        assert!(!observer.set_online(false));
        assert!(observer.set_online(true));
        assert!(!observer.set_online(true));
        assert!(observer.set_online(false));

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!observer.current());
    }

    #[test]
    fn unsubscribed_listener_hears_nothing() {
        let observer = ConnectivityObserver::new(false);
        let (seen, sub) = recorder(&observer);
        sub.unsubscribe();

        observer.set_online(true);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn state_is_updated_before_listeners_run() {
        let observer = Arc::new(ConnectivityObserver::new(false));
        let seen = Arc::new(Mutex::new(None));
        let _sub = observer.subscribe({
            let observer = Arc::downgrade(&observer);
            let seen = Arc::clone(&seen);
            move |_| {
                if let Some(observer) = observer.upgrade() {
                    *seen.lock().unwrap() = Some(observer.current());
                }
            }
        });

        observer.set_online(true);
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }
}
