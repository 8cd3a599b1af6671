//! Observable values with change-filtered subscription
//!
//! An [`Observable<T>`] is a latest-value cell. Writers call [`Observable::set`];
//! readers either read the latest value directly, register a synchronous
//! observer, or hold an async [`Subscription`].
//!
//! Notifications are deduplicated: setting a value equal to the current one
//! is a no-op, so observers only ever see real changes. This is what lets
//! gesture code write positions every pointer event without waking every
//! derived computation downstream.
//!
//! ```ignore
//! let offset = Observable::new(0.0f32);
//! let mut sub = offset.subscribe();
//!
//! offset.set(12.0);
//! assert_eq!(sub.changed().await, Some(12.0));
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::sync::lock;

new_key_type! {
    /// Handle to a synchronous observer registered on an [`Observable`]
    pub struct ObserverId;
}

type ObserverFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ObservableInner<T> {
    /// Latest value; receivers of this channel are the async subscribers
    sender: watch::Sender<T>,
    /// Synchronous observers, notified in registration order
    observers: Mutex<SlotMap<ObserverId, ObserverFn<T>>>,
    /// Bumped on every real change
    version: AtomicU64,
}

/// A shared, change-filtered latest-value cell (cheap to clone)
pub struct Observable<T> {
    inner: Arc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.sender.borrow())
            .field("version", &self.inner.version.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Observable<T> {
    /// Create a new observable holding `initial`
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(ObservableInner {
                sender,
                observers: Mutex::new(SlotMap::with_key()),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Get a clone of the latest value
    pub fn get(&self) -> T {
        self.inner.sender.borrow().clone()
    }

    /// Read the latest value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.sender.borrow())
    }

    /// Set a new value
    ///
    /// Returns `true` if the value changed. Observers and subscribers are
    /// only notified on change.
    pub fn set(&self, value: T) -> bool {
        self.update(move |_| value)
    }

    /// Update the value using a function of the current value
    ///
    /// The read and the write happen under the same lock.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let changed = self.inner.sender.send_if_modified(|current| {
            let next = f(current);
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });

        if changed {
            self.inner.version.fetch_add(1, Ordering::AcqRel);
            self.notify();
        }
        changed
    }

    /// Number of real changes since creation
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Register a synchronous observer, called after every change
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        lock(&self.inner.observers).insert(Arc::new(observer))
    }

    /// Remove a previously registered observer
    pub fn unobserve(&self, id: ObserverId) -> bool {
        lock(&self.inner.observers).remove(id).is_some()
    }

    /// Subscribe to changes asynchronously
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.inner.sender.subscribe(),
        }
    }

    /// Create an observable that tracks `f` applied to this one
    ///
    /// The mapping observer lives as long as the source does.
    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let derived = Observable::new(self.with(&f));
        let target = derived.clone();
        self.observe(move |value| {
            target.set(f(value));
        });
        derived
    }

    fn notify(&self) {
        // Snapshot the observer list so observers may (un)register others
        let observers: SmallVec<[ObserverFn<T>; 4]> =
            lock(&self.inner.observers).values().cloned().collect();
        if observers.is_empty() {
            return;
        }

        let value = self.get();
        for observer in observers {
            observer(&value);
        }
    }
}

/// An async view of an [`Observable`]
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next change and return the new value
    ///
    /// Returns `None` once the observable has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Latest value, marking it as seen
    pub fn latest(&mut self) -> T {
        self.receiver.borrow_and_update().clone()
    }

    /// Whether a change happened since the last `changed`/`latest`
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observable_get_set() {
        let value = Observable::new(1i32);
        assert_eq!(value.get(), 1);

        assert!(value.set(42));
        assert_eq!(value.get(), 42);
        assert_eq!(value.version(), 1);
    }

    #[test]
    fn test_set_same_value_is_filtered() {
        let value = Observable::new(3.0f32);
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        value.observe(move |_| *calls_clone.lock().unwrap() += 1);

        assert!(!value.set(3.0));
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(value.version(), 0);

        assert!(value.set(4.0));
        assert!(!value.set(4.0));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_update() {
        let value = Observable::new(10i32);
        value.update(|v| v + 5);
        assert_eq!(value.get(), 15);
    }

    #[test]
    fn test_unobserve() {
        let value = Observable::new(0i32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let id = value.observe(move |v| seen_clone.lock().unwrap().push(*v));

        value.set(1);
        assert!(value.unobserve(id));
        value.set(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert!(!value.unobserve(id));
    }

    #[test]
    fn test_map_tracks_source() {
        let offset = Observable::new(0.0f32);
        let progress = offset.map(|v| (v.abs() / 100.0).clamp(0.0, 1.0));

        assert_eq!(progress.get(), 0.0);
        offset.set(-50.0);
        assert_eq!(progress.get(), 0.5);
        offset.set(400.0);
        assert_eq!(progress.get(), 1.0);
    }

    #[test]
    fn test_observer_can_write_other_observable() {
        let a = Observable::new(0i32);
        let b = Observable::new(0i32);
        let b_clone = b.clone();
        a.observe(move |v| {
            b_clone.set(v * 10);
        });

        a.set(4);
        assert_eq!(b.get(), 40);
    }

    #[tokio::test]
    async fn test_subscription_sees_changes() {
        let value = Observable::new(0u32);
        let mut sub = value.subscribe();
        assert!(!sub.has_changed());

        value.set(5);
        assert!(sub.has_changed());
        assert_eq!(sub.changed().await, Some(5));
        assert!(!sub.has_changed());

        // Unchanged writes do not wake subscribers
        value.set(5);
        assert!(!sub.has_changed());
        assert_eq!(sub.latest(), 5);
    }
}
