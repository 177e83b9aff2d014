use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handles are unique across every observable, so a handle from one source
/// can never remove a listener from another.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Token returned by [`Observable::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

type Handler<T> = Rc<dyn Fn(&T)>;

/// A list of listeners notified synchronously, in subscription order.
///
/// Notification walks a snapshot of the list, so a handler may subscribe or
/// unsubscribe (itself or others) while being notified. A listener removed
/// mid-notification is not called afterwards.
pub struct Observable<T> {
    observers: RefCell<Vec<(SubscriptionHandle, Handler<T>)>>,
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl<T> Observable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionHandle {
        let handle = SubscriptionHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        self.observers.borrow_mut().push((handle, Rc::new(handler)));
        handle
    }

    /// Remove a listener. Returns false if the handle was not registered here.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(h, _)| *h != handle);
        observers.len() != before
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.observers.borrow().iter().any(|(h, _)| *h == handle)
    }

    pub fn notify(&self, value: &T) {
        let snapshot: Vec<(SubscriptionHandle, Handler<T>)> = self
            .observers
            .borrow()
            .iter()
            .map(|(h, f)| (*h, Rc::clone(f)))
            .collect();
        for (handle, handler) in snapshot {
            if self.is_subscribed(handle) {
                handler(value);
            }
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}
