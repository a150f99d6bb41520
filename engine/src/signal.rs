//! Observer registry.
//!
//! A [`Signal`] tracks connected handlers and broadcasts events to them in
//! connection order. Records use one to announce field changes, groups use
//! one for collection and focus events.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Signal::connect`], used to disconnect later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

struct Inner<E> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, Handler<E>)>>,
}

/// A single-threaded broadcast point for events of type `E`.
///
/// Cloning a signal yields another handle to the same handler list.
pub struct Signal<E> {
    inner: Rc<Inner<E>>,
}

impl<E> Signal<E> {
    /// Create a signal with no handlers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                next_id: Cell::new(0),
                handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register a handler.
    ///
    /// Returns the subscription ID.
    pub fn connect(&self, handler: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .handlers
            .borrow_mut()
            .push((id, Rc::new(handler)));
        id
    }

    /// Unregister a handler. Returns false if it was not connected.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    /// Broadcast an event to every connected handler.
    ///
    /// The handler list is snapshotted first, so handlers may connect or
    /// disconnect while the event is being delivered. Returns the number of
    /// handlers that received the event.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in &snapshot {
            handler(event);
        }

        snapshot.len()
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
