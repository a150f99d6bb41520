//! Request context and the ambient session.
//!
//! Every remote call carries a context: the session's keys (locale, active
//! user, ...) with the group's own keys layered on top.

use serde_json::{Map, Value};
use std::cell::RefCell;

/// Request-scoping key/value pairs.
pub type Context = Map<String, Value>;

/// Layer `top` over `base`; keys in `top` win.
pub fn merge(base: &Context, top: &Context) -> Context {
    let mut merged = base.clone();
    for (key, value) in top {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Session-scoped ambient context shared by every group of a client.
#[derive(Debug, Default)]
pub struct Session {
    context: RefCell<Context>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with a context.
    pub fn with_context(context: Context) -> Self {
        Self {
            context: RefCell::new(context),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.context.borrow_mut().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.context.borrow_mut().remove(key)
    }

    /// Copy of the current session context.
    pub fn snapshot(&self) -> Context {
        self.context.borrow().clone()
    }

    /// Session context with `context` layered on top.
    pub fn merged(&self, context: &Context) -> Context {
        merge(&self.context.borrow(), context)
    }
}
