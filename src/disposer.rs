//! Disposal scopes: registrations that undo themselves when a scope ends.

use std::cell::{Cell, RefCell};
use std::fmt;

type Teardown = Box<dyn FnOnce()>;

/// Owns teardown actions and runs each exactly once, either on an explicit
/// [`dispose`](Self::dispose) or when the scope is dropped.
///
/// Actions registered after disposal run immediately. Scopes belong to the
/// GUI thread.
#[derive(Default)]
pub struct DisposalScope {
    name: String,
    actions: RefCell<Vec<Teardown>>,
    disposed: Cell<bool>,
}

impl fmt::Debug for DisposalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposalScope")
            .field("name", &self.name)
            .field("pending", &self.actions.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl DisposalScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub fn register(&self, teardown: impl FnOnce() + 'static) {
        if self.disposed.get() {
            teardown();
        } else {
            self.actions.borrow_mut().push(Box::new(teardown));
        }
    }

    /// Run all pending teardown actions, most recently registered first.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let actions = std::mem::take(&mut *self.actions.borrow_mut());
        log::debug!(
            "Disposing scope '{}' ({} registrations)",
            self.name,
            actions.len()
        );
        for teardown in actions.into_iter().rev() {
            teardown();
        }
    }
}

impl Drop for DisposalScope {
    fn drop(&mut self) {
        self.dispose();
    }
}
