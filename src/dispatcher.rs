//! Pluggable interceptors consulted before default event handling.

use crate::disposer::DisposalScope;
use crate::event::Event;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An interceptor in the dispatch chain.
pub trait Dispatcher {
    /// Returns `true` when the event was consumed and must go no further.
    fn dispatch(&self, event: &mut Event) -> bool;
}

impl<F> Dispatcher for F
where
    F: Fn(&mut Event) -> bool,
{
    fn dispatch(&self, event: &mut Event) -> bool {
        self(event)
    }
}

fn same_dispatcher(a: &Rc<dyn Dispatcher>, b: &Rc<dyn Dispatcher>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Insertion-ordered set of dispatchers, compared by identity.
#[derive(Default)]
pub struct DispatcherChain {
    dispatchers: RefCell<Vec<Rc<dyn Dispatcher>>>,
}

impl DispatcherChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `dispatcher` unless it is already registered.
    pub fn add(&self, dispatcher: Rc<dyn Dispatcher>) -> bool {
        let mut dispatchers = self.dispatchers.borrow_mut();
        if dispatchers.iter().any(|d| same_dispatcher(d, &dispatcher)) {
            return false;
        }
        dispatchers.push(dispatcher);
        true
    }

    /// Register `dispatcher` and remove it when `scope` is disposed.
    pub fn add_scoped(self: &Rc<Self>, dispatcher: Rc<dyn Dispatcher>, scope: &DisposalScope) {
        let weak_dispatcher: Weak<dyn Dispatcher> = Rc::downgrade(&dispatcher);
        self.add(dispatcher);
        let chain: Weak<Self> = Rc::downgrade(self);
        scope.register(move || {
            if let Some(chain) = chain.upgrade()
                && let Some(dispatcher) = weak_dispatcher.upgrade()
            {
                chain.remove(&dispatcher);
            }
        });
    }

    pub fn remove(&self, dispatcher: &Rc<dyn Dispatcher>) -> bool {
        let mut dispatchers = self.dispatchers.borrow_mut();
        let before = dispatchers.len();
        dispatchers.retain(|d| !same_dispatcher(d, dispatcher));
        dispatchers.len() != before
    }

    pub fn contains(&self, dispatcher: &Rc<dyn Dispatcher>) -> bool {
        self.dispatchers
            .borrow()
            .iter()
            .any(|d| same_dispatcher(d, dispatcher))
    }

    pub fn len(&self) -> usize {
        self.dispatchers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.borrow().is_empty()
    }

    /// Offer `event` to each dispatcher in registration order; stops at the
    /// first one that consumes it.
    ///
    /// Iterates a snapshot so dispatchers may add or remove entries (or
    /// dispatch nested events) from inside their own callback.
    pub fn dispatch(&self, event: &mut Event) -> bool {
        let snapshot: Vec<Rc<dyn Dispatcher>> = self.dispatchers.borrow().clone();
        snapshot.iter().any(|d| d.dispatch(event))
    }
}
