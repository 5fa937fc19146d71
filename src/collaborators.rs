//! Narrow capability traits the dispatch core consumes from the host toolkit.
//!
//! The core is single-threaded: every collaborator is called on the GUI
//! thread, synchronously, and may call back into the core (nested dispatch is
//! expected). Implementations use interior mutability as needed.

use crate::error::DeliveryError;
use crate::event::{ComponentEvent, ComponentId, Event, EventType, KeyEvent, MouseEvent};

/// The toolkit's native event queue.
pub trait NativeQueue {
    /// The next event without removing it, if any.
    fn peek_event(&self) -> Option<Event>;

    /// The first pending event of the given type without removing it.
    fn peek_event_of_type(&self, event_type: EventType) -> Option<Event>;

    /// Remove and return the next event, blocking until one is available.
    fn next_event(&self) -> anyhow::Result<Event>;

    /// The toolkit's own delivery of an event to its target component.
    fn deliver(&self, event: &mut Event) -> Result<(), DeliveryError>;
}

/// Focus and component-hierarchy queries.
pub trait ComponentTree {
    fn parent(&self, component: ComponentId) -> Option<ComponentId>;

    /// The top-level window containing `component` (itself, for a window).
    fn window_for(&self, component: ComponentId) -> Option<ComponentId>;

    fn is_window(&self, component: ComponentId) -> bool;

    /// Whether the component is currently displayed on screen.
    fn is_showing(&self, component: ComponentId) -> bool;

    fn focus_owner(&self) -> Option<ComponentId>;

    fn focused_window(&self) -> Option<ComponentId>;
}

/// Popups get first refusal on every event while one is open.
pub trait PopupManager {
    fn is_popup_active(&self) -> bool;

    /// Returns `true` when the popup handled the event.
    fn dispatch(&self, event: &mut Event) -> bool;
}

/// Keyboard-shortcut resolution.
pub trait KeyDispatcher {
    /// Returns `true` when a shortcut claimed the event.
    fn dispatch_key_event(&self, event: &mut KeyEvent) -> bool;

    /// Whether the first keystroke of a multi-key shortcut has been seen.
    fn is_waiting_for_second_keystroke(&self) -> bool;
}

/// Mouse-shortcut resolution.
pub trait MouseDispatcher {
    /// Returns `true` when the event was handled and must not be delivered.
    fn dispatch_mouse_event(&self, event: &mut MouseEvent) -> bool;

    /// Swallow the rest of the gesture that `event` started.
    fn block_next_events(&self, event: &MouseEvent);
}

/// Application-wide activation state.
pub trait ApplicationState {
    fn is_active(&self) -> bool;

    fn apply_activation_state(&self, active: bool, window: ComponentId);
}

/// Receives component move/resize/show/hide notifications.
pub trait WindowManager {
    fn dispatch_component_event(&self, event: &ComponentEvent);
}
