//! Events routed through the dispatch core.
//!
//! [`Event`] is a closed enum over every event category the native queue can
//! yield. Each payload carries its source component, a subtype kind, a
//! wall-clock timestamp and a mutable "consumed" flag.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use winit::event::MouseButton;
use winit::keyboard::{KeyCode, ModifiersState};

/// Opaque handle to a component (or window) owned by the host toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Pressed,
    Released,
    Typed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Pressed,
    Released,
    Clicked,
    Moved,
    Dragged,
    Entered,
    Exited,
    Wheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    Opened,
    Closing,
    Closed,
    Iconified,
    Deiconified,
    Activated,
    Deactivated,
    GainedFocus,
    LostFocus,
    StateChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentEventKind {
    Moved,
    Resized,
    Shown,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMethodEventKind {
    TextChanged,
    CaretPositionChanged,
}

/// Category plus subtype of an event, used to peek the native queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Key(KeyEventKind),
    Mouse(MouseEventKind),
    Window(WindowEventKind),
    Component(ComponentEventKind),
    InputMethod(InputMethodEventKind),
    Action,
    Invocation,
    Other(u32),
}

impl EventType {
    pub const WINDOW_OPENED: EventType = EventType::Window(WindowEventKind::Opened);
    pub const MOUSE_DRAGGED: EventType = EventType::Mouse(MouseEventKind::Dragged);
    pub const KEY_PRESSED: EventType = EventType::Key(KeyEventKind::Pressed);
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Key(KeyEventKind::Pressed) => "KEY_PRESSED",
            EventType::Key(KeyEventKind::Released) => "KEY_RELEASED",
            EventType::Key(KeyEventKind::Typed) => "KEY_TYPED",
            EventType::Mouse(MouseEventKind::Pressed) => "MOUSE_PRESSED",
            EventType::Mouse(MouseEventKind::Released) => "MOUSE_RELEASED",
            EventType::Mouse(MouseEventKind::Clicked) => "MOUSE_CLICKED",
            EventType::Mouse(MouseEventKind::Moved) => "MOUSE_MOVED",
            EventType::Mouse(MouseEventKind::Dragged) => "MOUSE_DRAGGED",
            EventType::Mouse(MouseEventKind::Entered) => "MOUSE_ENTERED",
            EventType::Mouse(MouseEventKind::Exited) => "MOUSE_EXITED",
            EventType::Mouse(MouseEventKind::Wheel) => "MOUSE_WHEEL",
            EventType::Window(WindowEventKind::Opened) => "WINDOW_OPENED",
            EventType::Window(WindowEventKind::Closing) => "WINDOW_CLOSING",
            EventType::Window(WindowEventKind::Closed) => "WINDOW_CLOSED",
            EventType::Window(WindowEventKind::Iconified) => "WINDOW_ICONIFIED",
            EventType::Window(WindowEventKind::Deiconified) => "WINDOW_DEICONIFIED",
            EventType::Window(WindowEventKind::Activated) => "WINDOW_ACTIVATED",
            EventType::Window(WindowEventKind::Deactivated) => "WINDOW_DEACTIVATED",
            EventType::Window(WindowEventKind::GainedFocus) => "WINDOW_GAINED_FOCUS",
            EventType::Window(WindowEventKind::LostFocus) => "WINDOW_LOST_FOCUS",
            EventType::Window(WindowEventKind::StateChanged) => "WINDOW_STATE_CHANGED",
            EventType::Component(ComponentEventKind::Moved) => "COMPONENT_MOVED",
            EventType::Component(ComponentEventKind::Resized) => "COMPONENT_RESIZED",
            EventType::Component(ComponentEventKind::Shown) => "COMPONENT_SHOWN",
            EventType::Component(ComponentEventKind::Hidden) => "COMPONENT_HIDDEN",
            EventType::InputMethod(InputMethodEventKind::TextChanged) => {
                "INPUT_METHOD_TEXT_CHANGED"
            }
            EventType::InputMethod(InputMethodEventKind::CaretPositionChanged) => {
                "CARET_POSITION_CHANGED"
            }
            EventType::Action => "ACTION_PERFORMED",
            EventType::Invocation => "INVOCATION_DEFAULT",
            EventType::Other(id) => return write!(f, "EVENT_{id}"),
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub source: ComponentId,
    pub key_code: Option<KeyCode>,
    pub key_char: Option<char>,
    pub modifiers: ModifiersState,
    pub when: SystemTime,
    consumed: bool,
}

impl KeyEvent {
    pub fn new(kind: KeyEventKind, source: ComponentId) -> Self {
        Self {
            kind,
            source,
            key_code: None,
            key_char: None,
            modifiers: ModifiersState::empty(),
            when: SystemTime::now(),
            consumed: false,
        }
    }

    pub fn with_key(mut self, key_code: KeyCode) -> Self {
        self.key_code = Some(key_code);
        self
    }

    pub fn with_char(mut self, key_char: char) -> Self {
        self.key_char = Some(key_char);
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifiersState) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub source: ComponentId,
    pub button: Option<MouseButton>,
    pub x: f64,
    pub y: f64,
    pub click_count: u32,
    pub modifiers: ModifiersState,
    pub when: SystemTime,
    consumed: bool,
}

impl MouseEvent {
    pub fn new(kind: MouseEventKind, source: ComponentId) -> Self {
        Self {
            kind,
            source,
            button: None,
            x: 0.0,
            y: 0.0,
            click_count: 0,
            modifiers: ModifiersState::empty(),
            when: SystemTime::now(),
            consumed: false,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// A top-level window event. `opposite` is the other window involved in a
/// focus or activation transfer, if it belongs to this application.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
    pub kind: WindowEventKind,
    pub window: ComponentId,
    pub opposite: Option<ComponentId>,
    pub when: SystemTime,
    consumed: bool,
}

impl WindowEvent {
    pub fn new(kind: WindowEventKind, window: ComponentId) -> Self {
        Self {
            kind,
            window,
            opposite: None,
            when: SystemTime::now(),
            consumed: false,
        }
    }

    pub fn with_opposite(mut self, opposite: ComponentId) -> Self {
        self.opposite = Some(opposite);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEvent {
    pub kind: ComponentEventKind,
    pub source: ComponentId,
    pub when: SystemTime,
    consumed: bool,
}

impl ComponentEvent {
    pub fn new(kind: ComponentEventKind, source: ComponentId) -> Self {
        Self {
            kind,
            source,
            when: SystemTime::now(),
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputMethodEvent {
    pub kind: InputMethodEventKind,
    pub source: ComponentId,
    pub committed_text: String,
    pub when: SystemTime,
    consumed: bool,
}

impl InputMethodEvent {
    pub fn new(kind: InputMethodEventKind, source: ComponentId) -> Self {
        Self {
            kind,
            source,
            committed_text: String::new(),
            when: SystemTime::now(),
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub source: ComponentId,
    pub command: String,
    pub when: SystemTime,
    consumed: bool,
}

impl ActionEvent {
    pub fn new(source: ComponentId, command: impl Into<String>) -> Self {
        Self {
            source,
            command: command.into(),
            when: SystemTime::now(),
            consumed: false,
        }
    }
}

/// A deferred callback posted to the queue. The description is supplied by
/// whoever posted it and only feeds diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationEvent {
    pub description: String,
    pub when: SystemTime,
    consumed: bool,
}

impl InvocationEvent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            when: SystemTime::now(),
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherEvent {
    pub id: u32,
    pub source: Option<ComponentId>,
    pub when: SystemTime,
    consumed: bool,
}

impl OtherEvent {
    pub fn new(id: u32, source: Option<ComponentId>) -> Self {
        Self {
            id,
            source,
            when: SystemTime::now(),
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Window(WindowEvent),
    Component(ComponentEvent),
    InputMethod(InputMethodEvent),
    Action(ActionEvent),
    Invocation(InvocationEvent),
    Other(OtherEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Key(e) => EventType::Key(e.kind),
            Event::Mouse(e) => EventType::Mouse(e.kind),
            Event::Window(e) => EventType::Window(e.kind),
            Event::Component(e) => EventType::Component(e.kind),
            Event::InputMethod(e) => EventType::InputMethod(e.kind),
            Event::Action(_) => EventType::Action,
            Event::Invocation(_) => EventType::Invocation,
            Event::Other(e) => EventType::Other(e.id),
        }
    }

    /// The component the event originated from, if any.
    pub fn source(&self) -> Option<ComponentId> {
        match self {
            Event::Key(e) => Some(e.source),
            Event::Mouse(e) => Some(e.source),
            Event::Window(e) => Some(e.window),
            Event::Component(e) => Some(e.source),
            Event::InputMethod(e) => Some(e.source),
            Event::Action(e) => Some(e.source),
            Event::Invocation(_) => None,
            Event::Other(e) => e.source,
        }
    }

    pub fn when(&self) -> SystemTime {
        match self {
            Event::Key(e) => e.when,
            Event::Mouse(e) => e.when,
            Event::Window(e) => e.when,
            Event::Component(e) => e.when,
            Event::InputMethod(e) => e.when,
            Event::Action(e) => e.when,
            Event::Invocation(e) => e.when,
            Event::Other(e) => e.when,
        }
    }

    fn consumed_flag(&mut self) -> &mut bool {
        match self {
            Event::Key(e) => &mut e.consumed,
            Event::Mouse(e) => &mut e.consumed,
            Event::Window(e) => &mut e.consumed,
            Event::Component(e) => &mut e.consumed,
            Event::InputMethod(e) => &mut e.consumed,
            Event::Action(e) => &mut e.consumed,
            Event::Invocation(e) => &mut e.consumed,
            Event::Other(e) => &mut e.consumed,
        }
    }

    pub fn consume(&mut self) {
        *self.consumed_flag() = true;
    }

    pub fn is_consumed(&self) -> bool {
        match self {
            Event::Key(e) => e.consumed,
            Event::Mouse(e) => e.consumed,
            Event::Window(e) => e.consumed,
            Event::Component(e) => e.consumed,
            Event::InputMethod(e) => e.consumed,
            Event::Action(e) => e.consumed,
            Event::Invocation(e) => e.consumed,
            Event::Other(e) => e.consumed,
        }
    }

    /// Key and mouse events.
    pub fn is_input(&self) -> bool {
        matches!(self, Event::Key(_) | Event::Mouse(_))
    }

    /// Events that count as user input for [`crate::EventQueueCore::is_in_input_event`].
    pub fn is_input_scope(&self) -> bool {
        matches!(
            self,
            Event::Key(_) | Event::Mouse(_) | Event::InputMethod(_) | Event::Window(_) | Event::Action(_)
        )
    }

    /// Input that restarts the idle-time accumulator and fires activity
    /// listeners. Raw pointer motion and key release do not qualify.
    pub fn is_qualifying_activity(&self) -> bool {
        matches!(
            self.event_type(),
            EventType::Key(KeyEventKind::Pressed | KeyEventKind::Typed)
                | EventType::Mouse(
                    MouseEventKind::Pressed | MouseEventKind::Released | MouseEventKind::Clicked
                )
        )
    }
}

impl From<KeyEvent> for Event {
    fn from(e: KeyEvent) -> Self {
        Event::Key(e)
    }
}

impl From<MouseEvent> for Event {
    fn from(e: MouseEvent) -> Self {
        Event::Mouse(e)
    }
}

impl From<WindowEvent> for Event {
    fn from(e: WindowEvent) -> Self {
        Event::Window(e)
    }
}

impl From<ComponentEvent> for Event {
    fn from(e: ComponentEvent) -> Self {
        Event::Component(e)
    }
}

impl From<InputMethodEvent> for Event {
    fn from(e: InputMethodEvent) -> Self {
        Event::InputMethod(e)
    }
}

impl From<ActionEvent> for Event {
    fn from(e: ActionEvent) -> Self {
        Event::Action(e)
    }
}

impl From<InvocationEvent> for Event {
    fn from(e: InvocationEvent) -> Self {
        Event::Invocation(e)
    }
}

impl From<OtherEvent> for Event {
    fn from(e: OtherEvent) -> Self {
        Event::Other(e)
    }
}

/// Diagnostic form used in logs: subtype, source and millisecond timestamp.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self
            .when()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        if let Event::Invocation(e) = self {
            return write!(f, "Invoke Later[{}] (when={millis})", e.description);
        }
        write!(f, "{}", self.event_type())?;
        if let Some(source) = self.source() {
            write!(f, " on {source}")?;
        }
        match self {
            Event::Key(e) => {
                if let Some(code) = e.key_code {
                    write!(f, " key={code:?}")?;
                }
                if let Some(ch) = e.key_char {
                    write!(f, " char={ch:?}")?;
                }
            }
            Event::Mouse(e) => write!(f, " at ({}, {})", e.x, e.y)?,
            Event::Window(e) => {
                if let Some(opposite) = e.opposite {
                    write!(f, " opposite={opposite}")?;
                }
            }
            Event::Action(e) => write!(f, " command={:?}", e.command)?,
            _ => {}
        }
        write!(f, " (when={millis})")
    }
}
