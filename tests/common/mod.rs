//! Shared integration test helpers for evqueue.
//!
//! Provides in-memory fakes for every toolkit collaborator and a
//! [`Toolkit`] harness that wires them into an `EventQueueCore` with a
//! manually advanced `AlarmQueue`.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::Toolkit;
//! ```
//!
//! Component layout used by every test:
//!
//! ```text
//! MAIN_WINDOW (1) ── PANEL (10) ── EDITOR (11)
//!                 └─ HIDDEN_PANEL (30, not showing)
//! DIALOG (2) ─────── DIALOG_BUTTON (20)
//! ```

#![allow(dead_code)]

use evqueue::{
    AlarmQueue, ApplicationState, ComponentEvent, ComponentId, ComponentTree, DeliveryError,
    Event, EventQueueConfig, EventQueueCore, EventType, KeyDispatcher, KeyEvent, KeyEventKind,
    MouseDispatcher, MouseEvent, MouseEventKind, NativeQueue, PopupManager, WindowEvent,
    WindowEventKind, WindowManager,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

pub const MAIN_WINDOW: ComponentId = ComponentId(1);
pub const DIALOG: ComponentId = ComponentId(2);
pub const PANEL: ComponentId = ComponentId(10);
pub const EDITOR: ComponentId = ComponentId(11);
pub const DIALOG_BUTTON: ComponentId = ComponentId(20);
pub const HIDDEN_PANEL: ComponentId = ComponentId(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Error,
    Cancel,
}

#[derive(Default)]
pub struct FakeQueue {
    pending: RefCell<VecDeque<Event>>,
    delivered: RefCell<Vec<Event>>,
    failing_sources: RefCell<HashMap<ComponentId, Failure>>,
    pull_failures: Cell<usize>,
}

impl FakeQueue {
    pub fn post(&self, event: impl Into<Event>) {
        self.pending.borrow_mut().push_back(event.into());
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn delivered(&self) -> Vec<Event> {
        self.delivered.borrow().clone()
    }

    pub fn delivered_types(&self) -> Vec<EventType> {
        self.delivered.borrow().iter().map(Event::event_type).collect()
    }

    pub fn delivered_sources(&self) -> Vec<ComponentId> {
        self.delivered
            .borrow()
            .iter()
            .filter_map(Event::source)
            .collect()
    }

    pub fn fail_deliveries_from(&self, source: ComponentId, failure: Failure) {
        self.failing_sources.borrow_mut().insert(source, failure);
    }

    /// Make the next `count` pulls fail.
    pub fn fail_next_pulls(&self, count: usize) {
        self.pull_failures.set(count);
    }
}

impl NativeQueue for FakeQueue {
    fn peek_event(&self) -> Option<Event> {
        self.pending.borrow().front().cloned()
    }

    fn peek_event_of_type(&self, event_type: EventType) -> Option<Event> {
        self.pending
            .borrow()
            .iter()
            .find(|e| e.event_type() == event_type)
            .cloned()
    }

    fn next_event(&self) -> anyhow::Result<Event> {
        if self.pull_failures.get() > 0 {
            self.pull_failures.set(self.pull_failures.get() - 1);
            anyhow::bail!("native queue interrupted");
        }
        self.pending
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("native queue is empty"))
    }

    fn deliver(&self, event: &mut Event) -> Result<(), DeliveryError> {
        self.delivered.borrow_mut().push(event.clone());
        let failure = event
            .source()
            .and_then(|s| self.failing_sources.borrow().get(&s).copied());
        match failure {
            Some(Failure::Error) => Err(anyhow::anyhow!("handler for {event} panicked").into()),
            Some(Failure::Cancel) => Err(DeliveryError::Cancelled),
            None => Ok(()),
        }
    }
}

pub struct FakeTree {
    parents: HashMap<ComponentId, ComponentId>,
    windows: HashSet<ComponentId>,
    hidden: RefCell<HashSet<ComponentId>>,
    pub focus_owner: Cell<Option<ComponentId>>,
    pub focused_window: Cell<Option<ComponentId>>,
}

impl Default for FakeTree {
    fn default() -> Self {
        let parents = HashMap::from([
            (PANEL, MAIN_WINDOW),
            (EDITOR, PANEL),
            (HIDDEN_PANEL, MAIN_WINDOW),
            (DIALOG_BUTTON, DIALOG),
        ]);
        Self {
            parents,
            windows: HashSet::from([MAIN_WINDOW, DIALOG]),
            hidden: RefCell::new(HashSet::from([HIDDEN_PANEL])),
            focus_owner: Cell::new(Some(EDITOR)),
            focused_window: Cell::new(Some(MAIN_WINDOW)),
        }
    }
}

impl FakeTree {
    pub fn hide(&self, component: ComponentId) {
        self.hidden.borrow_mut().insert(component);
    }
}

impl ComponentTree for FakeTree {
    fn parent(&self, component: ComponentId) -> Option<ComponentId> {
        self.parents.get(&component).copied()
    }

    fn window_for(&self, component: ComponentId) -> Option<ComponentId> {
        let mut current = component;
        loop {
            if self.windows.contains(&current) {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }

    fn is_window(&self, component: ComponentId) -> bool {
        self.windows.contains(&component)
    }

    fn is_showing(&self, component: ComponentId) -> bool {
        !self.hidden.borrow().contains(&component)
    }

    fn focus_owner(&self) -> Option<ComponentId> {
        self.focus_owner.get()
    }

    fn focused_window(&self) -> Option<ComponentId> {
        self.focused_window.get()
    }
}

#[derive(Default)]
pub struct FakeKeys {
    pub claims: Cell<bool>,
    pub waiting_for_second_keystroke: Cell<bool>,
    pub seen: RefCell<Vec<KeyEvent>>,
}

impl KeyDispatcher for FakeKeys {
    fn dispatch_key_event(&self, event: &mut KeyEvent) -> bool {
        self.seen.borrow_mut().push(event.clone());
        self.claims.get()
    }

    fn is_waiting_for_second_keystroke(&self) -> bool {
        self.waiting_for_second_keystroke.get()
    }
}

#[derive(Default)]
pub struct FakeMice {
    pub claims: Cell<bool>,
    pub seen: RefCell<Vec<MouseEvent>>,
    pub blocked: RefCell<Vec<MouseEvent>>,
}

impl MouseDispatcher for FakeMice {
    fn dispatch_mouse_event(&self, event: &mut MouseEvent) -> bool {
        self.seen.borrow_mut().push(event.clone());
        self.claims.get()
    }

    fn block_next_events(&self, event: &MouseEvent) {
        self.blocked.borrow_mut().push(event.clone());
    }
}

#[derive(Default)]
pub struct FakePopup {
    pub active: Cell<bool>,
    pub handles: Cell<bool>,
    pub seen: Cell<usize>,
}

impl PopupManager for FakePopup {
    fn is_popup_active(&self) -> bool {
        self.active.get()
    }

    fn dispatch(&self, _event: &mut Event) -> bool {
        self.seen.set(self.seen.get() + 1);
        self.handles.get()
    }
}

pub struct FakeApp {
    pub active: Cell<bool>,
    pub applied: RefCell<Vec<(bool, ComponentId)>>,
}

impl Default for FakeApp {
    fn default() -> Self {
        Self {
            active: Cell::new(true),
            applied: RefCell::new(Vec::new()),
        }
    }
}

impl ApplicationState for FakeApp {
    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn apply_activation_state(&self, active: bool, window: ComponentId) {
        self.applied.borrow_mut().push((active, window));
        self.active.set(active);
    }
}

#[derive(Default)]
pub struct FakeWindowManager {
    pub seen: RefCell<Vec<ComponentEvent>>,
}

impl WindowManager for FakeWindowManager {
    fn dispatch_component_event(&self, event: &ComponentEvent) {
        self.seen.borrow_mut().push(event.clone());
    }
}

/// Headless config with both platform guards enabled, so behaviour does not
/// depend on the host OS.
pub fn test_config() -> EventQueueConfig {
    EventQueueConfig {
        headless: true,
        drop_input_from_hidden_components: true,
        drop_input_method_during_key_chord: true,
        ..EventQueueConfig::default()
    }
}

pub struct Toolkit {
    pub queue: Rc<FakeQueue>,
    pub tree: Rc<FakeTree>,
    pub keys: Rc<FakeKeys>,
    pub mice: Rc<FakeMice>,
    pub popup: Rc<FakePopup>,
    pub app: Rc<FakeApp>,
    pub window_manager: Rc<FakeWindowManager>,
    pub alarms: Arc<AlarmQueue>,
    pub core: Rc<EventQueueCore>,
}

impl Toolkit {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: EventQueueConfig) -> Self {
        let queue = Rc::new(FakeQueue::default());
        let tree = Rc::new(FakeTree::default());
        let keys = Rc::new(FakeKeys::default());
        let mice = Rc::new(FakeMice::default());
        let popup = Rc::new(FakePopup::default());
        let app = Rc::new(FakeApp::default());
        let window_manager = Rc::new(FakeWindowManager::default());
        let alarms = Arc::new(AlarmQueue::new());

        let core = EventQueueCore::builder(queue.clone(), tree.clone(), alarms.clone())
            .config(config)
            .popup_manager(popup.clone())
            .key_dispatcher(keys.clone())
            .mouse_dispatcher(mice.clone())
            .application(app.clone())
            .window_manager(window_manager.clone())
            .build();

        Self {
            queue,
            tree,
            keys,
            mice,
            popup,
            app,
            window_manager,
            alarms,
            core: Rc::new(core),
        }
    }

    /// Advance the alarm clock, firing due alarms through the core.
    pub fn advance(&self, millis: u64) {
        let target = evqueue::Scheduler::now(self.alarms.as_ref()) + Duration::from_millis(millis);
        self.core.run_due_alarms(&self.alarms, target);
    }

    pub fn dispatch(&self, event: impl Into<Event>) -> Event {
        let mut event = event.into();
        self.core
            .dispatch(&mut event)
            .expect("dispatch should not be cancelled");
        event
    }
}

pub fn key(kind: KeyEventKind, source: ComponentId) -> KeyEvent {
    KeyEvent::new(kind, source)
}

pub fn key_pressed(source: ComponentId) -> KeyEvent {
    KeyEvent::new(KeyEventKind::Pressed, source)
}

pub fn mouse(kind: MouseEventKind, source: ComponentId) -> MouseEvent {
    MouseEvent::new(kind, source)
}

pub fn window(kind: WindowEventKind, window: ComponentId) -> WindowEvent {
    WindowEvent::new(kind, window)
}

pub fn window_opened(window: ComponentId) -> WindowEvent {
    WindowEvent::new(WindowEventKind::Opened, window)
}
