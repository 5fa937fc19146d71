//! The event dispatch core.
//!
//! Every event pulled from the native queue passes through
//! [`EventQueueCore::dispatch`], which runs, in order: the activation
//! short-circuit, the suspend-mode entry check, idle/activity notification,
//! the popup, the dispatcher chain, platform guards, and finally key/mouse
//! shortcut handling or the toolkit's default delivery.
//!
//! The core lives on the GUI thread and is reentrant: collaborators may call
//! `dispatch` (or pump a nested modal loop) from inside a dispatch. Only the
//! idle/activity registries are shared across threads, through
//! [`EventQueueCore::activity_tracker`].

use crate::alarm::{AlarmQueue, AlarmRequest, Scheduler};
use crate::collaborators::{
    ApplicationState, ComponentTree, KeyDispatcher, MouseDispatcher, NativeQueue, PopupManager,
    WindowManager,
};
use crate::dispatcher::{Dispatcher, DispatcherChain};
use crate::disposer::DisposalScope;
use crate::error::{Cancelled, DeliveryError, EventQueueError};
use crate::event::{ComponentId, Event, EventType, MouseEvent, WindowEventKind};
use crate::idle::{IdleActivityTracker, Listener, ListenerId};
use crate::suspend::{SuspendModeController, SuspendState};
use evqueue_config::EventQueueConfig;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Collects the collaborators for an [`EventQueueCore`].
///
/// Only the native queue, the component tree and the scheduler are required;
/// a missing popup manager behaves as "no popup open", a missing key or mouse
/// dispatcher never claims events, and a missing application state disables
/// the activation short-circuit. Without an explicit
/// [`config`](Self::config) the defaults apply, with the `EVQUEUE_HEADLESS`
/// override honoured.
pub struct EventQueueBuilder {
    config: EventQueueConfig,
    native: Rc<dyn NativeQueue>,
    components: Rc<dyn ComponentTree>,
    scheduler: Arc<dyn Scheduler>,
    popups: Option<Rc<dyn PopupManager>>,
    keys: Option<Rc<dyn KeyDispatcher>>,
    mice: Option<Rc<dyn MouseDispatcher>>,
    application: Option<Rc<dyn ApplicationState>>,
    window_manager: Option<Rc<dyn WindowManager>>,
}

impl EventQueueBuilder {
    pub fn config(mut self, config: EventQueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn popup_manager(mut self, popups: Rc<dyn PopupManager>) -> Self {
        self.popups = Some(popups);
        self
    }

    pub fn key_dispatcher(mut self, keys: Rc<dyn KeyDispatcher>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn mouse_dispatcher(mut self, mice: Rc<dyn MouseDispatcher>) -> Self {
        self.mice = Some(mice);
        self
    }

    pub fn application(mut self, application: Rc<dyn ApplicationState>) -> Self {
        self.application = Some(application);
        self
    }

    pub fn window_manager(mut self, window_manager: Rc<dyn WindowManager>) -> Self {
        self.window_manager = Some(window_manager);
        self
    }

    pub fn build(self) -> EventQueueCore {
        let tracker = Arc::new(IdleActivityTracker::new(
            Arc::clone(&self.scheduler),
            &self.config,
        ));
        let suspend = SuspendModeController::new(
            Arc::clone(&self.scheduler),
            self.config.suspend_enter_timeout(),
            self.config.suspend_retry_timeout(),
        );
        log::info!(
            "Event queue ready (suspend {}ms/{}ms, idle counter {})",
            self.config.suspend_enter_timeout_ms,
            self.config.suspend_retry_timeout_ms,
            if self.config.headless {
                "disabled".to_string()
            } else {
                format!("{}ms", self.config.idle_time_counter_interval_ms)
            }
        );
        EventQueueCore {
            config: self.config,
            native: self.native,
            components: self.components,
            popups: self.popups,
            keys: self.keys,
            mice: self.mice,
            application: self.application,
            window_manager: RefCell::new(self.window_manager),
            dispatchers: Rc::new(DispatcherChain::new()),
            tracker,
            suspend,
            event_count: Cell::new(0),
            current_event: RefCell::new(None),
            in_input_event: Cell::new(false),
        }
    }
}

pub struct EventQueueCore {
    config: EventQueueConfig,
    native: Rc<dyn NativeQueue>,
    components: Rc<dyn ComponentTree>,
    popups: Option<Rc<dyn PopupManager>>,
    keys: Option<Rc<dyn KeyDispatcher>>,
    mice: Option<Rc<dyn MouseDispatcher>>,
    application: Option<Rc<dyn ApplicationState>>,
    window_manager: RefCell<Option<Rc<dyn WindowManager>>>,
    dispatchers: Rc<DispatcherChain>,
    tracker: Arc<IdleActivityTracker>,
    suspend: SuspendModeController,
    event_count: Cell<u64>,
    current_event: RefCell<Option<Event>>,
    in_input_event: Cell<bool>,
}

/// Installs an event as current and restores the outer one on drop, however
/// the dispatch exits.
struct CurrentEventGuard<'a> {
    core: &'a EventQueueCore,
    previous: Option<Event>,
    was_in_input_event: bool,
}

impl<'a> CurrentEventGuard<'a> {
    fn install(core: &'a EventQueueCore, event: &Event) -> Self {
        let previous = core.current_event.replace(Some(event.clone()));
        let was_in_input_event = core.in_input_event.replace(event.is_input_scope());
        Self {
            core,
            previous,
            was_in_input_event,
        }
    }
}

impl Drop for CurrentEventGuard<'_> {
    fn drop(&mut self) {
        self.core.current_event.replace(self.previous.take());
        self.core.in_input_event.set(self.was_in_input_event);
    }
}

impl EventQueueCore {
    pub fn builder(
        native: Rc<dyn NativeQueue>,
        components: Rc<dyn ComponentTree>,
        scheduler: Arc<dyn Scheduler>,
    ) -> EventQueueBuilder {
        let mut config = EventQueueConfig::default();
        config.apply_env_overrides();
        EventQueueBuilder {
            config,
            native,
            components,
            scheduler,
            popups: None,
            keys: None,
            mice: None,
            application: None,
            window_manager: None,
        }
    }

    pub fn config(&self) -> &EventQueueConfig {
        &self.config
    }

    /// Route one event through the interception chain to its handler.
    ///
    /// Delivery failures are logged and swallowed; only cancellation is
    /// returned.
    pub fn dispatch(&self, event: &mut Event) -> Result<(), Cancelled> {
        let started = log::log_enabled!(log::Level::Debug).then(Instant::now);

        let result = {
            let _current = CurrentEventGuard::install(self, event);
            self.dispatch_event(event)
        };

        if let Some(started) = started {
            let elapsed = started.elapsed();
            if elapsed > self.config.long_event_threshold() {
                log::debug!("Long event: {}ms - {}", elapsed.as_millis(), event);
            }
        }
        result
    }

    fn dispatch_event(&self, event: &mut Event) -> Result<(), Cancelled> {
        self.event_count.set(self.event_count.get().wrapping_add(1));

        if self.process_activation_event(event) {
            return Ok(());
        }

        if !self.is_popup_active()
            && matches!(event, Event::Key(_))
            && !self.suspend.is_suspended()
            && self
                .native
                .peek_event_of_type(EventType::WINDOW_OPENED)
                .is_some()
        {
            self.suspend.enter(self.components.focus_owner());
        }

        if matches!(event, Event::Window(_)) {
            self.tracker.note_window_activity();
        } else if event.is_input() {
            self.tracker.note_input(event.is_qualifying_activity());
        }

        if let Some(popups) = &self.popups
            && popups.is_popup_active()
            && popups.dispatch(event)
        {
            return Ok(());
        }

        if self.dispatchers.dispatch(event) {
            return Ok(());
        }

        if matches!(event, Event::InputMethod(_))
            && self.config.drop_input_method_during_key_chord
            && self.is_waiting_for_second_keystroke()
        {
            return Ok(());
        }

        if event.is_input()
            && self.config.drop_input_from_hidden_components
            && let Some(source) = event.source()
            && !self.components.is_showing(source)
        {
            log::trace!("Dropping {} from a hidden component", event);
            return Ok(());
        }

        if let Event::Component(component_event) = event {
            let window_manager = self.window_manager.borrow().clone();
            if let Some(window_manager) = window_manager {
                window_manager.dispatch_component_event(component_event);
            }
        }

        match event {
            Event::Key(key_event) => {
                if !self.suspend.is_suspended()
                    && let Some(keys) = &self.keys
                    && keys.dispatch_key_event(key_event)
                {
                    key_event.consume();
                }
                self.default_dispatch(event)
            }
            Event::Mouse(mouse_event) => {
                let handled = match &self.mice {
                    Some(mice) => mice.dispatch_mouse_event(mouse_event),
                    None => false,
                };
                if handled {
                    Ok(())
                } else {
                    self.default_dispatch(event)
                }
            }
            _ => self.default_dispatch(event),
        }
    }

    /// Top-level focus moving in from or out to another application flips
    /// the application's active state instead of being delivered.
    fn process_activation_event(&self, event: &Event) -> bool {
        let (Some(application), Event::Window(window_event)) = (&self.application, event) else {
            return false;
        };
        if window_event.opposite.is_some() {
            return false;
        }
        match window_event.kind {
            WindowEventKind::GainedFocus if !application.is_active() => {
                application.apply_activation_state(true, window_event.window);
                true
            }
            WindowEventKind::LostFocus if application.is_active() => {
                application.apply_activation_state(false, window_event.window);
                true
            }
            _ => false,
        }
    }

    fn default_dispatch(&self, event: &mut Event) -> Result<(), Cancelled> {
        match self.native.deliver(event) {
            Ok(()) => Ok(()),
            Err(DeliveryError::Cancelled) => Err(Cancelled),
            Err(DeliveryError::Failed(source)) => {
                let err = EventQueueError::Dispatch {
                    event: event.to_string(),
                    source,
                };
                log::error!("{err}");
                Ok(())
            }
        }
    }

    /// Dispatch everything currently queued, without blocking for more.
    pub fn flush_queue(&self) -> Result<(), Cancelled> {
        while self.native.peek_event().is_some() {
            let mut event = match self.native.next_event() {
                Ok(event) => event,
                Err(err) => {
                    log::error!("Failed to pull event while flushing queue: {err:#}");
                    return Ok(());
                }
            };
            self.dispatch(&mut event)?;
        }
        Ok(())
    }

    /// Nested modal loop: pull and dispatch events until `exit_condition`
    /// holds for the last pulled event (`None` if the pull failed).
    ///
    /// Key and mouse events from outside `root`'s window are consumed and
    /// dropped rather than dispatched.
    pub fn pump_events_for_hierarchy(
        &self,
        root: ComponentId,
        mut exit_condition: impl FnMut(Option<&Event>) -> bool,
    ) -> Result<(), Cancelled> {
        loop {
            let event = match self.native.next_event() {
                Ok(mut event) => {
                    if self.is_outside_modal_hierarchy(&event, root) {
                        log::trace!("Discarding {} outside modal hierarchy of {}", event, root);
                        event.consume();
                    } else {
                        self.dispatch(&mut event)?;
                    }
                    Some(event)
                }
                Err(err) => {
                    log::error!("Failed to pull event for modal pump: {err:#}");
                    None
                }
            };
            if exit_condition(event.as_ref()) {
                return Ok(());
            }
        }
    }

    fn is_outside_modal_hierarchy(&self, event: &Event, root: ComponentId) -> bool {
        if !event.is_input() {
            return false;
        }
        let Some(mut component) = event.source() else {
            return false;
        };
        let modal_window = self.components.window_for(root);
        loop {
            if Some(component) == modal_window {
                return false;
            }
            match self.components.parent(component) {
                Some(parent) => component = parent,
                None => return true,
            }
        }
    }

    /// Handle an alarm previously scheduled through the core's scheduler.
    pub fn on_alarm(&self, request: AlarmRequest) {
        match request {
            AlarmRequest::ExitSuspendMode => self.suspend.on_alarm(self.native.as_ref()),
            AlarmRequest::FireIdle(id) => self.tracker.fire_idle(id),
            AlarmRequest::CountIdleTime => self.tracker.count_idle_time(),
        }
    }

    /// Fire every alarm in `alarms` that is due at `now`.
    pub fn run_due_alarms(&self, alarms: &AlarmQueue, now: Instant) {
        alarms.advance_to(now, |request| self.on_alarm(request));
    }

    /// Focus-owner change notification from the toolkit.
    pub fn on_focus_owner_changed(&self) {
        let focus_owner = self.components.focus_owner();
        let owner_is_window = focus_owner.is_some_and(|owner| self.components.is_window(owner));
        self.suspend.on_focus_owner_changed(
            self.native.as_ref(),
            self.components.focused_window(),
            focus_owner,
            owner_is_window,
        );
    }

    pub fn set_window_manager(&self, window_manager: Option<Rc<dyn WindowManager>>) {
        *self.window_manager.borrow_mut() = window_manager;
    }

    /// Register an interceptor; with a scope it is removed when the scope is
    /// disposed. Registering the same dispatcher twice is a no-op.
    pub fn register_dispatcher(&self, dispatcher: Rc<dyn Dispatcher>, scope: Option<&DisposalScope>) {
        match scope {
            Some(scope) => self.dispatchers.add_scoped(dispatcher, scope),
            None => {
                self.dispatchers.add(dispatcher);
            }
        }
    }

    pub fn remove_dispatcher(&self, dispatcher: &Rc<dyn Dispatcher>) -> bool {
        self.dispatchers.remove(dispatcher)
    }

    pub fn register_idle_listener(
        &self,
        listener: &Listener,
        timeout: Duration,
    ) -> Result<ListenerId, EventQueueError> {
        self.tracker.register_idle_listener(listener, timeout)
    }

    pub fn unregister_idle_listener(&self, listener: &Listener) -> Result<(), EventQueueError> {
        self.tracker.unregister_idle_listener(listener)
    }

    pub fn register_activity_listener(&self, listener: Listener, scope: Option<&DisposalScope>) {
        match scope {
            Some(scope) => self.tracker.register_activity_listener_scoped(listener, scope),
            None => self.tracker.register_activity_listener(listener),
        }
    }

    pub fn remove_activity_listener(&self, listener: &Listener) -> Result<(), EventQueueError> {
        self.tracker.remove_activity_listener(listener)
    }

    /// Shareable handle for registering listeners from other threads.
    pub fn activity_tracker(&self) -> Arc<IdleActivityTracker> {
        Arc::clone(&self.tracker)
    }

    /// Changes with every dispatched event; only meaningful for comparing
    /// snapshots taken during this process.
    pub fn event_count(&self) -> u64 {
        self.event_count.get()
    }

    pub fn set_event_count(&self, count: u64) {
        self.event_count.set(count);
    }

    pub fn idle_time(&self) -> Duration {
        self.tracker.idle_time()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspend.is_suspended()
    }

    pub fn suspend_state(&self) -> SuspendState {
        self.suspend.state()
    }

    /// Editors should not accept typing while shortcuts are suspended or a
    /// multi-key shortcut is half entered.
    pub fn should_suppress_text_input(&self) -> bool {
        self.is_waiting_for_second_keystroke() || self.suspend.is_suspended()
    }

    pub fn block_next_events(&self, event: &MouseEvent) {
        if let Some(mice) = &self.mice {
            mice.block_next_events(event);
        }
    }

    /// Copy of the innermost event being dispatched, as it was on entry.
    pub fn current_event(&self) -> Option<Event> {
        self.current_event.borrow().clone()
    }

    /// Whether the innermost event being dispatched is user input (key,
    /// mouse, input method, window or action).
    pub fn is_in_input_event(&self) -> bool {
        self.in_input_event.get()
    }

    fn is_popup_active(&self) -> bool {
        self.popups.as_ref().is_some_and(|p| p.is_popup_active())
    }

    fn is_waiting_for_second_keystroke(&self) -> bool {
        self.keys
            .as_ref()
            .is_some_and(|k| k.is_waiting_for_second_keystroke())
    }
}
