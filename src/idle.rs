//! Idle and activity listeners.
//!
//! Idle listeners fire repeatedly after a period without key or mouse input;
//! any key or mouse event restarts every countdown. Activity listeners fire
//! synchronously on qualifying input (presses, typed keys, clicks).
//!
//! Registration may happen from any thread, so listener collections sit behind
//! one `parking_lot::Mutex`. Callbacks always run with the lock released, on
//! the GUI thread that handles the alarms and input.

use crate::alarm::{AlarmChannel, AlarmRequest, Scheduler};
use crate::disposer::DisposalScope;
use crate::error::EventQueueError;
use evqueue_config::EventQueueConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Identifies the alarm that belongs to one idle-listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct ListenerInner {
    name: String,
    callback: Box<dyn Fn() + Send + Sync>,
}

/// A named callback. Clones share identity; two listeners built from the same
/// closure are still distinct.
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

impl Listener {
    pub fn new(name: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(ListenerInner {
                name: name.into(),
                callback: Box::new(callback),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn same_as(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self) {
        (self.inner.callback)();
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.inner.name).finish()
    }
}

struct IdleEntry {
    id: ListenerId,
    listener: Listener,
    timeout: Duration,
}

struct TrackerState {
    idle: Vec<IdleEntry>,
    activity: Vec<Listener>,
    next_id: u64,
    idle_time: Duration,
    last_active: Instant,
}

/// Idle-timer bookkeeping, activity fan-out and the idle-time accumulator.
pub struct IdleActivityTracker {
    scheduler: Arc<dyn Scheduler>,
    idle_counter_interval: Duration,
    idle_counter_enabled: bool,
    activity_count: AtomicU64,
    state: Mutex<TrackerState>,
}

impl fmt::Debug for IdleActivityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IdleActivityTracker")
            .field("idle_listeners", &state.idle.len())
            .field("activity_listeners", &state.activity.len())
            .field("idle_time", &state.idle_time)
            .field("activity_count", &self.activity_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl IdleActivityTracker {
    /// Create the tracker and start the idle-time accumulator unless the
    /// config is headless.
    pub fn new(scheduler: Arc<dyn Scheduler>, config: &EventQueueConfig) -> Self {
        let tracker = Self {
            idle_counter_interval: config.idle_time_counter_interval(),
            idle_counter_enabled: !config.headless,
            activity_count: AtomicU64::new(0),
            state: Mutex::new(TrackerState {
                idle: Vec::new(),
                activity: Vec::new(),
                next_id: 0,
                idle_time: Duration::ZERO,
                last_active: scheduler.now(),
            }),
            scheduler,
        };
        {
            let mut state = tracker.state.lock();
            tracker.restart_idle_time_counter(&mut state);
        }
        tracker
    }

    /// Register `listener` to be called every `timeout` without input.
    pub fn register_idle_listener(
        &self,
        listener: &Listener,
        timeout: Duration,
    ) -> Result<ListenerId, EventQueueError> {
        if timeout.is_zero() {
            return Err(EventQueueError::InvalidTimeout(listener.name().to_string()));
        }
        let mut state = self.state.lock();
        if state.idle.iter().any(|e| e.listener.same_as(listener)) {
            return Err(EventQueueError::DuplicateListener(listener.name().to_string()));
        }
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.idle.push(IdleEntry {
            id,
            listener: listener.clone(),
            timeout,
        });
        self.scheduler
            .schedule_once(AlarmRequest::FireIdle(id), timeout);
        log::debug!(
            "Registered idle listener '{}' ({}ms)",
            listener.name(),
            timeout.as_millis()
        );
        Ok(id)
    }

    pub fn unregister_idle_listener(&self, listener: &Listener) -> Result<(), EventQueueError> {
        let mut state = self.state.lock();
        let Some(index) = state.idle.iter().position(|e| e.listener.same_as(listener)) else {
            log::error!("unknown idle listener: {}", listener.name());
            return Err(EventQueueError::UnknownListener(listener.name().to_string()));
        };
        let entry = state.idle.remove(index);
        self.scheduler.cancel(AlarmRequest::FireIdle(entry.id));
        log::debug!("Unregistered idle listener '{}'", listener.name());
        Ok(())
    }

    pub fn register_activity_listener(&self, listener: Listener) {
        log::debug!("Registered activity listener '{}'", listener.name());
        self.state.lock().activity.push(listener);
    }

    /// Register an activity listener that is removed when `scope` is disposed.
    pub fn register_activity_listener_scoped(
        self: &Arc<Self>,
        listener: Listener,
        scope: &DisposalScope,
    ) {
        self.register_activity_listener(listener.clone());
        let tracker: Weak<Self> = Arc::downgrade(self);
        scope.register(move || {
            if let Some(tracker) = tracker.upgrade() {
                let mut state = tracker.state.lock();
                if let Some(index) = state.activity.iter().position(|l| l.same_as(&listener)) {
                    state.activity.remove(index);
                }
            }
        });
    }

    pub fn remove_activity_listener(&self, listener: &Listener) -> Result<(), EventQueueError> {
        let mut state = self.state.lock();
        match state.activity.iter().position(|l| l.same_as(listener)) {
            Some(index) => {
                state.activity.remove(index);
                Ok(())
            }
            None => {
                log::error!("unknown activity listener: {}", listener.name());
                Err(EventQueueError::UnknownListener(listener.name().to_string()))
            }
        }
    }

    pub fn idle_listener_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub fn activity_listener_count(&self) -> usize {
        self.state.lock().activity.len()
    }

    /// Total idle time accumulated so far; never decreases.
    pub fn idle_time(&self) -> Duration {
        self.state.lock().idle_time
    }

    /// Number of window, key and mouse events seen.
    pub fn activity_count(&self) -> u64 {
        self.activity_count.load(Ordering::Relaxed)
    }

    pub(crate) fn note_window_activity(&self) {
        self.activity_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Key or mouse input: restart every idle countdown at its own timeout
    /// and, for qualifying input, notify activity listeners.
    pub(crate) fn note_input(&self, qualifying: bool) {
        self.activity_count.fetch_add(1, Ordering::Relaxed);

        let activity = {
            let mut state = self.state.lock();
            self.scheduler.cancel_all(AlarmChannel::IdleRequests);
            for entry in &state.idle {
                self.scheduler
                    .schedule_once(AlarmRequest::FireIdle(entry.id), entry.timeout);
            }
            if !qualifying {
                return;
            }
            self.restart_idle_time_counter(&mut state);
            state.activity.clone()
        };

        for listener in &activity {
            listener.notify();
        }
    }

    /// Run the idle listener behind `id`, then re-arm it.
    pub(crate) fn fire_idle(&self, id: ListenerId) {
        let listener = {
            let state = self.state.lock();
            match state.idle.iter().find(|e| e.id == id) {
                Some(entry) => entry.listener.clone(),
                None => {
                    log::debug!("Idle alarm {:?} fired for a removed listener", id);
                    return;
                }
            }
        };

        listener.notify();

        // The callback may have dispatched input, which already re-armed
        // every listener; keep a single alarm per listener.
        let state = self.state.lock();
        if let Some(entry) = state.idle.iter().find(|e| e.id == id) {
            self.scheduler.cancel(AlarmRequest::FireIdle(id));
            self.scheduler
                .schedule_once(AlarmRequest::FireIdle(id), entry.timeout);
        }
    }

    pub(crate) fn count_idle_time(&self) {
        if !self.idle_counter_enabled {
            return;
        }
        let mut state = self.state.lock();
        let now = self.scheduler.now();
        let elapsed = now.saturating_duration_since(state.last_active);
        state.idle_time += elapsed;
        self.restart_idle_time_counter(&mut state);
    }

    fn restart_idle_time_counter(&self, state: &mut TrackerState) {
        if !self.idle_counter_enabled {
            return;
        }
        self.scheduler.cancel_all(AlarmChannel::IdleTimeCounter);
        state.last_active = self.scheduler.now();
        self.scheduler
            .schedule_once(AlarmRequest::CountIdleTime, self.idle_counter_interval);
    }
}
