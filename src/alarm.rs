//! One-shot alarms for suspend-mode grace timers and idle listeners.
//!
//! Alarms carry an [`AlarmRequest`] value instead of a closure; the host hands
//! due requests back to [`EventQueueCore::on_alarm`](crate::EventQueueCore::on_alarm)
//! on the GUI thread. [`AlarmQueue`] is a deadline-ordered implementation that
//! a host loop drives with [`AlarmQueue::advance_to`] and sleeps on with
//! [`AlarmQueue::next_deadline`] (e.g. `ControlFlow::WaitUntil`).

use crate::idle::ListenerId;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Groups of alarms that are cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmChannel {
    SuspendMode,
    IdleRequests,
    IdleTimeCounter,
}

/// What to do when an alarm fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmRequest {
    /// Attempt to leave suspend mode.
    ExitSuspendMode,
    /// Notify one idle listener.
    FireIdle(ListenerId),
    /// Fold elapsed time into the idle-time total.
    CountIdleTime,
}

impl AlarmRequest {
    pub fn channel(&self) -> AlarmChannel {
        match self {
            AlarmRequest::ExitSuspendMode => AlarmChannel::SuspendMode,
            AlarmRequest::FireIdle(_) => AlarmChannel::IdleRequests,
            AlarmRequest::CountIdleTime => AlarmChannel::IdleTimeCounter,
        }
    }
}

/// Timer capability consumed by the core.
///
/// Registration APIs may run off the GUI thread, so schedulers must be
/// shareable; the requests they produce are still handled on the GUI thread.
pub trait Scheduler: Send + Sync {
    /// Current time as seen by this scheduler.
    fn now(&self) -> Instant;

    fn schedule_once(&self, request: AlarmRequest, delay: Duration);

    /// Cancel every pending alarm equal to `request`.
    fn cancel(&self, request: AlarmRequest);

    fn cancel_all(&self, channel: AlarmChannel);
}

#[derive(Debug)]
struct PendingAlarm {
    deadline: Instant,
    seq: u64,
    request: AlarmRequest,
}

#[derive(Debug)]
struct AlarmState {
    now: Instant,
    next_seq: u64,
    pending: Vec<PendingAlarm>,
}

/// Deadline-ordered alarm queue with an explicitly advanced clock.
#[derive(Debug)]
pub struct AlarmQueue {
    state: Mutex<AlarmState>,
}

impl Default for AlarmQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmQueue {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            state: Mutex::new(AlarmState {
                now,
                next_seq: 0,
                pending: Vec::new(),
            }),
        }
    }

    /// Earliest pending deadline, for sleeping the host loop.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().pending.iter().map(|a| a.deadline).min()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Time left before the earliest pending alarm equal to `request` fires.
    pub fn time_until(&self, request: AlarmRequest) -> Option<Duration> {
        let state = self.state.lock();
        state
            .pending
            .iter()
            .filter(|a| a.request == request)
            .map(|a| a.deadline.saturating_duration_since(state.now))
            .min()
    }

    pub fn is_scheduled(&self, request: AlarmRequest) -> bool {
        self.state.lock().pending.iter().any(|a| a.request == request)
    }

    /// Remove the earliest alarm due at or before `now`.
    ///
    /// The clock moves to that alarm's deadline, so anything scheduled while
    /// the request is handled is measured from the firing time.
    pub fn pop_due(&self, now: Instant) -> Option<AlarmRequest> {
        let mut state = self.state.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, a)| a.deadline <= now)
            .min_by_key(|(_, a)| (a.deadline, a.seq))
            .map(|(i, _)| i)?;
        let alarm = state.pending.swap_remove(index);
        if alarm.deadline > state.now {
            state.now = alarm.deadline;
        }
        Some(alarm.request)
    }

    /// Fire every alarm due at or before `now`, in deadline order, including
    /// alarms re-armed by the handler that fall inside the window.
    pub fn advance_to(&self, now: Instant, mut handler: impl FnMut(AlarmRequest)) {
        while let Some(request) = self.pop_due(now) {
            handler(request);
        }
        let mut state = self.state.lock();
        if now > state.now {
            state.now = now;
        }
    }

    pub fn advance_by(&self, elapsed: Duration, handler: impl FnMut(AlarmRequest)) {
        let target = self.now() + elapsed;
        self.advance_to(target, handler);
    }
}

impl Scheduler for AlarmQueue {
    fn now(&self) -> Instant {
        self.state.lock().now
    }

    fn schedule_once(&self, request: AlarmRequest, delay: Duration) {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(PendingAlarm {
            deadline,
            seq,
            request,
        });
    }

    fn cancel(&self, request: AlarmRequest) {
        self.state.lock().pending.retain(|a| a.request != request);
    }

    fn cancel_all(&self, channel: AlarmChannel) {
        self.state
            .lock()
            .pending
            .retain(|a| a.request.channel() != channel);
    }
}
