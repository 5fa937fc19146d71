//! Suspend mode: keyboard shortcuts are withheld while a window is still
//! opening, so a keystroke that raced the window cannot fire an action
//! against it.
//!
//! ```text
//!            key event + WINDOW_OPENED pending
//!   Active ────────────────────────────────────▶ Suspended{saved_focus_owner}
//!     ▲                                              │
//!     │   alarm or focus change,                      │ alarm or focus change,
//!     │   no WINDOW_OPENED pending                    │ WINDOW_OPENED still pending
//!     └──────────────────────────────────────────────┤
//!                                                    └─▶ re-arm retry alarm
//! ```

use crate::alarm::{AlarmChannel, AlarmRequest, Scheduler};
use crate::collaborators::NativeQueue;
use crate::event::{ComponentId, EventType};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendState {
    Active,
    /// The focus owner at entry is kept only while suspended.
    Suspended {
        saved_focus_owner: Option<ComponentId>,
    },
}

pub struct SuspendModeController {
    state: Cell<SuspendState>,
    scheduler: Arc<dyn Scheduler>,
    enter_timeout: Duration,
    retry_timeout: Duration,
}

impl SuspendModeController {
    pub fn new(scheduler: Arc<dyn Scheduler>, enter_timeout: Duration, retry_timeout: Duration) -> Self {
        Self {
            state: Cell::new(SuspendState::Active),
            scheduler,
            enter_timeout,
            retry_timeout,
        }
    }

    pub fn state(&self) -> SuspendState {
        self.state.get()
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.state.get(), SuspendState::Suspended { .. })
    }

    pub fn saved_focus_owner(&self) -> Option<ComponentId> {
        match self.state.get() {
            SuspendState::Suspended { saved_focus_owner } => saved_focus_owner,
            SuspendState::Active => None,
        }
    }

    /// Enter suspend mode and arm the first exit attempt.
    pub fn enter(&self, focus_owner: Option<ComponentId>) {
        log::debug!(
            "Entering suspend mode (focus owner {:?}, exit attempt in {}ms)",
            focus_owner,
            self.enter_timeout.as_millis()
        );
        self.state.set(SuspendState::Suspended {
            saved_focus_owner: focus_owner,
        });
        self.scheduler.cancel_all(AlarmChannel::SuspendMode);
        self.scheduler
            .schedule_once(AlarmRequest::ExitSuspendMode, self.enter_timeout);
    }

    /// Leave suspend mode unless a window-open event is still queued, in
    /// which case the retry alarm is armed instead.
    pub fn try_exit(&self, queue: &dyn NativeQueue) {
        if queue.peek_event_of_type(EventType::WINDOW_OPENED).is_some() {
            log::debug!(
                "WINDOW_OPENED still pending, staying suspended for another {}ms",
                self.retry_timeout.as_millis()
            );
            self.scheduler.cancel_all(AlarmChannel::SuspendMode);
            self.scheduler
                .schedule_once(AlarmRequest::ExitSuspendMode, self.retry_timeout);
        } else {
            log::debug!("Leaving suspend mode");
            self.state.set(SuspendState::Active);
        }
    }

    /// The exit alarm fired.
    pub fn on_alarm(&self, queue: &dyn NativeQueue) {
        if self.is_suspended() {
            self.try_exit(queue);
        }
    }

    /// The focus owner changed. Only a move to a different, non-window
    /// component inside a focused window counts.
    pub fn on_focus_owner_changed(
        &self,
        queue: &dyn NativeQueue,
        focused_window: Option<ComponentId>,
        focus_owner: Option<ComponentId>,
        owner_is_window: bool,
    ) {
        let SuspendState::Suspended { saved_focus_owner } = self.state.get() else {
            return;
        };
        if focused_window.is_none() || owner_is_window {
            return;
        }
        match focus_owner {
            Some(owner) if Some(owner) != saved_focus_owner => self.try_exit(queue),
            _ => {}
        }
    }
}
