//! Default values for [`EventQueueConfig`](crate::EventQueueConfig) fields.

// ── Suspend mode ───────────────────────────────────────────────────────────

pub fn suspend_enter_timeout_ms() -> u64 {
    750
}

pub fn suspend_retry_timeout_ms() -> u64 {
    250
}

// ── Idle tracking ──────────────────────────────────────────────────────────

pub fn idle_time_counter_interval_ms() -> u64 {
    20_000
}

// ── Diagnostics ────────────────────────────────────────────────────────────

pub fn long_event_threshold_ms() -> u64 {
    100
}

// ── Input guards ───────────────────────────────────────────────────────────

pub fn bool_false() -> bool {
    false
}

pub fn bool_true() -> bool {
    true
}

/// Input-method events are only swallowed during a pending key chord on
/// macOS, where the composition window owns the second keystroke.
pub fn drop_input_method_during_key_chord() -> bool {
    cfg!(target_os = "macos")
}
