//! Tests for draining the native queue and for nested modal pumps.

mod common;

use common::*;
use evqueue::{ComponentEventKind, Event, EventType, InvocationEvent, KeyEventKind, MouseEventKind};
use std::rc::Rc;

#[test]
fn test_flush_delivers_everything_despite_failures() {
    let toolkit = Toolkit::new();
    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.post(mouse(MouseEventKind::Clicked, DIALOG_BUTTON));
    toolkit.queue.post(key(KeyEventKind::Typed, EDITOR).with_char('q'));
    toolkit.queue.fail_deliveries_from(DIALOG_BUTTON, Failure::Error);

    toolkit.core.flush_queue().unwrap();

    assert_eq!(
        toolkit.queue.delivered_types(),
        vec![
            EventType::KEY_PRESSED,
            EventType::Mouse(MouseEventKind::Clicked),
            EventType::Key(KeyEventKind::Typed),
        ]
    );
    assert_eq!(toolkit.queue.pending_len(), 0);
    assert_eq!(toolkit.core.event_count(), 3);
}

#[test]
fn test_flush_on_empty_queue_is_noop() {
    let toolkit = Toolkit::new();
    toolkit.core.flush_queue().unwrap();
    assert!(toolkit.queue.delivered().is_empty());
    assert_eq!(toolkit.core.event_count(), 0);
}

#[test]
fn test_flush_propagates_cancellation() {
    let toolkit = Toolkit::new();
    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.post(key_pressed(DIALOG_BUTTON));
    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.fail_deliveries_from(DIALOG_BUTTON, Failure::Cancel);

    assert!(toolkit.core.flush_queue().is_err());
    assert_eq!(toolkit.queue.delivered().len(), 2);
    assert_eq!(toolkit.queue.pending_len(), 1);
    assert!(toolkit.core.current_event().is_none());
}

#[test]
fn test_flush_stops_when_pull_fails() {
    let toolkit = Toolkit::new();
    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.fail_next_pulls(1);

    toolkit.core.flush_queue().unwrap();

    assert!(toolkit.queue.delivered().is_empty());
    assert_eq!(toolkit.queue.pending_len(), 2);
}

#[test]
fn test_flush_picks_up_events_posted_during_dispatch() {
    let toolkit = Toolkit::new();
    let queue = Rc::clone(&toolkit.queue);
    let reposted = std::cell::Cell::new(false);
    let dispatcher: Rc<dyn evqueue::Dispatcher> = Rc::new(move |event: &mut Event| {
        if !reposted.get() && event.event_type() == EventType::KEY_PRESSED {
            reposted.set(true);
            queue.post(InvocationEvent::new("repaint"));
        }
        false
    });
    toolkit.core.register_dispatcher(dispatcher, None);
    toolkit.queue.post(key_pressed(EDITOR));

    toolkit.core.flush_queue().unwrap();

    assert_eq!(toolkit.queue.delivered().len(), 2);
    assert_eq!(toolkit.queue.pending_len(), 0);
}

#[test]
fn test_pump_drops_input_outside_modal_hierarchy() {
    let toolkit = Toolkit::new();
    let chain_seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let seen = Rc::clone(&chain_seen);
    let dispatcher: Rc<dyn evqueue::Dispatcher> = Rc::new(move |event: &mut Event| {
        seen.borrow_mut().push(event.source());
        false
    });
    toolkit.core.register_dispatcher(dispatcher, None);

    toolkit.queue.post(key_pressed(EDITOR));
    toolkit.queue.post(mouse(MouseEventKind::Pressed, PANEL));
    toolkit.queue.post(key_pressed(DIALOG_BUTTON));
    toolkit.queue.post(window(evqueue::WindowEventKind::Closed, DIALOG));

    let mut exit_seen = Vec::new();
    toolkit
        .core
        .pump_events_for_hierarchy(DIALOG, |event| {
            let event = event.expect("pull should succeed");
            exit_seen.push((event.event_type(), event.is_consumed()));
            event.event_type() == EventType::Window(evqueue::WindowEventKind::Closed)
        })
        .unwrap();

    assert_eq!(
        exit_seen,
        vec![
            (EventType::KEY_PRESSED, true),
            (EventType::Mouse(MouseEventKind::Pressed), true),
            (EventType::KEY_PRESSED, false),
            (EventType::Window(evqueue::WindowEventKind::Closed), false),
        ]
    );
    assert_eq!(*chain_seen.borrow(), vec![Some(DIALOG_BUTTON), Some(DIALOG)]);
    assert_eq!(toolkit.queue.delivered_sources(), vec![DIALOG_BUTTON, DIALOG]);
    assert_eq!(toolkit.core.event_count(), 2);
}

#[test]
fn test_pump_dispatches_non_input_from_anywhere() {
    let toolkit = Toolkit::new();
    toolkit
        .queue
        .post(evqueue::ComponentEvent::new(ComponentEventKind::Resized, EDITOR));
    toolkit.queue.post(InvocationEvent::new("update status"));

    let mut pulled = 0;
    toolkit
        .core
        .pump_events_for_hierarchy(DIALOG_BUTTON, |_| {
            pulled += 1;
            pulled == 2
        })
        .unwrap();

    assert_eq!(toolkit.queue.delivered().len(), 2);
    assert_eq!(toolkit.window_manager.seen.borrow().len(), 1);
}

#[test]
fn test_pump_passes_none_on_pull_failure() {
    let toolkit = Toolkit::new();
    toolkit.queue.post(key_pressed(DIALOG_BUTTON));
    toolkit.queue.fail_next_pulls(1);

    let mut observed = Vec::new();
    toolkit
        .core
        .pump_events_for_hierarchy(DIALOG, |event| {
            observed.push(event.map(Event::event_type));
            event.is_some()
        })
        .unwrap();

    assert_eq!(observed, vec![None, Some(EventType::KEY_PRESSED)]);
    assert_eq!(toolkit.queue.delivered().len(), 1);
}

#[test]
fn test_pump_propagates_cancellation() {
    let toolkit = Toolkit::new();
    toolkit.queue.post(key_pressed(DIALOG_BUTTON));
    toolkit.queue.fail_deliveries_from(DIALOG_BUTTON, Failure::Cancel);

    let result = toolkit.core.pump_events_for_hierarchy(DIALOG, |_| false);

    assert!(result.is_err());
    assert_eq!(toolkit.queue.pending_len(), 0);
}

#[test]
fn test_nested_pump_inside_dispatch() {
    let toolkit = Toolkit::new();
    let core = Rc::downgrade(&toolkit.core);
    let dispatcher: Rc<dyn evqueue::Dispatcher> = Rc::new(move |event: &mut Event| {
        if event.source() != Some(EDITOR) {
            return false;
        }
        let Some(core) = core.upgrade() else {
            return false;
        };
        // A shortcut opened a modal dialog; run its loop until it closes.
        core.pump_events_for_hierarchy(DIALOG, |event| {
            event.is_some_and(|e| e.event_type() == EventType::Window(evqueue::WindowEventKind::Closed))
        })
        .unwrap();
        assert_eq!(core.current_event().and_then(|e| e.source()), Some(EDITOR));
        true
    });
    toolkit.core.register_dispatcher(dispatcher, None);

    toolkit.queue.post(key_pressed(DIALOG_BUTTON));
    toolkit.queue.post(window(evqueue::WindowEventKind::Closed, DIALOG));
    toolkit.queue.post(key_pressed(PANEL));

    toolkit.dispatch(key_pressed(EDITOR));

    assert_eq!(toolkit.queue.delivered_sources(), vec![DIALOG_BUTTON, DIALOG]);
    assert_eq!(toolkit.queue.pending_len(), 1);
    assert!(toolkit.core.current_event().is_none());
}
