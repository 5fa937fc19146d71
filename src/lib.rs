// Event dispatch core for a single-threaded GUI runtime.
//
// # Threading Policy
//
// The core runs on one logical GUI thread. New code should follow these rules:
//
//   - `Cell` / `RefCell`: state touched only by the dispatch thread (current
//     event, event counter, suspend state, dispatcher chain). Never hold a
//     borrow across a collaborator call: collaborators re-enter the core.
//
//   - `parking_lot::Mutex`: the idle/activity listener registries, which may
//     be mutated from other threads. Callbacks always run with the lock
//     released.
//
// Timers never capture closures over the core; they carry an `AlarmRequest`
// that the host hands back through `EventQueueCore::on_alarm`.

pub mod alarm;
pub mod collaborators;
pub mod dispatcher;
pub mod disposer;
pub mod error;
pub mod event;
pub mod idle;
pub mod queue;
pub mod suspend;

pub use alarm::{AlarmChannel, AlarmQueue, AlarmRequest, Scheduler};
pub use collaborators::{
    ApplicationState, ComponentTree, KeyDispatcher, MouseDispatcher, NativeQueue, PopupManager,
    WindowManager,
};
pub use dispatcher::{Dispatcher, DispatcherChain};
pub use disposer::DisposalScope;
pub use error::{Cancelled, DeliveryError, EventQueueError};
pub use event::{
    ActionEvent, ComponentEvent, ComponentEventKind, ComponentId, Event, EventType,
    InputMethodEvent, InputMethodEventKind, InvocationEvent, KeyEvent, KeyEventKind, MouseEvent,
    MouseEventKind, OtherEvent, WindowEvent, WindowEventKind,
};
pub use evqueue_config::{EventQueueConfig, HEADLESS_ENV_VAR};
pub use idle::{IdleActivityTracker, Listener, ListenerId};
pub use queue::{EventQueueBuilder, EventQueueCore};
pub use suspend::{SuspendModeController, SuspendState};
