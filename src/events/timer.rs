//! Timer lifecycle events.
//!
//! Every state change of a [`Timer`](crate::timers::timer::Timer) is announced
//! through its own dispatcher as a [`TimerEvent`]. The event carries a handle to
//! the timer that raised it, so one listener can serve several timers.
//!
//! # Example
//!
//! ```ignore
//! timer.add_event_listener(TimerEventKind::Complete, |event| {
//!     log::info!("timer {} finished", event.timer.id());
//!     Ok(())
//! });
//! ```
//!
//! # Related
//!
//! - [`crate::timers::timer::Timer`] – the timer raising these events
//! - [`crate::events::dispatcher`] – delivery and failure semantics

use serde::Serialize;

use crate::events::dispatcher::DispatchEvent;
use crate::timers::timer::Timer;

/// What happened to a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimerEventKind {
    /// The timer entered [`Running`](crate::timers::timer::TimerState::Running) via `start`.
    Start,
    /// The delay elapsed once.
    Timer,
    Pause,
    Resume,
    Stop,
    /// The repeat count was reached and the timer reset itself.
    Complete,
    /// Counters were zeroed.
    Reset,
}

impl TimerEventKind {
    /// Event name as shown in logs.
    pub fn name(self) -> &'static str {
        match self {
            TimerEventKind::Start => "TimerStart",
            TimerEventKind::Timer => "Timer",
            TimerEventKind::Pause => "TimerPause",
            TimerEventKind::Resume => "TimerResume",
            TimerEventKind::Stop => "TimerStop",
            TimerEventKind::Complete => "TimerComplete",
            TimerEventKind::Reset => "TimerReset",
        }
    }
}

/// Event raised by a timer.
#[derive(Debug, Clone)]
pub struct TimerEvent {
    pub kind: TimerEventKind,
    /// The timer that raised the event.
    pub timer: Timer,
}

impl DispatchEvent for TimerEvent {
    type Kind = TimerEventKind;

    fn kind(&self) -> TimerEventKind {
        self.kind
    }
}
