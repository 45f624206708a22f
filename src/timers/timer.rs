//! Repeating countdown timer.
//!
//! A [`Timer`] accumulates the deltas it is ticked with. Each time the
//! accumulated time reaches `delay` it fires a
//! [`TimerEventKind::Timer`](crate::events::timer::TimerEventKind::Timer) event and
//! keeps the remainder. With a non-zero `repeat_count`, it resets itself after
//! that many fires and raises `Complete`.
//!
//! # States
//!
//! ```text
//!            start                 pause
//! Stopped ---------> Running ---------------> Paused
//!    ^                 ^  |                     |
//!    |                 |  +-- resume <----------+
//!    +---- stop / reset (from any state) -------+
//! ```
//!
//! `start` also works from `Paused`. `resume` only works from `Paused`.
//!
//! # One fire per tick
//!
//! A single [`Timer::tick`] fires at most once, even when the delta covers
//! several delays. The excess stays in `elapsed` and fires on the following
//! ticks, so a long frame delays firing but does not lose it.
//!
//! # Handles
//!
//! `Timer` is a cheap reference-counted handle; clones refer to the same timer.
//! Collections and the manager keep a [`WeakTimer`], so the timer lives as long
//! as its creator keeps a handle. Listeners that need the timer should use the
//! handle carried by the event, or capture a [`WeakTimer`]. A strong handle
//! captured inside one of the timer's own listeners keeps the timer alive forever.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::Serialize;

use crate::events::dispatcher::{Dispatched, EventDispatcher, ListenerId, ListenerResult};
use crate::events::timer::{TimerEvent, TimerEventKind};
use crate::resources::timermanager::ManagerInner;

/// Smallest delay a timer accepts, in seconds. Shorter delays are raised to it.
pub const MIN_DELAY: f32 = 0.02;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Raise `delay` to [`MIN_DELAY`]. NaN also maps to `MIN_DELAY`.
pub fn clamp_delay(delay: f32) -> f32 {
    if delay >= MIN_DELAY { delay } else { MIN_DELAY }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Process-unique timer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Result of one [`Timer::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// The `Timer` event fired.
    pub fired: bool,
    /// The repeat count was reached and `Complete` fired.
    pub completed: bool,
    /// Listeners that returned an error during this tick.
    pub failed_listeners: usize,
}

impl TickOutcome {
    fn absorb(&mut self, dispatched: Dispatched) {
        self.failed_listeners += dispatched.failed;
    }
}

/// Serializable view of a timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub state: TimerState,
    pub delay: f32,
    pub repeat_count: u32,
    pub current_count: u32,
    pub elapsed: f32,
    pub ignore_time_scale: bool,
    pub stop_on_disable: bool,
}

pub(crate) struct TimerInner {
    id: TimerId,
    delay: Cell<f32>,
    repeat_count: Cell<u32>,
    current_count: Cell<u32>,
    elapsed: Cell<f32>,
    state: Cell<TimerState>,
    ignore_time_scale: Cell<bool>,
    stop_on_disable: Cell<bool>,
    disposed: Cell<bool>,
    events: EventDispatcher<TimerEvent>,
    manager: RefCell<Option<Weak<ManagerInner>>>,
}

/// Shared handle to a timer.
#[derive(Clone)]
pub struct Timer {
    inner: Rc<TimerInner>,
}

/// Non-owning handle to a timer.
#[derive(Clone)]
pub struct WeakTimer {
    inner: Weak<TimerInner>,
}

impl WeakTimer {
    pub fn upgrade(&self) -> Option<Timer> {
        self.inner.upgrade().map(|inner| Timer { inner })
    }

    /// `true` if this handle points at `timer`.
    pub fn is(&self, timer: &Timer) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&timer.inner))
    }

    /// `true` while some strong handle exists.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Timer {}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .field("delay", &self.inner.delay.get())
            .field("repeat_count", &self.inner.repeat_count.get())
            .field("current_count", &self.inner.current_count.get())
            .field("elapsed", &self.inner.elapsed.get())
            .finish()
    }
}

impl Timer {
    /// Create a stopped timer.
    ///
    /// # Arguments
    ///
    /// * `delay` - Seconds between fires, raised to [`MIN_DELAY`] if smaller
    /// * `repeat_count` - Fires before completion, `0` for never completing
    pub fn new(delay: f32, repeat_count: u32) -> Self {
        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        Timer {
            inner: Rc::new(TimerInner {
                id,
                delay: Cell::new(clamp_delay(delay)),
                repeat_count: Cell::new(repeat_count),
                current_count: Cell::new(0),
                elapsed: Cell::new(0.0),
                state: Cell::new(TimerState::Stopped),
                ignore_time_scale: Cell::new(false),
                stop_on_disable: Cell::new(true),
                disposed: Cell::new(false),
                events: EventDispatcher::new(),
                manager: RefCell::new(None),
            }),
        }
    }

    /// Tick with the unscaled host delta instead of the scaled one.
    pub fn with_ignore_time_scale(self, ignore: bool) -> Self {
        self.inner.ignore_time_scale.set(ignore);
        self
    }

    /// Choose what `set_enabled(false)` does: reset (`true`) or pause (`false`).
    pub fn with_stop_on_disable(self, stop: bool) -> Self {
        self.inner.stop_on_disable.set(stop);
        self
    }

    pub fn id(&self) -> TimerId {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakTimer {
        WeakTimer {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn state(&self) -> TimerState {
        self.inner.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn delay(&self) -> f32 {
        self.inner.delay.get()
    }

    /// Change the delay. Values below [`MIN_DELAY`] are raised to it.
    pub fn set_delay(&self, delay: f32) {
        self.inner.delay.set(clamp_delay(delay));
    }

    pub fn repeat_count(&self) -> u32 {
        self.inner.repeat_count.get()
    }

    pub fn set_repeat_count(&self, repeat_count: u32) {
        self.inner.repeat_count.set(repeat_count);
    }

    /// Fires since the last reset.
    pub fn current_count(&self) -> u32 {
        self.inner.current_count.get()
    }

    /// Time accumulated towards the next fire.
    pub fn elapsed(&self) -> f32 {
        self.inner.elapsed.get()
    }

    pub fn ignore_time_scale(&self) -> bool {
        self.inner.ignore_time_scale.get()
    }

    pub fn set_ignore_time_scale(&self, ignore: bool) {
        self.inner.ignore_time_scale.set(ignore);
    }

    pub fn stop_on_disable(&self) -> bool {
        self.inner.stop_on_disable.get()
    }

    pub fn set_stop_on_disable(&self, stop: bool) {
        self.inner.stop_on_disable.set(stop);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn add_event_listener<F>(&self, kind: TimerEventKind, listener: F) -> ListenerId
    where
        F: Fn(&TimerEvent) -> ListenerResult + 'static,
    {
        self.inner.events.add_event_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, kind: TimerEventKind, id: ListenerId) -> bool {
        self.inner.events.remove_event_listener(kind, id)
    }

    pub fn has_event_listener(&self, kind: TimerEventKind) -> bool {
        self.inner.events.has_event_listener(kind)
    }

    fn emit(&self, kind: TimerEventKind) -> Dispatched {
        self.inner.events.dispatch_event(&TimerEvent {
            kind,
            timer: self.clone(),
        })
    }

    fn transition(&self, to: TimerState, kind: TimerEventKind) -> Dispatched {
        debug!("{} {:?} -> {:?}", self.id(), self.state(), to);
        self.inner.state.set(to);
        self.emit(kind)
    }

    /// Enter `Running`. No-op when already running or disposed.
    pub fn start(&self) -> Dispatched {
        if self.is_disposed() {
            debug!("{} is disposed, start ignored", self.id());
            return Dispatched::default();
        }
        if self.is_running() {
            return Dispatched::default();
        }
        self.transition(TimerState::Running, TimerEventKind::Start)
    }

    /// `Running` -> `Paused`; no-op from any other state.
    pub fn pause(&self) -> Dispatched {
        if !self.is_running() {
            return Dispatched::default();
        }
        self.transition(TimerState::Paused, TimerEventKind::Pause)
    }

    /// `Paused` -> `Running`; no-op from any other state.
    pub fn resume(&self) -> Dispatched {
        if self.state() != TimerState::Paused {
            return Dispatched::default();
        }
        self.transition(TimerState::Running, TimerEventKind::Resume)
    }

    /// Enter `Stopped`, keeping `elapsed` and `current_count`.
    pub fn stop(&self) -> Dispatched {
        self.transition(TimerState::Stopped, TimerEventKind::Stop)
    }

    /// Stop, then zero `elapsed` and `current_count`.
    pub fn reset(&self) -> Dispatched {
        let mut dispatched = self.stop();
        self.inner.elapsed.set(0.0);
        self.inner.current_count.set(0);
        dispatched += self.emit(TimerEventKind::Reset);
        dispatched
    }

    /// Apply the enable policy.
    ///
    /// Disabling resets the timer when `stop_on_disable` is set and pauses it
    /// otherwise. Enabling resumes a paused timer only when `stop_on_disable`
    /// is unset; a reset timer has to be started again.
    pub fn set_enabled(&self, enabled: bool) -> Dispatched {
        let stop_on_disable = self.stop_on_disable();
        if !enabled {
            if stop_on_disable {
                self.reset()
            } else {
                self.pause()
            }
        } else if self.state() == TimerState::Paused && !stop_on_disable {
            self.resume()
        } else {
            Dispatched::default()
        }
    }

    /// Advance by `delta` seconds.
    pub fn tick(&self, delta: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.is_running() {
            return outcome;
        }

        let elapsed = self.inner.elapsed.get() + delta.max(0.0);
        let delay = self.inner.delay.get();
        if elapsed < delay {
            self.inner.elapsed.set(elapsed);
            return outcome;
        }

        self.inner.elapsed.set(elapsed);
        self.inner
            .current_count
            .set(self.inner.current_count.get().saturating_add(1));
        outcome.fired = true;
        outcome.absorb(self.emit(TimerEventKind::Timer));

        // Keep the remainder so repeating timers do not drift. A listener that
        // reset the timer has already zeroed it.
        let remainder = (self.inner.elapsed.get() - delay).max(0.0);
        self.inner.elapsed.set(remainder);

        // A `Timer` listener may already have reset or reconfigured the timer.
        let repeat_count = self.inner.repeat_count.get();
        if repeat_count != 0 && self.inner.current_count.get() >= repeat_count {
            outcome.absorb(self.reset());
            outcome.absorb(self.emit(TimerEventKind::Complete));
            outcome.completed = true;
        }
        outcome
    }

    /// Deregister from the manager, stop, drop all listeners, and refuse any
    /// later `start`.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let manager = self.inner.manager.borrow_mut().take();
        let removed = manager
            .and_then(|weak| weak.upgrade())
            .is_some_and(|manager| manager.deregister(self));
        if !removed {
            self.stop();
        }
        self.inner.events.clear();
        debug!("{} disposed", self.id());
    }

    pub(crate) fn bind_manager(&self, manager: Weak<ManagerInner>) {
        *self.inner.manager.borrow_mut() = Some(manager);
    }

    pub(crate) fn unbind_manager(&self, manager: &Weak<ManagerInner>) {
        let mut slot = self.inner.manager.borrow_mut();
        if slot.as_ref().is_some_and(|bound| bound.ptr_eq(manager)) {
            *slot = None;
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            id: self.id(),
            state: self.state(),
            delay: self.delay(),
            repeat_count: self.repeat_count(),
            current_count: self.current_count(),
            elapsed: self.elapsed(),
            ignore_time_scale: self.ignore_time_scale(),
            stop_on_disable: self.stop_on_disable(),
        }
    }
}
