//! Frame-driven timer scheduler.
//!
//! The [`TimerManager`] owns one [`TimerGroup`] of registered timers and ticks
//! all of them once per host update. The host hands it a monotonic clock
//! reading; the manager turns consecutive readings into a delta, scales it,
//! and forwards it to every timer.
//!
//! The manager is created explicitly by the host and shared as a cheap handle.
//! Inside the ECS world it lives as a non-send resource, because timers use
//! `Rc`-based handles.
//!
//! # Host kinds
//!
//! - [`HostKind::Runtime`]: timers tick by `delta * time_scale`, except
//!   timers with `ignore_time_scale`. Application pause/resume pauses and
//!   resumes every timer.
//! - [`HostKind::Editor`]: no time scale applies. Script compilation
//!   pauses and resumes every timer.
//!
//! Both kinds tear down on [`HostTransition::Shutdown`].
//!
//! # Lifecycle
//!
//! `Created` -> `Initialized` (first [`TimerManager::initialize`] or
//! [`TimerManager::update`]) -> `TornDown` ([`TimerManager::teardown`]).
//! A torn-down manager ignores updates and registrations and never comes back.
//!
//! # Fault isolation
//!
//! Listener failures are logged by the dispatcher that ran them. The
//! manager additionally warns once per faulted timer and keeps ticking the
//! remaining timers.
//!
//! # Related
//!
//! - [`crate::systems::timermanager::update_timer_manager`] – drives the manager from [`WorldTime`](crate::resources::worldtime::WorldTime)
//! - [`crate::systems::timermanager::host_lifecycle_observer`] – forwards [`HostLifecycleEvent`](crate::events::host::HostLifecycleEvent)s

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::{debug, info, warn};

use crate::events::dispatcher::{Dispatched, ListenerId, ListenerResult};
use crate::events::group::{GroupEvent, GroupEventKind};
use crate::events::host::HostTransition;
use crate::timers::group::TimerGroup;
use crate::timers::timer::{Timer, TimerSnapshot};

/// Which host loop drives the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKind {
    #[default]
    Runtime,
    Editor,
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKind::Runtime => write!(f, "runtime"),
            HostKind::Editor => write!(f, "editor"),
        }
    }
}

impl FromStr for HostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "runtime" => Ok(HostKind::Runtime),
            "editor" => Ok(HostKind::Editor),
            other => Err(format!("Unknown host kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerLifecycle {
    Created,
    Initialized,
    TornDown,
}

/// Parameters for [`TimerManager::create_timer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerOptions {
    pub delay: f32,
    pub repeat_count: u32,
    pub ignore_time_scale: bool,
    pub stop_on_disable: bool,
    pub auto_start: bool,
}

impl TimerOptions {
    /// Unbounded, scaled, stop-on-disable, auto-started timer with `delay`.
    pub fn new(delay: f32) -> Self {
        Self {
            delay,
            repeat_count: 0,
            ignore_time_scale: false,
            stop_on_disable: true,
            auto_start: true,
        }
    }

    pub fn with_repeat_count(mut self, repeat_count: u32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    pub fn with_ignore_time_scale(mut self, ignore: bool) -> Self {
        self.ignore_time_scale = ignore;
        self
    }

    pub fn with_stop_on_disable(mut self, stop: bool) -> Self {
        self.stop_on_disable = stop;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

/// Summary of one [`TimerManager::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateReport {
    /// Unscaled seconds since the previous update.
    pub delta: f32,
    /// `delta` after the time scale.
    pub scaled_delta: f32,
    /// Timers that were ticked.
    pub ticked: usize,
    /// Timers whose `Timer` event fired.
    pub fired: usize,
    /// Timers that completed their repeat count.
    pub completed: usize,
    /// Timers with at least one failing listener.
    pub faulted: usize,
}

pub(crate) struct ManagerInner {
    kind: HostKind,
    timers: TimerGroup,
    lifecycle: Cell<ManagerLifecycle>,
    last_update: Cell<f64>,
    time_scale: Cell<f32>,
}

impl ManagerInner {
    /// Remove a disposing timer, stopping it.
    pub(crate) fn deregister(&self, timer: &Timer) -> bool {
        self.timers.remove(timer, true)
    }
}

/// Shared handle to the scheduler.
#[derive(Clone)]
pub struct TimerManager {
    inner: Rc<ManagerInner>,
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field("kind", &self.inner.kind)
            .field("lifecycle", &self.inner.lifecycle.get())
            .field("timers", &self.inner.timers.len())
            .finish()
    }
}

impl TimerManager {
    pub fn new(kind: HostKind) -> Self {
        let group = match kind {
            HostKind::Runtime => "timer_manager",
            HostKind::Editor => "editor_timer_manager",
        };
        Self {
            inner: Rc::new(ManagerInner {
                kind,
                timers: TimerGroup::new(group),
                lifecycle: Cell::new(ManagerLifecycle::Created),
                last_update: Cell::new(0.0),
                time_scale: Cell::new(1.0),
            }),
        }
    }

    pub fn runtime() -> Self {
        Self::new(HostKind::Runtime)
    }

    pub fn editor() -> Self {
        Self::new(HostKind::Editor)
    }

    pub fn kind(&self) -> HostKind {
        self.inner.kind
    }

    pub fn lifecycle(&self) -> ManagerLifecycle {
        self.inner.lifecycle.get()
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle() == ManagerLifecycle::TornDown
    }

    /// Capture `now` as the last update time. Only the first call on a fresh
    /// manager has an effect.
    pub fn initialize(&self, now: f64) -> bool {
        match self.lifecycle() {
            ManagerLifecycle::Created => {
                self.inner.last_update.set(now);
                self.inner.lifecycle.set(ManagerLifecycle::Initialized);
                info!("{} timer manager initialized at {:.3}s", self.kind(), now);
                true
            }
            ManagerLifecycle::Initialized => {
                debug!("{} timer manager already initialized", self.kind());
                false
            }
            ManagerLifecycle::TornDown => {
                warn!("{} timer manager is torn down, cannot initialize", self.kind());
                false
            }
        }
    }

    /// Factor applied to the delta of scaled timers. Ignored by the editor host.
    pub fn time_scale(&self) -> f32 {
        self.inner.time_scale.get()
    }

    /// Set the time scale. Negative or NaN values are treated as 0.
    pub fn set_time_scale(&self, time_scale: f32) {
        self.inner.time_scale.set(time_scale.max(0.0));
    }

    /// Build a timer from `options`, register it, and start it if requested.
    ///
    /// On a torn-down manager the timer is returned unregistered.
    pub fn create_timer(&self, options: TimerOptions) -> Timer {
        let timer = Timer::new(options.delay, options.repeat_count)
            .with_ignore_time_scale(options.ignore_time_scale)
            .with_stop_on_disable(options.stop_on_disable);
        self.add(&timer);
        if options.auto_start {
            timer.start();
        }
        timer
    }

    /// Register `timer` for ticking. Duplicates are ignored.
    pub fn add(&self, timer: &Timer) -> bool {
        if self.is_torn_down() {
            warn!("{} timer manager is torn down, {} not registered", self.kind(), timer.id());
            return false;
        }
        let added = self.inner.timers.add(timer);
        if added {
            timer.bind_manager(Rc::downgrade(&self.inner));
        }
        added
    }

    /// Deregister `timer`, stopping it first if `auto_stop` is set.
    pub fn remove(&self, timer: &Timer, auto_stop: bool) -> bool {
        let removed = self.inner.timers.remove(timer, auto_stop);
        if removed {
            timer.unbind_manager(&Rc::downgrade(&self.inner));
        }
        removed
    }

    pub fn contains(&self, timer: &Timer) -> bool {
        self.inner.timers.contains(timer)
    }

    pub fn len(&self) -> usize {
        self.inner.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.timers.is_empty()
    }

    pub fn timers(&self) -> Vec<Timer> {
        self.inner.timers.timers()
    }

    pub fn for_each(&self, action: impl FnMut(&Timer)) {
        self.inner.timers.for_each(action);
    }

    pub fn add_event_listener<F>(&self, kind: GroupEventKind, listener: F) -> ListenerId
    where
        F: Fn(&GroupEvent) -> ListenerResult + 'static,
    {
        self.inner.timers.add_event_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, kind: GroupEventKind, id: ListenerId) -> bool {
        self.inner.timers.remove_event_listener(kind, id)
    }

    pub fn start_all(&self) -> Dispatched {
        self.inner.timers.start_all()
    }

    pub fn pause_all(&self) -> Dispatched {
        self.inner.timers.pause_all()
    }

    pub fn resume_all(&self) -> Dispatched {
        self.inner.timers.resume_all()
    }

    pub fn stop_all(&self) -> Dispatched {
        self.inner.timers.stop_all()
    }

    pub fn reset_all(&self) -> Dispatched {
        self.inner.timers.reset_all()
    }

    pub fn set_all_enabled(&self, enabled: bool) -> Dispatched {
        self.inner.timers.set_all_enabled(enabled)
    }

    /// Advance every registered timer to the host clock reading `now`.
    ///
    /// `now` must not decrease between calls; a backwards step counts as a
    /// zero delta. The first update of a fresh manager only initializes it.
    pub fn update(&self, now: f64) -> UpdateReport {
        let mut report = UpdateReport::default();
        match self.lifecycle() {
            ManagerLifecycle::TornDown => {
                warn!("{} timer manager is torn down, update ignored", self.kind());
                return report;
            }
            ManagerLifecycle::Created => {
                self.initialize(now);
                return report;
            }
            ManagerLifecycle::Initialized => {}
        }

        let last = self.inner.last_update.replace(now);
        let mut delta = (now - last) as f32;
        if delta.is_nan() || delta < 0.0 {
            warn!(
                "{} host clock went from {:.3}s to {:.3}s, using a zero delta",
                self.kind(),
                last,
                now
            );
            delta = 0.0;
        }
        let scaled = match self.kind() {
            HostKind::Runtime => delta * self.time_scale(),
            HostKind::Editor => delta,
        };
        report.delta = delta;
        report.scaled_delta = scaled;

        self.inner.timers.prune();
        for timer in self.inner.timers.timers() {
            // Removed by a listener earlier in this update.
            if !self.inner.timers.contains(&timer) {
                continue;
            }
            let dt = if timer.ignore_time_scale() { delta } else { scaled };
            let outcome = timer.tick(dt);
            report.ticked += 1;
            if outcome.fired {
                report.fired += 1;
            }
            if outcome.completed {
                report.completed += 1;
            }
            if outcome.failed_listeners > 0 {
                report.faulted += 1;
                warn!(
                    "{} had {} failing listener(s) this update",
                    timer.id(),
                    outcome.failed_listeners
                );
            }
        }
        report
    }

    /// React to a host lifecycle transition.
    pub fn handle_host_event(&self, transition: HostTransition) -> Dispatched {
        if self.is_torn_down() {
            debug!("{} timer manager is torn down, {:?} ignored", self.kind(), transition);
            return Dispatched::default();
        }
        match (self.kind(), transition) {
            (_, HostTransition::Shutdown) => {
                self.teardown();
                Dispatched::default()
            }
            (HostKind::Runtime, HostTransition::ApplicationPaused)
            | (HostKind::Editor, HostTransition::CompilationStarted) => {
                info!("{} host paused, pausing {} timer(s)", self.kind(), self.len());
                self.pause_all()
            }
            (HostKind::Runtime, HostTransition::ApplicationResumed)
            | (HostKind::Editor, HostTransition::CompilationFinished) => {
                info!("{} host resumed, resuming {} timer(s)", self.kind(), self.len());
                self.resume_all()
            }
            (kind, transition) => {
                debug!("{} timer manager ignores {:?}", kind, transition);
                Dispatched::default()
            }
        }
    }

    /// Forget every timer and listener and refuse further use.
    ///
    /// Timers keep their state and remain usable on their own.
    pub fn teardown(&self) {
        if self.is_torn_down() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        for timer in self.inner.timers.timers() {
            timer.unbind_manager(&weak);
        }
        self.inner.timers.clear();
        self.inner.timers.clear_event_listeners();
        self.inner.lifecycle.set(ManagerLifecycle::TornDown);
        info!("{} timer manager torn down", self.kind());
    }

    pub fn snapshot(&self) -> Vec<TimerSnapshot> {
        self.timers().iter().map(Timer::snapshot).collect()
    }
}
