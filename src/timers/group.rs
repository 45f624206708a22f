//! Named timer collection with bulk operations.
//!
//! A [`TimerGroup`] wraps a [`TimerList`] and applies one operation to every
//! member at once: start, pause, resume, stop, reset, or enable/disable. When
//! the loop is done it dispatches a single [`GroupEvent`] describing the bulk
//! call.
//!
//! All methods take `&self`, and the member list is never borrowed while a
//! timer or group listener runs. Listeners may therefore add or remove members
//! while a bulk operation is running. The running operation works on the
//! members present when it began.
//!
//! # Example
//!
//! ```ignore
//! let group = TimerGroup::new("hud");
//! group.add(&blink);
//! group.add(&countdown);
//! group.add_event_listener(GroupEventKind::AllPause, |e| {
//!     log::info!("{} timers paused in {}", e.timer_count, e.group);
//!     Ok(())
//! });
//! group.pause_all();
//! ```

use std::cell::RefCell;

use crate::events::dispatcher::{Dispatched, EventDispatcher, ListenerId, ListenerResult};
use crate::events::group::{GroupEvent, GroupEventKind};
use crate::timers::list::TimerList;
use crate::timers::timer::Timer;

pub struct TimerGroup {
    name: String,
    timers: RefCell<TimerList>,
    events: EventDispatcher<GroupEvent>,
}

impl TimerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timers: RefCell::new(TimerList::new()),
            events: EventDispatcher::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&self, timer: &Timer) -> bool {
        self.timers.borrow_mut().add(timer)
    }

    pub fn remove(&self, timer: &Timer, auto_stop: bool) -> bool {
        let removed = self.timers.borrow_mut().take(timer);
        if removed && auto_stop {
            timer.stop();
        }
        removed
    }

    pub fn contains(&self, timer: &Timer) -> bool {
        self.timers.borrow().contains(timer)
    }

    pub fn len(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strong handles to the current members.
    pub fn timers(&self) -> Vec<Timer> {
        self.timers.borrow().timers()
    }

    /// Call `action` on a copy of the current members.
    pub fn for_each(&self, mut action: impl FnMut(&Timer)) {
        for timer in self.timers() {
            action(&timer);
        }
    }

    pub fn prune(&self) -> usize {
        self.timers.borrow_mut().prune()
    }

    /// Forget every member without changing its state.
    pub fn clear(&self) {
        self.timers.borrow_mut().clear();
    }

    pub fn add_event_listener<F>(&self, kind: GroupEventKind, listener: F) -> ListenerId
    where
        F: Fn(&GroupEvent) -> ListenerResult + 'static,
    {
        self.events.add_event_listener(kind, listener)
    }

    pub fn remove_event_listener(&self, kind: GroupEventKind, id: ListenerId) -> bool {
        self.events.remove_event_listener(kind, id)
    }

    pub(crate) fn clear_event_listeners(&self) {
        self.events.clear();
    }

    pub fn start_all(&self) -> Dispatched {
        self.apply_all(GroupEventKind::AllStart, Timer::start)
    }

    pub fn pause_all(&self) -> Dispatched {
        self.apply_all(GroupEventKind::AllPause, Timer::pause)
    }

    pub fn resume_all(&self) -> Dispatched {
        self.apply_all(GroupEventKind::AllResume, Timer::resume)
    }

    pub fn stop_all(&self) -> Dispatched {
        self.apply_all(GroupEventKind::AllStop, Timer::stop)
    }

    pub fn reset_all(&self) -> Dispatched {
        self.apply_all(GroupEventKind::AllReset, Timer::reset)
    }

    /// Apply [`Timer::set_enabled`] to every member.
    pub fn set_all_enabled(&self, enabled: bool) -> Dispatched {
        let kind = if enabled {
            GroupEventKind::AllEnable
        } else {
            GroupEventKind::AllDisable
        };
        self.apply_all(kind, |timer| timer.set_enabled(enabled))
    }

    fn apply_all(&self, kind: GroupEventKind, op: impl Fn(&Timer) -> Dispatched) -> Dispatched {
        let timers = self.timers();
        let mut dispatched = Dispatched::default();
        for timer in &timers {
            dispatched += op(timer);
        }
        dispatched += self.events.dispatch_event(&GroupEvent {
            kind,
            group: self.name.clone(),
            timer_count: timers.len(),
        });
        dispatched
    }
}
