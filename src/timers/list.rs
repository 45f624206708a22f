//! Unique, non-owning collection of timers.
//!
//! [`TimerList`] stores [`WeakTimer`] handles in insertion order. It never
//! keeps a timer alive. Entries whose timer was dropped are pruned when the
//! list is mutated and skipped when it is read.

use crate::timers::timer::{Timer, WeakTimer};

#[derive(Clone, Default)]
pub struct TimerList {
    entries: Vec<WeakTimer>,
}

impl TimerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `timer` unless it is already present. Returns whether it was added.
    pub fn add(&mut self, timer: &Timer) -> bool {
        self.prune();
        if self.contains(timer) {
            return false;
        }
        self.entries.push(timer.downgrade());
        true
    }

    /// Remove `timer` if present, then stop it when `auto_stop` is set.
    ///
    /// The entry is gone before `stop` dispatches, so a `Stop` listener sees
    /// the timer outside the list. Returns whether a removal happened.
    pub fn remove(&mut self, timer: &Timer, auto_stop: bool) -> bool {
        if !self.take(timer) {
            return false;
        }
        if auto_stop {
            timer.stop();
        }
        true
    }

    /// Remove `timer` without touching its state.
    pub(crate) fn take(&mut self, timer: &Timer) -> bool {
        match self.entries.iter().position(|entry| entry.is(timer)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, timer: &Timer) -> bool {
        self.entries.iter().any(|entry| entry.is(timer))
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_alive()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strong handles to every live timer, in insertion order.
    pub fn timers(&self) -> Vec<Timer> {
        self.entries.iter().filter_map(WeakTimer::upgrade).collect()
    }

    /// Call `action` on every live timer.
    ///
    /// Iterates a copy taken up front, so `action` may mutate the list: the
    /// loop neither sees timers added meanwhile nor skips any entry.
    pub fn for_each(&self, mut action: impl FnMut(&Timer)) {
        for timer in self.timers() {
            action(&timer);
        }
    }

    /// Drop entries whose timer no longer exists. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(WeakTimer::is_alive);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
