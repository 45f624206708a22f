//! Periodic autosave built on the timer manager.
//!
//! [`AutoSave`] registers an unbounded timer that ignores the time scale, so
//! slow motion or a paused simulation (`time_scale = 0`) does not hold saves
//! back. Every time the timer fires, the save callback runs with the number of
//! the save being attempted.
//!
//! A callback error is reported as a listener failure: the dispatcher logs it,
//! and the manager counts the timer as faulted for that update. The next
//! interval tries again with the same save number.
//!
//! # Example
//!
//! ```ignore
//! let autosave = AutoSave::install(&manager, 30.0, |n| {
//!     std::fs::write(format!("save_{n}.json"), world_state_json())
//!         .map_err(|e| e.to_string())
//! });
//! ```

use std::cell::Cell;
use std::rc::Rc;

use log::info;

use crate::events::dispatcher::{ListenerError, ListenerId};
use crate::events::timer::TimerEventKind;
use crate::resources::timermanager::{TimerManager, TimerOptions};
use crate::timers::timer::Timer;

pub struct AutoSave {
    timer: Timer,
    saves: Rc<Cell<u32>>,
    listener: ListenerId,
}

impl AutoSave {
    /// Start saving every `interval` seconds of host time.
    pub fn install<F>(manager: &TimerManager, interval: f32, save: F) -> Self
    where
        F: Fn(u32) -> Result<(), String> + 'static,
    {
        let timer = manager.create_timer(TimerOptions::new(interval).with_ignore_time_scale(true));
        let saves = Rc::new(Cell::new(0));
        let counter = saves.clone();
        let listener = timer.add_event_listener(TimerEventKind::Timer, move |_| {
            let next = counter.get() + 1;
            save(next).map_err(|e| ListenerError::new(format!("autosave #{} failed: {}", next, e)))?;
            counter.set(next);
            Ok(())
        });
        info!("autosave every {:.2}s on {}", timer.delay(), timer.id());
        Self {
            timer,
            saves,
            listener,
        }
    }

    /// Successful saves so far.
    pub fn saves(&self) -> u32 {
        self.saves.get()
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Disabling resets the interval; enabling restarts it from zero.
    pub fn set_enabled(&self, enabled: bool) {
        self.timer.set_enabled(enabled);
        if enabled {
            self.timer.start();
        }
    }

    /// Stop saving and release the timer.
    pub fn uninstall(self) {
        self.timer
            .remove_event_listener(TimerEventKind::Timer, self.listener);
        self.timer.dispose();
    }
}
