//! Timer manager systems.
//!
//! - [`update_timer_manager`] – ticks every registered timer once per frame
//! - [`host_lifecycle_observer`] – maps host lifecycle events onto the manager
//!
//! # System Flow
//!
//! Each frame:
//!
//! 1. The host advances [`WorldTime`] with `update_world_time`
//! 2. `update_timer_manager` copies `time_scale` into the manager and calls
//!    [`TimerManager::update`] with `real_elapsed`
//! 3. Timers fire their events synchronously; listeners run inside the system
//!
//! Both functions expect the manager as a non-send resource:
//!
//! ```ignore
//! world.insert_non_send_resource(TimerManager::runtime());
//! world.spawn(Observer::new(host_lifecycle_observer));
//! ```

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::events::host::HostLifecycleEvent;
use crate::resources::timermanager::TimerManager;
use crate::resources::worldtime::WorldTime;

/// Forward the world clock to the [`TimerManager`].
pub fn update_timer_manager(world_time: Res<WorldTime>, manager: NonSend<TimerManager>) {
    manager.set_time_scale(world_time.time_scale);
    let report = manager.update(world_time.real_elapsed);
    if report.fired > 0 || report.faulted > 0 {
        debug!(
            "frame {}: {} timer(s) ticked, {} fired, {} completed, {} faulted",
            world_time.frame_count, report.ticked, report.fired, report.completed, report.faulted
        );
    }
}

/// Observer that applies a [`HostLifecycleEvent`] to the [`TimerManager`].
pub fn host_lifecycle_observer(
    trigger: On<HostLifecycleEvent>,
    manager: NonSend<TimerManager>,
) {
    let event = trigger.event();
    manager.handle_host_event(event.transition);
}
