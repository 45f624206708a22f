//! Host lifecycle events.
//!
//! The host (game loop or editor session) triggers a [`HostLifecycleEvent`] in
//! the ECS world when it is paused, resumed, recompiled, or shut down. The
//! [`host_lifecycle_observer`](crate::systems::timermanager::host_lifecycle_observer)
//! forwards it to the [`TimerManager`](crate::resources::timermanager::TimerManager).
//!
//! # Example
//!
//! ```ignore
//! world.trigger(HostLifecycleEvent::new(HostTransition::ApplicationPaused));
//! ```

use bevy_ecs::prelude::*;

/// Lifecycle transition reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTransition {
    /// Runtime host lost focus or was suspended.
    ApplicationPaused,
    ApplicationResumed,
    /// Editor host started recompiling scripts.
    CompilationStarted,
    CompilationFinished,
    /// Host is exiting; the manager is torn down.
    Shutdown,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLifecycleEvent {
    pub transition: HostTransition,
}

impl HostLifecycleEvent {
    pub fn new(transition: HostTransition) -> Self {
        Self { transition }
    }
}
