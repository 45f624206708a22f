//! Aggregate events raised by bulk operations on a
//! [`TimerGroup`](crate::timers::group::TimerGroup).
//!
//! One event is dispatched after the operation went through every member,
//! including when the group is empty. It means "the bulk call finished", not
//! "some timer changed".

use crate::events::dispatcher::DispatchEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupEventKind {
    AllStart,
    AllPause,
    AllResume,
    AllStop,
    AllReset,
    /// `set_all_enabled(true)` finished.
    AllEnable,
    /// `set_all_enabled(false)` finished.
    AllDisable,
}

/// Event raised once per bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEvent {
    pub kind: GroupEventKind,
    /// Name of the group the operation ran on.
    pub group: String,
    /// How many timers the operation visited.
    pub timer_count: usize,
}

impl DispatchEvent for GroupEvent {
    type Kind = GroupEventKind;

    fn kind(&self) -> GroupEventKind {
        self.kind
    }
}
