//! quicktimer library.
//!
//! Cooperative, frame-driven timers with typed event dispatch, plus the ECS
//! resources and systems that connect them to a host loop.

pub mod autosave;
pub mod events;
pub mod resources;
pub mod systems;
pub mod timers;
