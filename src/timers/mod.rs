//! Timers and timer collections.
//!
//! - [`timer`] – the repeating countdown and its state machine
//! - [`list`] – unique, non-owning collection of timers
//! - [`group`] – named collection with bulk operations and aggregate events
pub mod group;
pub mod list;
pub mod timer;
