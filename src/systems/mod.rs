//! Engine systems.
//!
//! Submodules overview
//! - [`time`] – update simulation time and delta
//! - [`timermanager`] – tick the timer manager and forward host lifecycle events

pub mod time;
pub mod timermanager;
