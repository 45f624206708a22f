//! ECS resources made available to systems.
//!
//! Overview
//! - `timerconfig` – host and scheduler settings loaded from INI
//! - `timermanager` – the scheduler ticking every registered timer (non-send)
//! - `worldtime` – scaled and unscaled simulation time and delta
pub mod timerconfig;
pub mod timermanager;
pub mod worldtime;
