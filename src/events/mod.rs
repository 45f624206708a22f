//! Event types and the dispatcher that delivers them.
//!
//! Timers and groups announce their state changes through an
//! [`EventDispatcher`](dispatcher::EventDispatcher). Host lifecycle changes
//! travel through the ECS world as an observer event.
//!
//! Submodules:
//! - [`dispatcher`] – ordered, kind-keyed listener registry with failure reporting
//! - [`timer`] – per-timer lifecycle events (`TimerStart`, `Timer`, `TimerComplete`, ...)
//! - [`group`] – aggregate events raised once per bulk group operation
//! - [`host`] – host pause/resume/compile/shutdown notifications
pub mod dispatcher;
pub mod group;
pub mod host;
pub mod timer;
