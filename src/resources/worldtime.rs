//! Simulation clock resource.
//!
//! `delta` and `elapsed` are scaled by `time_scale`. `real_delta` and
//! `real_elapsed` follow the host clock unscaled; the timer manager is driven
//! from `real_elapsed` and applies the time scale itself.
use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub real_elapsed: f64,
    pub real_delta: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            real_elapsed: 0.0,
            real_delta: 0.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }
}
