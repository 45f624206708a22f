//! Scheduler integration tests: the timer manager driven by the ECS host loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use quicktimer::autosave::AutoSave;
use quicktimer::events::group::GroupEventKind;
use quicktimer::events::host::{HostLifecycleEvent, HostTransition};
use quicktimer::events::timer::TimerEventKind;
use quicktimer::resources::timermanager::{HostKind, TimerManager, TimerOptions};
use quicktimer::resources::worldtime::WorldTime;
use quicktimer::systems::time::update_world_time;
use quicktimer::systems::timermanager::{host_lifecycle_observer, update_timer_manager};
use quicktimer::timers::timer::{Timer, TimerState};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_world(kind: HostKind, time_scale: f32) -> (World, TimerManager) {
    let manager = TimerManager::new(kind);
    manager.initialize(0.0);

    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(time_scale));
    world.insert_non_send_resource(manager.clone());
    world.spawn(Observer::new(host_lifecycle_observer));
    world.flush();
    (world, manager)
}

fn run_frames(world: &mut World, frames: usize, dt: f32) {
    let mut schedule = Schedule::default();
    schedule.add_systems(update_timer_manager);
    for _ in 0..frames {
        update_world_time(world, dt);
        schedule.run(world);
    }
}

fn count_events(timer: &Timer, kind: TimerEventKind) -> Rc<Cell<u32>> {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    timer.add_event_listener(kind, move |_| {
        h.set(h.get() + 1);
        Ok(())
    });
    hits
}

#[test]
fn repeating_timer_completes_through_the_schedule() {
    let (mut world, manager) = make_world(HostKind::Runtime, 1.0);
    let timer = manager.create_timer(TimerOptions::new(1.0).with_repeat_count(3));
    let fires = count_events(&timer, TimerEventKind::Timer);
    let completes = count_events(&timer, TimerEventKind::Complete);

    // 0.25s frames: a fire every fourth frame.
    run_frames(&mut world, 12, 0.25);

    assert_eq!(fires.get(), 3);
    assert_eq!(completes.get(), 1);
    assert_eq!(timer.state(), TimerState::Stopped);
    assert_eq!(timer.current_count(), 0);
}

#[test]
fn world_time_scale_reaches_scaled_timers_only() {
    let (mut world, manager) = make_world(HostKind::Runtime, 0.5);
    let scaled = manager.create_timer(TimerOptions::new(100.0));
    let unscaled = manager.create_timer(TimerOptions::new(100.0).with_ignore_time_scale(true));

    run_frames(&mut world, 10, 0.1);

    assert!(approx_eq(scaled.elapsed(), 0.5));
    assert!(approx_eq(unscaled.elapsed(), 1.0));
}

#[test]
fn editor_host_ignores_world_time_scale() {
    let (mut world, manager) = make_world(HostKind::Editor, 0.0);
    let timer = manager.create_timer(TimerOptions::new(100.0));
    run_frames(&mut world, 4, 0.5);
    assert!(approx_eq(timer.elapsed(), 2.0));
}

#[test]
fn host_pause_event_freezes_timers_until_resume() {
    let (mut world, manager) = make_world(HostKind::Runtime, 1.0);
    let timer = manager.create_timer(TimerOptions::new(1.0));
    let fires = count_events(&timer, TimerEventKind::Timer);
    let all_paused = Rc::new(Cell::new(0));
    let p = all_paused.clone();
    manager.add_event_listener(GroupEventKind::AllPause, move |_| {
        p.set(p.get() + 1);
        Ok(())
    });

    run_frames(&mut world, 2, 0.25);
    world.trigger(HostLifecycleEvent::new(HostTransition::ApplicationPaused));
    assert_eq!(timer.state(), TimerState::Paused);
    assert_eq!(all_paused.get(), 1);

    run_frames(&mut world, 20, 0.25);
    assert_eq!(fires.get(), 0);
    assert!(approx_eq(timer.elapsed(), 0.5));

    world.trigger(HostLifecycleEvent::new(HostTransition::ApplicationResumed));
    run_frames(&mut world, 2, 0.25);
    assert_eq!(fires.get(), 1);
}

#[test]
fn editor_compilation_pauses_timers() {
    let (mut world, manager) = make_world(HostKind::Editor, 1.0);
    let timer = manager.create_timer(TimerOptions::new(1.0));

    world.trigger(HostLifecycleEvent::new(HostTransition::CompilationStarted));
    assert_eq!(timer.state(), TimerState::Paused);
    world.trigger(HostLifecycleEvent::new(HostTransition::CompilationFinished));
    assert!(timer.is_running());
}

#[test]
fn shutdown_event_tears_down_the_manager() {
    let (mut world, manager) = make_world(HostKind::Runtime, 1.0);
    let timer = manager.create_timer(TimerOptions::new(1.0));
    world.trigger(HostLifecycleEvent::new(HostTransition::Shutdown));
    assert!(manager.is_torn_down());
    assert!(manager.is_empty());

    run_frames(&mut world, 8, 0.25);
    assert_eq!(timer.current_count(), 0);
}

#[test]
fn faulty_listener_does_not_stop_the_frame() {
    let (mut world, manager) = make_world(HostKind::Runtime, 1.0);
    let broken = manager.create_timer(TimerOptions::new(0.5));
    broken.add_event_listener(TimerEventKind::Timer, |_| Err("listener exploded".into()));
    let healthy = manager.create_timer(TimerOptions::new(0.5));
    let fires = count_events(&healthy, TimerEventKind::Timer);

    run_frames(&mut world, 4, 0.25);

    assert_eq!(broken.current_count(), 2);
    assert_eq!(fires.get(), 2);
}

#[test]
fn listener_can_chain_timers_during_the_frame() {
    let (mut world, manager) = make_world(HostKind::Runtime, 1.0);
    let first = manager.create_timer(TimerOptions::new(0.5).with_repeat_count(1));
    let second = manager.create_timer(
        TimerOptions::new(0.5)
            .with_repeat_count(1)
            .with_auto_start(false),
    );
    let second_done = count_events(&second, TimerEventKind::Complete);

    let next = second.downgrade();
    first.add_event_listener(TimerEventKind::Complete, move |_| {
        if let Some(next) = next.upgrade() {
            next.start();
        }
        Ok(())
    });

    run_frames(&mut world, 2, 0.25);
    assert_eq!(first.state(), TimerState::Stopped);
    assert!(second.is_running());

    run_frames(&mut world, 2, 0.25);
    assert_eq!(second_done.get(), 1);
}

#[test]
fn autosave_runs_from_the_host_loop() {
    let (mut world, manager) = make_world(HostKind::Runtime, 0.0);
    let saved = Rc::new(RefCell::new(Vec::new()));
    let s = saved.clone();
    let autosave = AutoSave::install(&manager, 1.0, move |n| {
        s.borrow_mut().push(n);
        Ok(())
    });

    run_frames(&mut world, 12, 0.25);

    assert_eq!(autosave.saves(), 3);
    assert_eq!(*saved.borrow(), vec![1, 2, 3]);
}
