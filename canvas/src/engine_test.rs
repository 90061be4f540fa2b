#![allow(clippy::float_cmp)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::actor::{Actor, ActorOptions};
use crate::geometry::Point;
use crate::headless::{DrawCommand, HeadlessImage, RecordingSurface};
use crate::schedule::ManualScheduler;
use crate::sprite::{Sprite, SpriteOptions};

// =============================================================
// Helpers
// =============================================================

fn surface() -> SurfaceHandle<RecordingSurface> {
    Rc::new(RefCell::new(RecordingSurface::new(320.0, 240.0)))
}

fn engine(config: EngineConfig) -> (SurfaceHandle<RecordingSurface>, Engine<RecordingSurface>) {
    let surface = surface();
    let engine = Engine::new(surface.clone(), config).expect("engine");
    (surface, engine)
}

fn debug_config() -> EngineConfig {
    EngineConfig { debug: true, ..EngineConfig::default() }
}

fn sprite_node(x: f64) -> Rc<RefCell<Sprite<RecordingSurface>>> {
    Rc::new(RefCell::new(Sprite::new(
        HeadlessImage::loaded(16.0, 16.0),
        SpriteOptions { x: Some(x), ..SpriteOptions::default() },
    )))
}

fn drawn_x(surface: &SurfaceHandle<RecordingSurface>) -> Vec<f64> {
    surface
        .borrow()
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::DrawImage { dx, .. } => Some(*dx),
            _ => None,
        })
        .collect()
}

fn texts(surface: &SurfaceHandle<RecordingSurface>) -> Vec<String> {
    surface
        .borrow()
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::FillText { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================
// Config
// =============================================================

#[test]
fn config_defaults_to_plain_mode() {
    let config: EngineConfig = serde_json::from_value(serde_json::json!({})).expect("config");
    assert_eq!(config, EngineConfig::default());
    assert!(!config.debug);
    assert!(!config.smooth);
}

#[test]
fn config_deserializes_switches() {
    let config: EngineConfig = serde_json::from_value(serde_json::json!({ "debug": true, "smooth": true })).expect("config");
    assert!(config.debug && config.smooth);
}

#[test]
fn smoothing_follows_config() {
    let (plain, _) = engine(EngineConfig::default());
    assert!(!plain.borrow().state().image_smoothing);
    let (smooth, _) = engine(EngineConfig { smooth: true, ..EngineConfig::default() });
    assert!(smooth.borrow().state().image_smoothing);
}

// =============================================================
// Children
// =============================================================

#[test]
fn nodes_join_pipeline_in_order() {
    let (surface, mut engine) = engine(EngineConfig::default());
    engine.add_child(sprite_node(10.0) as Node<RecordingSurface>).expect("add");
    engine.add_child(sprite_node(20.0) as Node<RecordingSurface>).expect("add");
    engine.render().expect("render");
    assert_eq!(drawn_x(&surface), vec![10.0, 20.0]);
    assert!(engine.actors().is_empty());
}

#[test]
fn actor_graphic_joins_pipeline() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, mut engine) = engine(EngineConfig::default());
    let actor = Actor::new(
        scheduler,
        ActorOptions { graphic: Some(sprite_node(5.0) as Node<RecordingSurface>), ..ActorOptions::default() },
    );
    engine.add_child(actor).expect("add");
    assert_eq!(engine.actors().len(), 1);
    assert_eq!(engine.render_surface().len(), 1);
    engine.render().expect("render");
    assert_eq!(drawn_x(&surface), vec![5.0]);
}

#[test]
fn actor_without_graphic_is_tracked_only() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, mut engine) = engine(EngineConfig::default());
    let actor: ActorHandle<RecordingSurface> = Actor::new(scheduler, ActorOptions::default());
    engine.add_child(actor).expect("add");
    assert_eq!(engine.actors().len(), 1);
    assert!(engine.render_surface().is_empty());
}

#[test]
fn busy_actor_is_rejected() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, mut engine) = engine(EngineConfig::default());
    let actor: ActorHandle<RecordingSurface> = Actor::new(scheduler, ActorOptions::default());
    let held = actor.borrow_mut();
    let err = engine.add_child(actor.clone()).expect_err("busy");
    drop(held);
    assert!(matches!(err, RenderError::NodeBusy));
    assert!(engine.actors().is_empty());
}

#[test]
fn dimensions_come_from_surface() {
    let (_, engine) = engine(EngineConfig::default());
    assert_eq!(engine.width(), 320.0);
    assert_eq!(engine.height(), 240.0);
}

// =============================================================
// Frame rate overlay
// =============================================================

#[test]
fn overlay_only_in_debug_mode() {
    let (_, plain) = engine(EngineConfig::default());
    assert_eq!(plain.frame_rate_text(), None);
    assert!(plain.render_surface().is_empty());

    let (_, debug) = engine(debug_config());
    assert_eq!(debug.frame_rate_text(), Some(String::new()));
    assert_eq!(debug.render_surface().len(), 1);
}

#[test]
fn first_tick_has_no_rate() {
    let (_, mut engine) = engine(debug_config());
    engine.tick(1000.0).expect("tick");
    assert_eq!(engine.frame_rate_text(), Some(String::new()));
}

#[test]
fn tick_reports_instantaneous_rate() {
    let (surface, mut engine) = engine(debug_config());
    engine.tick(1000.0).expect("tick");
    engine.tick(1016.0).expect("tick");
    assert_eq!(engine.frame_rate_text().as_deref(), Some("62.5 FPS"));
    assert_eq!(texts(&surface).last().map(String::as_str), Some("62.5 FPS"));

    engine.tick(1066.0).expect("tick");
    assert_eq!(engine.frame_rate_text().as_deref(), Some("20.0 FPS"));
}

#[test]
fn zero_interval_keeps_previous_rate() {
    let (_, mut engine) = engine(debug_config());
    engine.tick(0.0).expect("tick");
    engine.tick(10.0).expect("tick");
    engine.tick(10.0).expect("tick");
    assert_eq!(engine.frame_rate_text().as_deref(), Some("100.0 FPS"));
}

#[test]
fn overlay_draws_beneath_later_nodes() {
    let (surface, mut engine) = engine(debug_config());
    engine.add_child(sprite_node(0.0) as Node<RecordingSurface>).expect("add");
    engine.render().expect("render");
    let commands = surface.borrow().commands().to_vec();
    let text_at = commands.iter().position(|c| matches!(c, DrawCommand::FillText { .. }));
    let image_at = commands.iter().position(|c| matches!(c, DrawCommand::DrawImage { .. }));
    assert!(text_at.is_some() && text_at < image_at);
}

#[test]
fn debug_mode_outlines_sprites() {
    let (surface, mut engine) = engine(debug_config());
    engine.add_child(sprite_node(0.0) as Node<RecordingSurface>).expect("add");
    engine.render().expect("render");
    assert!(surface.borrow().commands().iter().any(|c| matches!(c, DrawCommand::StrokeRect { .. })));
}

// =============================================================
// Frame loop
// =============================================================

#[test]
fn loop_renders_every_frame() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    assert!(engine.borrow().is_running());

    for _ in 0..3 {
        assert_eq!(scheduler.step(16.0), 1);
    }
    let clears = surface.borrow().commands().iter().filter(|c| matches!(c, DrawCommand::ClearRect { .. })).count();
    assert_eq!(clears, 3);
    assert_eq!(scheduler.pending_frames(), 1);
}

#[test]
fn loop_feeds_host_clock_to_overlay() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, engine) = engine(debug_config());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    scheduler.step(20.0);
    scheduler.step(20.0);
    assert_eq!(engine.borrow().frame_rate_text().as_deref(), Some("50.0 FPS"));
}

#[test]
fn stop_ends_loop() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    scheduler.step(16.0);
    engine.borrow_mut().stop();
    let before = surface.borrow().commands().len();

    scheduler.step(16.0);
    assert_eq!(surface.borrow().commands().len(), before);
    assert_eq!(scheduler.pending_frames(), 0);
}

fn clears(surface: &SurfaceHandle<RecordingSurface>) -> usize {
    surface.borrow().commands().iter().filter(|c| matches!(c, DrawCommand::ClearRect { .. })).count()
}

#[test]
fn restart_after_stop_runs_one_loop() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    engine.borrow_mut().stop();
    Engine::start(&engine, scheduler.clone()).expect("restart");

    // The first loop's pending frame retires without rendering.
    assert_eq!(scheduler.step(16.0), 2);
    assert_eq!(clears(&surface), 1);
    assert_eq!(scheduler.pending_frames(), 1);

    scheduler.step(16.0);
    assert_eq!(clears(&surface), 2);
    assert_eq!(scheduler.pending_frames(), 1);
}

#[test]
fn start_while_running_is_a_no_op() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    Engine::start(&engine, scheduler.clone()).expect("second start");
    assert_eq!(scheduler.pending_frames(), 1);

    scheduler.step(16.0);
    assert_eq!(clears(&surface), 1);
    assert!(engine.borrow().is_running());
}

#[test]
fn dropped_engine_ends_loop() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).expect("start");
    drop(engine);
    assert_eq!(scheduler.step(16.0), 1);
    assert_eq!(scheduler.pending_frames(), 0);
}

#[test]
fn two_engines_run_independently() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (first_surface, first) = engine(EngineConfig::default());
    let (second_surface, second) = engine(EngineConfig::default());
    let first = Rc::new(RefCell::new(first));
    let second = Rc::new(RefCell::new(second));
    Engine::start(&first, scheduler.clone()).expect("start");
    Engine::start(&second, scheduler.clone()).expect("start");

    first.borrow_mut().stop();
    scheduler.step(16.0);
    scheduler.step(16.0);
    assert!(first_surface.borrow().commands().is_empty());
    assert!(second_surface.borrow().commands().len() > 1);
}

#[test]
fn behaviour_changes_show_on_next_frame() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (surface, engine) = engine(EngineConfig::default());
    let engine = Rc::new(RefCell::new(engine));
    let sprite = sprite_node(0.0);
    let actor = Actor::new(
        scheduler.clone(),
        ActorOptions { graphic: Some(sprite.clone() as Node<RecordingSurface>), ..ActorOptions::default() },
    );
    actor
        .borrow_mut()
        .bind("update", |actor| {
            let next = Point::new(actor.x + 8.0, actor.y);
            actor.move_to(next);
        })
        .expect("bind");
    engine.borrow_mut().add_child(actor.clone()).expect("add");
    Engine::start(&engine, scheduler.clone()).expect("start");

    // Frames at 50 and 100 ms; the update timer fires at 100 ms before that frame.
    scheduler.step(50.0);
    scheduler.step(50.0);
    assert_eq!(drawn_x(&surface), vec![0.0, 8.0]);
    assert_eq!(sprite.borrow().x, 8.0);
}

// =============================================================
// Actions
// =============================================================

#[test]
fn trigger_reaches_every_actor() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, mut engine) = engine(EngineConfig::default());
    let hits = Rc::new(Cell::new(0));
    for _ in 0..2 {
        let actor: ActorHandle<RecordingSurface> = Actor::new(scheduler.clone(), ActorOptions::default());
        let h = hits.clone();
        actor.borrow_mut().bind("jump", move |_| h.set(h.get() + 1)).expect("bind");
        engine.add_child(actor).expect("add");
    }
    engine.trigger(&Action::from("jump")).expect("trigger");
    assert_eq!(hits.get(), 2);
}

#[test]
fn trigger_reports_busy_actor() {
    let scheduler = Rc::new(ManualScheduler::new());
    let (_, mut engine) = engine(EngineConfig::default());
    let actor: ActorHandle<RecordingSurface> = Actor::new(scheduler, ActorOptions::default());
    engine.add_child(actor.clone()).expect("add");
    let _held = actor.borrow_mut();
    assert!(matches!(engine.trigger(&Action::from("jump")), Err(ScheduleError::ActorBusy)));
}
