//! Headless session: a small scene driven by the native host.
//!
//! DESIGN
//! ======
//! The scene is one animated sprite strip carried by an actor, plus a
//! caption. The actor's update behaviour walks the sprite across the surface
//! and advances its frame; the engine renders on every host frame. Both run
//! on the same `TokioScheduler`, so the session is exactly as deterministic
//! as the tokio clock driving it.
//!
//! When the run ends the session reports what the recording surface saw.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::RefCell;
use std::rc::Rc;

use joy_canvas::actor::{Actor, ActorOptions};
use joy_canvas::engine::{Engine, EngineConfig};
use joy_canvas::error::{RenderError, ScheduleError};
use joy_canvas::geometry::Point;
use joy_canvas::headless::{DrawCommand, HeadlessImage, RecordingSurface};
use joy_canvas::renderable::{Drawable, Node, ShadowOptions};
use joy_canvas::sprite::{Sprite, SpriteOptions};
use joy_canvas::surface::SurfaceHandle;
use joy_canvas::text::{Text, TextOptions};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::host::TokioScheduler;

const STRIP_WIDTH: f64 = 64.0;
const FRAME_SIZE: f64 = 16.0;
const STEP_X: f64 = 4.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("scheduling failed: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a finished session drew.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub frames: u64,
    pub images_drawn: usize,
    pub texts_drawn: usize,
    pub actor_position: (f64, f64),
    pub sprite_frame: u32,
    pub frame_rate: Option<String>,
}

/// Build the scene, run it for `config.run_ms`, and report.
///
/// # Errors
///
/// Returns an error if the scene cannot be assembled or the frame loop cannot
/// be started.
pub async fn run(config: HostConfig) -> Result<SessionReport, SessionError> {
    let surface: SurfaceHandle<RecordingSurface> =
        Rc::new(RefCell::new(RecordingSurface::new(f64::from(config.width), f64::from(config.height))));
    let scheduler = Rc::new(TokioScheduler::new(config.frame_period()));
    let engine = Engine::new(surface.clone(), EngineConfig { debug: config.debug, smooth: false })?;
    let engine = Rc::new(RefCell::new(engine));

    let strip = Rc::new(RefCell::new(Sprite::new(
        HeadlessImage::loaded(STRIP_WIDTH, FRAME_SIZE),
        SpriteOptions {
            y: Some(FRAME_SIZE),
            width: Some(FRAME_SIZE),
            height: Some(FRAME_SIZE),
            ..SpriteOptions::default()
        },
    )));
    strip.borrow_mut().shadow(&ShadowOptions { offset_x: Some(1.0), offset_y: Some(1.0), ..ShadowOptions::default() });

    #[allow(clippy::cast_precision_loss)]
    let update_interval_ms = config.behaviour_ms as f64;
    let actor = Actor::new(
        scheduler.clone(),
        ActorOptions {
            x: 0.0,
            y: FRAME_SIZE,
            graphic: Some(strip.clone() as Node<RecordingSurface>),
            update_interval_ms,
        },
    );

    let width = f64::from(config.width);
    let animated = strip.clone();
    actor.borrow_mut().bind("update", move |actor| {
        let next = Point::new((actor.x + STEP_X) % width, actor.y);
        actor.move_to(next);
        if let Ok(mut sprite) = animated.try_borrow_mut() {
            sprite.next_frame();
        }
    })?;

    let caption = Rc::new(RefCell::new(Text::new(TextOptions {
        x: 8.0,
        y: f64::from(config.height) - 20.0,
        text: "joy".to_owned(),
        ..TextOptions::default()
    })));

    {
        let mut engine = engine.borrow_mut();
        engine.add_child(actor.clone())?;
        engine.add_child(caption as Node<RecordingSurface>)?;
    }

    info!(
        width = config.width,
        height = config.height,
        frames = strip.borrow().frame_count(),
        debug = config.debug,
        "session starting"
    );
    Engine::start(&engine, scheduler.clone())?;
    scheduler.run_for(config.run_duration()).await;
    engine.borrow_mut().stop();

    let commands = surface.borrow_mut().take_commands();
    let last_frame = commands
        .iter()
        .rposition(|c| matches!(c, DrawCommand::ClearRect { .. }))
        .map_or(&commands[..0], |start| &commands[start..]);
    debug!(frame = %serde_json::to_string(last_frame)?, "last frame");

    let position = actor.borrow().position();
    let report = SessionReport {
        frames: scheduler.frames_run(),
        images_drawn: commands.iter().filter(|c| matches!(c, DrawCommand::DrawImage { .. })).count(),
        texts_drawn: commands.iter().filter(|c| matches!(c, DrawCommand::FillText { .. })).count(),
        actor_position: (position.x, position.y),
        sprite_frame: strip.borrow().current_frame(),
        frame_rate: engine.borrow().frame_rate_text(),
    };
    Ok(report)
}
