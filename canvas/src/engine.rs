//! Engine: the per-frame loop driver.
//!
//! The engine owns one [`RenderSurface`] and the actors added to it. Each
//! frame callback from the host runs [`Engine::tick`], which renders the
//! pipeline and then asks the host for the next frame. Actor timers run on
//! their own schedule through the same [`Scheduler`]; whatever state they
//! leave behind is what the next tick draws.
//!
//! In debug mode the engine adds a frame-rate label as the first pipeline
//! node and turns on sprite outlines.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::actor::{Action, ActorHandle};
use crate::consts::{FPS_OVERLAY_COLOR, FPS_OVERLAY_FONT, FPS_OVERLAY_X, FPS_OVERLAY_Y};
use crate::error::{RenderError, ScheduleError};
use crate::pipeline::RenderSurface;
use crate::renderable::Node;
use crate::schedule::Scheduler;
use crate::surface::{Surface, SurfaceHandle};
use crate::text::{Text, TextOptions};

/// Shared handle to an engine, as captured by the frame loop.
pub type EngineHandle<S> = Rc<RefCell<Engine<S>>>;

/// Engine switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame-rate overlay and sprite outlines.
    pub debug: bool,
    /// Image smoothing on the surface.
    pub smooth: bool,
}

/// Anything that can be added to an engine.
pub enum Child<S: Surface> {
    /// Tracked as an actor; its graphic, if any, joins the pipeline.
    Actor(ActorHandle<S>),
    /// Joins the pipeline directly.
    Node(Node<S>),
}

impl<S: Surface> From<ActorHandle<S>> for Child<S> {
    fn from(actor: ActorHandle<S>) -> Self {
        Self::Actor(actor)
    }
}

impl<S: Surface> From<Node<S>> for Child<S> {
    fn from(node: Node<S>) -> Self {
        Self::Node(node)
    }
}

pub struct Engine<S: Surface> {
    render_surface: RenderSurface<S>,
    actors: Vec<ActorHandle<S>>,
    fps_overlay: Option<Rc<RefCell<Text<S>>>>,
    last_render_time: Option<f64>,
    running: bool,
    // Bumped by every start; frame callbacks from an older loop retire.
    generation: u64,
}

impl<S: Surface + 'static> Engine<S> {
    /// Create an engine drawing onto `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the debug overlay cannot be added to the pipeline.
    pub fn new(surface: SurfaceHandle<S>, config: EngineConfig) -> Result<Self, RenderError> {
        let mut render_surface = RenderSurface::new(surface);
        if config.smooth {
            render_surface.set_smooth(true);
        }

        let mut fps_overlay = None;
        if config.debug {
            render_surface.set_debug(true);
            let overlay = Rc::new(RefCell::new(Text::new(TextOptions {
                x: FPS_OVERLAY_X,
                y: FPS_OVERLAY_Y,
                font: FPS_OVERLAY_FONT.to_owned(),
                color: FPS_OVERLAY_COLOR.to_owned(),
                ..TextOptions::default()
            })));
            render_surface.add_child(overlay.clone())?;
            fps_overlay = Some(overlay);
        }

        info!(debug = config.debug, smooth = config.smooth, "engine created");
        Ok(Self { render_surface, actors: Vec::new(), fps_overlay, last_render_time: None, running: false, generation: 0 })
    }

    /// Add an actor or a bare node.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NodeBusy`] if the actor or node is mutably
    /// borrowed.
    pub fn add_child(&mut self, child: impl Into<Child<S>>) -> Result<(), RenderError> {
        match child.into() {
            Child::Actor(actor) => {
                let graphic = actor.try_borrow().map_err(|_| RenderError::NodeBusy)?.graphic.clone();
                if let Some(graphic) = graphic {
                    self.render_surface.add_child(graphic)?;
                }
                self.actors.push(actor);
                debug!(actors = self.actors.len(), "actor added");
                Ok(())
            }
            Child::Node(node) => self.render_surface.add_child(node),
        }
    }

    /// Start the frame loop on `scheduler`.
    ///
    /// The loop holds only a weak reference, so it ends on its own once the
    /// engine is dropped. [`Engine::stop`] ends it earlier. Starting a running
    /// engine does nothing; starting a stopped one replaces any frame the old
    /// loop still has pending, so exactly one loop is ever live.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Host`] if the engine is busy or the host
    /// refuses the first frame callback.
    pub fn start(engine: &EngineHandle<S>, scheduler: Rc<dyn Scheduler>) -> Result<(), ScheduleError> {
        let generation = {
            let mut current = engine.try_borrow_mut().map_err(|_| ScheduleError::Host("engine is busy".into()))?;
            if current.running {
                debug!(generation = current.generation, "engine already running");
                return Ok(());
            }
            current.running = true;
            current.generation += 1;
            current.generation
        };
        info!(generation, "engine started");
        request_tick(Rc::downgrade(engine), scheduler, generation)
    }
}

impl<S: Surface> Engine<S> {
    /// Draw the pipeline once.
    ///
    /// # Errors
    ///
    /// See [`RenderSurface::render`].
    pub fn render(&self) -> Result<(), RenderError> {
        self.render_surface.render()
    }

    /// Run one frame at host time `now_ms`.
    ///
    /// With the overlay active, its text becomes the instantaneous frame rate
    /// `1000 / Δt` against the previous tick. The first tick has no Δt and
    /// leaves the text alone.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NodeBusy`] if the overlay is borrowed, or the
    /// render failure.
    pub fn tick(&mut self, now_ms: f64) -> Result<(), RenderError> {
        if let Some(overlay) = &self.fps_overlay {
            if let Some(last) = self.last_render_time {
                let elapsed = now_ms - last;
                if elapsed > 0.0 {
                    let fps = 1000.0 / elapsed;
                    overlay.try_borrow_mut().map_err(|_| RenderError::NodeBusy)?.set_text(format!("{fps:.1} FPS"));
                }
            }
            self.last_render_time = Some(now_ms);
        }
        self.render()
    }

    /// End the frame loop after the current frame.
    pub fn stop(&mut self) {
        if self.running {
            info!("engine stopped");
        }
        self.running = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run every actor's behaviours bound to `action`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::ActorBusy`] if any actor was borrowed and had
    /// to be skipped; the others still run.
    pub fn trigger(&self, action: &Action) -> Result<(), ScheduleError> {
        let mut skipped = 0;
        for actor in &self.actors {
            match actor.try_borrow_mut() {
                Ok(mut actor) => actor.trigger(action),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(?action, skipped, "actors busy; action not delivered");
            return Err(ScheduleError::ActorBusy);
        }
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.render_surface.width()
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.render_surface.height()
    }

    #[must_use]
    pub fn actors(&self) -> &[ActorHandle<S>] {
        &self.actors
    }

    #[must_use]
    pub fn render_surface(&self) -> &RenderSurface<S> {
        &self.render_surface
    }

    pub fn render_surface_mut(&mut self) -> &mut RenderSurface<S> {
        &mut self.render_surface
    }

    /// Current overlay text, or `None` outside debug mode.
    #[must_use]
    pub fn frame_rate_text(&self) -> Option<String> {
        let overlay = self.fps_overlay.as_ref()?;
        overlay.try_borrow().map_or(None, |text| Some(text.text().to_owned()))
    }
}

fn request_tick<S: Surface + 'static>(
    engine: Weak<RefCell<Engine<S>>>,
    scheduler: Rc<dyn Scheduler>,
    generation: u64,
) -> Result<(), ScheduleError> {
    let host = scheduler.clone();
    scheduler.request_frame(Box::new(move || {
        let Some(handle) = engine.upgrade() else {
            debug!("engine dropped; frame loop ended");
            return;
        };

        match handle.try_borrow_mut() {
            Ok(mut current) => {
                if !current.running || current.generation != generation {
                    return;
                }
                if let Err(e) = current.tick(host.now()) {
                    warn!(error = %e, code = e.error_code(), "frame render failed");
                }
            }
            Err(_) => warn!("engine busy; frame skipped"),
        }

        if let Err(e) = request_tick(engine, host, generation) {
            warn!(error = %e, code = e.error_code(), "next frame not scheduled; loop ended");
        }
    }))
}
