//! Actors and their behaviours.
//!
//! An actor is a positioned entity with an optional graphic and an ordered
//! list of behaviours. Behaviours bound to [`Action::Update`] run on a single
//! repeating timer per actor, installed under the `"update"` id when the first
//! update behaviour is attached. Every tick of that timer runs all update
//! behaviours in attachment order, with the actor as receiver.
//!
//! Timer callbacks hold a weak reference to the actor, so a dropped actor
//! stops ticking; dropping it also clears its timers with the host.

#[cfg(test)]
#[path = "actor_test.rs"]
mod actor_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{DEFAULT_UPDATE_INTERVAL_MS, UPDATE_TIMER_ID};
use crate::error::ScheduleError;
use crate::geometry::Point;
use crate::renderable::Node;
use crate::schedule::{Scheduler, TimerHandle};
use crate::surface::Surface;

/// Shared handle to an actor.
pub type ActorHandle<S> = Rc<RefCell<Actor<S>>>;

/// What a behaviour responds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// The periodic update tick.
    Update,
    /// Any host-defined action, dispatched with [`Actor::trigger`].
    Named(String),
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "update" => Self::Update,
            other => Self::Named(other.to_owned()),
        }
    }
}

/// A unit of mutation logic attached to an actor.
pub trait Behaviour<S: Surface> {
    fn action(&self) -> &Action;

    /// Run once with the owning actor as receiver.
    fn invoke(&mut self, actor: &mut Actor<S>);

    fn has_update(&self) -> bool {
        *self.action() == Action::Update
    }
}

/// A behaviour built from a closure by [`Actor::bind`].
pub struct FnBehaviour<S: Surface> {
    action: Action,
    callback: Box<dyn FnMut(&mut Actor<S>)>,
}

impl<S: Surface> FnBehaviour<S> {
    pub fn new(action: impl Into<Action>, callback: impl FnMut(&mut Actor<S>) + 'static) -> Self {
        Self { action: action.into(), callback: Box::new(callback) }
    }
}

impl<S: Surface> Behaviour<S> for FnBehaviour<S> {
    fn action(&self) -> &Action {
        &self.action
    }

    fn invoke(&mut self, actor: &mut Actor<S>) {
        (self.callback)(actor);
    }
}

/// Construction parameters for an actor.
pub struct ActorOptions<S: Surface> {
    pub x: f64,
    pub y: f64,
    pub graphic: Option<Node<S>>,
    pub update_interval_ms: f64,
}

impl<S: Surface> Default for ActorOptions<S> {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, graphic: None, update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS }
    }
}

/// A positioned entity with a graphic and behaviours.
pub struct Actor<S: Surface> {
    id: Uuid,
    this: Weak<RefCell<Actor<S>>>,
    scheduler: Rc<dyn Scheduler>,

    pub x: f64,
    pub y: f64,
    pub graphic: Option<Node<S>>,

    behaviours: Vec<Box<dyn Behaviour<S>>>,
    timers: HashMap<String, TimerHandle>,
    update_interval_ms: f64,
}

impl<S: Surface + 'static> Actor<S> {
    /// Create an actor whose timers run on `scheduler`.
    #[must_use]
    pub fn new(scheduler: Rc<dyn Scheduler>, options: ActorOptions<S>) -> ActorHandle<S> {
        Rc::new_cyclic(|this| {
            RefCell::new(Self {
                id: Uuid::new_v4(),
                this: this.clone(),
                scheduler,
                x: options.x,
                y: options.y,
                graphic: options.graphic,
                behaviours: Vec::new(),
                timers: HashMap::new(),
                update_interval_ms: options.update_interval_ms,
            })
        })
    }

    /// Attach a closure as a behaviour for `action`.
    ///
    /// # Errors
    ///
    /// Propagates a host failure to install the update timer.
    pub fn bind(
        &mut self,
        action: impl Into<Action>,
        callback: impl FnMut(&mut Actor<S>) + 'static,
    ) -> Result<(), ScheduleError> {
        self.add_behaviour(FnBehaviour::new(action, callback))
    }

    /// Attach a behaviour.
    ///
    /// The first update behaviour installs the shared `"update"` timer; later
    /// ones join it. The behaviour is appended either way.
    ///
    /// # Errors
    ///
    /// Propagates a host failure to install the update timer; the behaviour
    /// is not attached in that case.
    pub fn add_behaviour(&mut self, behaviour: impl Behaviour<S> + 'static) -> Result<(), ScheduleError> {
        if behaviour.has_update() && !self.timers.contains_key(UPDATE_TIMER_ID) {
            self.add_interval(UPDATE_TIMER_ID, self.update_interval_ms, Actor::update)?;
        }
        self.behaviours.push(Box::new(behaviour));
        Ok(())
    }

    /// Install a repeating timer under `id`, cancelling any timer already
    /// registered under that id.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Host`] if the host refuses the timer.
    pub fn add_interval(
        &mut self,
        id: &str,
        period_ms: f64,
        mut callback: impl FnMut(&mut Actor<S>) + 'static,
    ) -> Result<(), ScheduleError> {
        if let Some(previous) = self.timers.remove(id) {
            self.scheduler.clear_interval(previous);
        }

        let this = self.this.clone();
        let actor_id = self.id;
        let timer_id = id.to_owned();
        let handle = self.scheduler.set_interval(
            period_ms,
            Box::new(move || {
                let Some(actor) = this.upgrade() else {
                    return;
                };
                match actor.try_borrow_mut() {
                    Ok(mut actor) => callback(&mut *actor),
                    Err(_) => warn!(%actor_id, timer = %timer_id, "actor busy; timer tick skipped"),
                }
            }),
        )?;

        self.timers.insert(id.to_owned(), handle);
        debug!(actor_id = %self.id, timer = id, period_ms, "actor timer installed");
        Ok(())
    }

    /// Cancel the timer under `id`. Returns whether one existed.
    pub fn clear_interval(&mut self, id: &str) -> bool {
        match self.timers.remove(id) {
            Some(handle) => {
                self.scheduler.clear_interval(handle);
                true
            }
            None => false,
        }
    }
}

impl<S: Surface> Actor<S> {
    /// Run every update behaviour once, in attachment order.
    pub fn update(&mut self) {
        self.run_behaviours(|b| b.has_update());
    }

    /// Run every behaviour bound to `action`, in attachment order.
    pub fn trigger(&mut self, action: &Action) {
        self.run_behaviours(|b| b.action() == action);
    }

    fn run_behaviours(&mut self, mut selected: impl FnMut(&dyn Behaviour<S>) -> bool) {
        // Behaviours receive `&mut self`, so they run out of a detached list.
        let mut behaviours = std::mem::take(&mut self.behaviours);
        for behaviour in &mut behaviours {
            if selected(&**behaviour) {
                behaviour.invoke(self);
            }
        }
        // Keep anything attached while the list was detached.
        let attached = std::mem::replace(&mut self.behaviours, behaviours);
        self.behaviours.extend(attached);
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Move the actor and its graphic together.
    pub fn move_to(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
        if let Some(graphic) = &self.graphic {
            match graphic.try_borrow_mut() {
                Ok(mut graphic) => graphic.set_position(position),
                Err(_) => warn!(actor_id = %self.id, "graphic busy; position not synced"),
            }
        }
    }

    #[must_use]
    pub fn behaviour_count(&self) -> usize {
        self.behaviours.len()
    }

    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn has_timer(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    #[must_use]
    pub fn update_interval_ms(&self) -> f64 {
        self.update_interval_ms
    }
}

impl<S: Surface> Drop for Actor<S> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            self.scheduler.clear_interval(handle);
        }
    }
}
