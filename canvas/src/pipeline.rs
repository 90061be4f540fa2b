//! Render pipeline: the ordered list of nodes drawn every tick.
//!
//! Insertion order is draw order; there is no sorting and no de-duplication.
//! Each node draws inside its own saved surface state, so transforms and
//! styles a node sets never reach the next one, including when the node fails
//! partway through.

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

use tracing::{trace, warn};

use crate::error::RenderError;
use crate::renderable::Node;
use crate::surface::{SavedState, Surface, SurfaceHandle, with_surface};

/// Owns a surface and the nodes drawn onto it.
pub struct RenderSurface<S: Surface> {
    surface: SurfaceHandle<S>,
    pipeline: Vec<Node<S>>,
    debug: bool,
}

impl<S: Surface> RenderSurface<S> {
    /// Take ownership of a surface. Image smoothing starts disabled.
    #[must_use]
    pub fn new(surface: SurfaceHandle<S>) -> Self {
        let render_surface = Self { surface, pipeline: Vec::new(), debug: false };
        render_surface.set_smooth(false);
        render_surface
    }

    #[must_use]
    pub fn surface(&self) -> &SurfaceHandle<S> {
        &self.surface
    }

    /// Toggle image smoothing on the surface.
    pub fn set_smooth(&self, enabled: bool) {
        match self.surface.try_borrow_mut() {
            Ok(mut surface) => surface.set_image_smoothing(enabled),
            Err(_) => warn!(enabled, "surface busy; image smoothing unchanged"),
        }
    }

    /// Replace the surface and rebind every node to it.
    pub fn set_surface(&mut self, surface: SurfaceHandle<S>) {
        self.surface = surface;
        for node in &self.pipeline {
            match node.try_borrow_mut() {
                Ok(mut node) => node.bind_surface(self.surface.clone()),
                Err(_) => warn!("node busy during surface rebind"),
            }
        }
    }

    /// Toggle debug decorations on current and future nodes.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
        for node in &self.pipeline {
            match node.try_borrow_mut() {
                Ok(mut node) => node.set_debug(enabled),
                Err(_) => warn!(enabled, "node busy during debug toggle"),
            }
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.surface.try_borrow().map_or(0.0, |surface| surface.width())
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.surface.try_borrow().map_or(0.0, |surface| surface.height())
    }

    /// Bind `node` to this surface and append it to the end of the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NodeBusy`] if the node is mutably borrowed.
    pub fn add_child(&mut self, node: Node<S>) -> Result<(), RenderError> {
        {
            let mut drawable = node.try_borrow_mut().map_err(|_| RenderError::NodeBusy)?;
            drawable.bind_surface(self.surface.clone());
            drawable.set_debug(self.debug);
        }
        self.pipeline.push(node);
        trace!(len = self.pipeline.len(), "node added to pipeline");
        Ok(())
    }

    /// Removing nodes is not supported at the rendering layer.
    ///
    /// # Errors
    ///
    /// Always returns [`RenderError::Unimplemented`].
    pub fn remove_child(&mut self, _node: &Node<S>) -> Result<(), RenderError> {
        Err(RenderError::Unimplemented("RenderSurface::remove_child"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<S>> {
        self.pipeline.iter()
    }

    /// Clear the whole surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface is busy.
    pub fn clear(&self) -> Result<(), RenderError> {
        with_surface(&self.surface, |surface| {
            let (w, h) = (surface.width(), surface.height());
            surface.clear_rect(0.0, 0.0, w, h);
            Ok(())
        })
    }

    /// Clear, then draw every node in insertion order.
    ///
    /// A failing node is logged and skipped; the rest still draw.
    ///
    /// # Errors
    ///
    /// Returns the clear failure, or [`RenderError::Pass`] when at least one
    /// node failed.
    pub fn render(&self) -> Result<(), RenderError> {
        self.clear()?;

        let mut failed = 0;
        let mut first = None;
        for (index, node) in self.pipeline.iter().enumerate() {
            if let Err(e) = self.draw_node(node) {
                warn!(error = %e, code = e.error_code(), index, "node failed to render");
                failed += 1;
                first.get_or_insert(e);
            }
        }

        match first {
            Some(first) => Err(RenderError::Pass { failed, first: Box::new(first) }),
            None => Ok(()),
        }
    }

    fn draw_node(&self, node: &Node<S>) -> Result<(), RenderError> {
        let _saved = SavedState::new(&self.surface)?;
        let mut drawable = node.try_borrow_mut().map_err(|_| RenderError::NodeBusy)?;
        drawable.render()
    }
}
