//! Shared base for everything that can sit in the render pipeline.
//!
//! Leaf node types ([`crate::sprite::Sprite`], [`crate::text::Text`]) own a
//! [`Renderable`] record and implement [`Drawable`]. The record keeps the
//! surface binding, the current scale factors, and the [`OperationSet`] that
//! is applied to the surface before the leaf draws itself.

#[cfg(test)]
#[path = "renderable_test.rs"]
mod renderable_test;

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::consts::{DEFAULT_SHADOW_BLUR, DEFAULT_SHADOW_COLOR};
use crate::error::RenderError;
use crate::geometry::Point;
use crate::operation::{Operation, OperationSet};
use crate::surface::{Surface, SurfaceHandle};

/// A pipeline entry: any drawable behind a shared, single-threaded handle.
pub type Node<S> = Rc<RefCell<dyn Drawable<S>>>;

/// Shadow settings; absent fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShadowOptions {
    pub color: Option<String>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub blur: Option<f64>,
}

/// Base record shared by all drawables.
pub struct Renderable<S: Surface> {
    surface: Option<SurfaceHandle<S>>,
    scale_x: f64,
    scale_y: f64,
    operations: OperationSet,
}

impl<S: Surface> Default for Renderable<S> {
    fn default() -> Self {
        Self { surface: None, scale_x: 1.0, scale_y: 1.0, operations: OperationSet::new() }
    }
}

impl<S: Surface> Renderable<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) the drawing target.
    pub fn bind(&mut self, surface: SurfaceHandle<S>) {
        self.surface = Some(surface);
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.surface.is_some()
    }

    /// The bound surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SurfaceUnbound`] before [`Renderable::bind`].
    pub fn surface(&self) -> Result<&SurfaceHandle<S>, RenderError> {
        self.surface.as_ref().ok_or(RenderError::SurfaceUnbound)
    }

    #[must_use]
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    #[must_use]
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Record scale factors and the matching `scale` operation.
    pub fn scale(&mut self, scale_x: f64, scale_y: f64) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.operations.insert(Operation::Scale { x: scale_x, y: scale_y });
    }

    /// Record the four shadow style operations.
    pub fn shadow(&mut self, options: &ShadowOptions) {
        let color = options.color.clone().unwrap_or_else(|| DEFAULT_SHADOW_COLOR.to_owned());
        self.operations.insert(Operation::ShadowColor(color));
        self.operations.insert(Operation::ShadowOffsetX(options.offset_x.unwrap_or(0.0)));
        self.operations.insert(Operation::ShadowOffsetY(options.offset_y.unwrap_or(0.0)));
        self.operations.insert(Operation::ShadowBlur(options.blur.unwrap_or(DEFAULT_SHADOW_BLUR)));
    }

    /// Record an arbitrary operation. Recording `scale` this way also updates
    /// the scale factors.
    pub fn record(&mut self, op: Operation) {
        if let Operation::Scale { x, y } = op {
            self.scale_x = x;
            self.scale_y = y;
        }
        self.operations.insert(op);
    }

    /// Record an operation by surface name.
    ///
    /// # Errors
    ///
    /// Fails at registration for unknown names or malformed values; nothing is
    /// recorded in that case.
    pub fn record_named(&mut self, name: &str, value: &serde_json::Value) -> Result<(), RenderError> {
        let op = Operation::from_named(name, value)?;
        self.record(op);
        Ok(())
    }

    #[must_use]
    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    /// Apply every recorded operation to `surface`.
    ///
    /// # Errors
    ///
    /// Propagates the first rejected surface call.
    pub fn apply(&self, surface: &mut S) -> Result<(), RenderError> {
        self.operations.apply(surface)
    }
}

/// A node the pipeline can draw.
///
/// Implementors own a [`Renderable`] and expose it through `base`/`base_mut`;
/// the provided methods forward to it. `render` is called with the surface
/// state already saved by the pipeline.
pub trait Drawable<S: Surface> {
    fn base(&self) -> &Renderable<S>;
    fn base_mut(&mut self) -> &mut Renderable<S>;

    /// Draw this node onto its bound surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SurfaceUnbound`] if no surface is bound, or the
    /// first rejected surface call.
    fn render(&mut self) -> Result<(), RenderError>;

    fn position(&self) -> Point;
    fn set_position(&mut self, position: Point);

    fn bind_surface(&mut self, surface: SurfaceHandle<S>) {
        self.base_mut().bind(surface);
    }

    fn scale(&mut self, scale_x: f64, scale_y: f64) {
        self.base_mut().scale(scale_x, scale_y);
    }

    fn shadow(&mut self, options: &ShadowOptions) {
        self.base_mut().shadow(options);
    }

    /// Toggle debug decorations. Nodes without any ignore this.
    fn set_debug(&mut self, _enabled: bool) {}
}
