//! Drawing surface capability.
//!
//! Everything in the scene core draws through [`Surface`]; nothing here knows
//! whether the pixels end up in a browser canvas or in a recorded command log.
//! A surface is shared by every node in a pipeline through a
//! [`SurfaceHandle`], which is a single-threaded `Rc<RefCell<_>>`: the render
//! loop and all timer callbacks run on the same thread, one at a time.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use crate::error::RenderError;
use crate::geometry::Size;

/// Shared reference to a drawing surface.
pub type SurfaceHandle<S> = Rc<RefCell<S>>;

/// Result of measuring a string with the surface's current font.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
}

/// An image the surface can draw from.
pub trait ImageAsset {
    /// Natural pixel size, or `None` until the image has loaded.
    fn natural_size(&self) -> Option<Size>;

    /// Point the image at a new source; the host starts loading it.
    fn set_source(&mut self, src: &str);

    /// The current source, empty if none was set.
    fn source(&self) -> &str;
}

/// A 2D drawing target.
///
/// Style setters never fail. Calls the host may reject (transforms, image and
/// text drawing, measuring) return [`RenderError::Surface`].
pub trait Surface {
    type Image: ImageAsset;

    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);

    /// # Errors
    ///
    /// Returns `Err` if the host rejects the transform.
    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError>;

    /// # Errors
    ///
    /// Returns `Err` if the host rejects the transform.
    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError>;

    /// Draw the `(sx, sy, sw, sh)` region of `image` into `(dx, dy, dw, dh)`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the host cannot draw the image.
    #[allow(clippy::too_many_arguments)]
    fn draw_image(
        &mut self,
        image: &Self::Image,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), RenderError>;

    /// # Errors
    ///
    /// Returns `Err` if the host cannot draw the text.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;

    /// # Errors
    ///
    /// Returns `Err` if the host cannot draw the text.
    fn stroke_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// # Errors
    ///
    /// Returns `Err` if the host cannot measure the text.
    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError>;

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: &str);
    fn set_text_baseline(&mut self, baseline: &str);
    fn set_shadow_color(&mut self, color: &str);
    fn set_shadow_offset_x(&mut self, offset: f64);
    fn set_shadow_offset_y(&mut self, offset: f64);
    fn set_shadow_blur(&mut self, blur: f64);
    fn set_image_smoothing(&mut self, enabled: bool);
}

/// Run `f` against the surface behind `handle`.
///
/// # Errors
///
/// Returns [`RenderError::Surface`] if the surface is already borrowed, or
/// whatever `f` returns.
pub fn with_surface<S, R>(
    handle: &SurfaceHandle<S>,
    f: impl FnOnce(&mut S) -> Result<R, RenderError>,
) -> Result<R, RenderError> {
    let mut surface = handle
        .try_borrow_mut()
        .map_err(|_| RenderError::Surface("surface is busy".into()))?;
    f(&mut surface)
}

/// Scope guard around `save()` / `restore()`.
///
/// `restore()` runs when the guard drops, so transforms and styles set while
/// the guard is alive never outlive it, even if the draw in between failed.
pub struct SavedState<'a, S: Surface> {
    handle: &'a SurfaceHandle<S>,
}

impl<'a, S: Surface> SavedState<'a, S> {
    /// Save the surface state.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface is already borrowed.
    pub fn new(handle: &'a SurfaceHandle<S>) -> Result<Self, RenderError> {
        with_surface(handle, |surface| {
            surface.save();
            Ok(())
        })?;
        Ok(Self { handle })
    }
}

impl<S: Surface> Drop for SavedState<'_, S> {
    fn drop(&mut self) {
        match self.handle.try_borrow_mut() {
            Ok(mut surface) => surface.restore(),
            Err(_) => warn!("surface busy on restore; state stack left unbalanced"),
        }
    }
}
