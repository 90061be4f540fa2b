//! Bitmap sprites with horizontal-strip frame animation.
//!
//! A sprite draws one frame-sized region of its image asset. When the asset is
//! wider than the sprite's intrinsic width, the asset is treated as a strip of
//! frames laid out left to right and `current_frame` picks the column.
//!
//! Geometry is unknown until the asset has loaded: [`Sprite::on_load`] fills
//! in missing dimensions from the asset, recomputes the scaled size, and
//! derives the frame count. Rendering before that point draws nothing.

#[cfg(test)]
#[path = "sprite_test.rs"]
mod sprite_test;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::consts::DEBUG_OUTLINE_COLOR;
use crate::error::RenderError;
use crate::geometry::Point;
use crate::renderable::{Drawable, Renderable};
use crate::surface::{ImageAsset, Surface, with_surface};

/// Declarative construction parameters; everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpriteOptions {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub src: Option<String>,
}

/// An image region drawn at a logical position.
pub struct Sprite<S: Surface> {
    base: Renderable<S>,
    asset: S::Image,

    pub x: f64,
    pub y: f64,
    draw_x: f64,
    draw_y: f64,

    // Intrinsic size, before scale.
    intrinsic_width: Option<f64>,
    intrinsic_height: Option<f64>,

    pub flip_x: bool,
    pub flip_y: bool,

    frames: u32,
    current_frame: u32,

    loaded: bool,
    debug: bool,
}

impl<S: Surface> Sprite<S> {
    /// Create a sprite over `asset`.
    ///
    /// With `options.src` set the asset starts loading and the host must call
    /// [`Sprite::on_load`] when it completes. Without it, an asset that already
    /// knows its natural size is treated as loaded right away.
    #[must_use]
    pub fn new(asset: S::Image, options: SpriteOptions) -> Self {
        let x = options.x.unwrap_or(0.0);
        let y = options.y.unwrap_or(0.0);
        let mut sprite = Self {
            base: Renderable::new(),
            asset,
            x,
            y,
            draw_x: x,
            draw_y: y,
            intrinsic_width: options.width,
            intrinsic_height: options.height,
            flip_x: false,
            flip_y: false,
            frames: 1,
            current_frame: 0,
            loaded: false,
            debug: false,
        };

        sprite.scale(1.0, 1.0);

        match options.src {
            Some(src) => sprite.load(&src),
            None if sprite.asset.natural_size().is_some() => sprite.on_load(),
            None => {}
        }

        sprite
    }

    /// Point the asset at `src`. Geometry is recomputed by the next
    /// [`Sprite::on_load`].
    pub fn load(&mut self, src: &str) {
        self.loaded = false;
        self.asset.set_source(src);
    }

    /// Completion signal from the asset: fill in unknown dimensions, rescale,
    /// and derive the frame count.
    pub fn on_load(&mut self) {
        let Some(natural) = self.asset.natural_size() else {
            warn!(src = self.asset.source(), "on_load fired before asset reported a size");
            return;
        };

        if self.intrinsic_width.is_none_or(|w| w == 0.0) {
            self.intrinsic_width = Some(natural.width);
        }
        if self.intrinsic_height.is_none_or(|h| h == 0.0) {
            self.intrinsic_height = Some(natural.height);
        }

        let frame_width = self.intrinsic_width.unwrap_or(natural.width);
        self.frames = if frame_width > 0.0 && frame_width < natural.width {
            // Bounded by the asset width in pixels.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let frames = (natural.width / frame_width).ceil() as u32;
            frames
        } else {
            1
        };
        if self.current_frame >= self.frames {
            self.current_frame = 0;
        }

        self.loaded = true;
        debug!(src = self.asset.source(), frames = self.frames, "sprite asset loaded");
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn asset(&self) -> &S::Image {
        &self.asset
    }

    pub fn asset_mut(&mut self) -> &mut S::Image {
        &mut self.asset
    }

    /// Intrinsic width times the current horizontal scale.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.intrinsic_width.unwrap_or(0.0) * self.base.scale_x()
    }

    /// Intrinsic height times the current vertical scale.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.intrinsic_height.unwrap_or(0.0) * self.base.scale_y()
    }

    #[must_use]
    pub fn intrinsic_width(&self) -> Option<f64> {
        self.intrinsic_width
    }

    #[must_use]
    pub fn intrinsic_height(&self) -> Option<f64> {
        self.intrinsic_height
    }

    /// Position used by the most recent draw, normalized against scale.
    #[must_use]
    pub fn draw_position(&self) -> Point {
        Point::new(self.draw_x, self.draw_y)
    }

    #[must_use]
    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    #[must_use]
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Select a frame; out-of-range indices wrap around the strip.
    pub fn set_frame(&mut self, frame: u32) {
        self.current_frame = frame % self.frames.max(1);
    }

    /// Advance one frame, wrapping to the first after the last.
    pub fn next_frame(&mut self) {
        self.set_frame(self.current_frame + 1);
    }
}

impl<S: Surface> Drawable<S> for Sprite<S> {
    fn base(&self) -> &Renderable<S> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Renderable<S> {
        &mut self.base
    }

    fn render(&mut self) -> Result<(), RenderError> {
        let handle = self.base.surface()?.clone();
        if !self.loaded {
            return Ok(());
        }

        let frame_w = self.intrinsic_width.unwrap_or(0.0);
        let frame_h = self.intrinsic_height.unwrap_or(0.0);

        with_surface(&handle, |surface| {
            self.base.apply(surface)?;

            if self.flip_x || self.flip_y {
                // Known to misplace flipped sprites that are also scaled.
                surface.translate(f64::from(u8::from(self.flip_x)) * frame_w, f64::from(u8::from(self.flip_y)) * frame_h)?;
                surface.scale(if self.flip_x { -1.0 } else { 1.0 }, if self.flip_y { -1.0 } else { 1.0 })?;
            }

            // Normalize against the current scale, evaluated every frame.
            let surface_w = surface.width();
            let surface_h = surface.height();
            self.draw_x = self.x * surface_w / (self.base.scale_x() * surface_w);
            self.draw_y = self.y * surface_h / (self.base.scale_y() * surface_h);

            // Output size is the unscaled frame size; the scale operation
            // already applied to the surface does the scaling.
            surface.draw_image(
                &self.asset,
                frame_w * f64::from(self.current_frame),
                0.0,
                frame_w,
                frame_h,
                self.draw_x,
                self.draw_y,
                frame_w,
                frame_h,
            )?;

            if self.debug {
                surface.set_stroke_style(DEBUG_OUTLINE_COLOR);
                surface.stroke_rect(self.draw_x, self.draw_y, frame_w, frame_h);
            }
            Ok(())
        })
    }

    fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }
}
