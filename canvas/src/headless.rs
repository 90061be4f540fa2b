//! Headless surface that records draw calls instead of producing pixels.
//!
//! [`RecordingSurface`] keeps the same state a canvas context would (current
//! transform, styles, and a save/restore stack) and appends a [`DrawCommand`]
//! for every call that changes the picture. Tests assert on the command log;
//! the native binary logs it.

#[cfg(test)]
#[path = "headless_test.rs"]
mod headless_test;

use serde::Serialize;

use crate::error::RenderError;
use crate::geometry::Size;
use crate::surface::{ImageAsset, Surface, TextMetrics};

/// Advance width of one glyph when measuring text headlessly.
const GLYPH_WIDTH: f64 = 6.0;

/// An image whose natural size is supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessImage {
    src: String,
    size: Option<Size>,
}

impl HeadlessImage {
    /// An image that has not loaded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An image that is already decoded at `width` × `height`.
    #[must_use]
    pub fn loaded(width: f64, height: f64) -> Self {
        Self { src: String::new(), size: Some(Size::new(width, height)) }
    }

    /// Mark the image as decoded. The caller then fires the sprite's `on_load`.
    pub fn complete(&mut self, width: f64, height: f64) {
        self.size = Some(Size::new(width, height));
    }
}

impl ImageAsset for HeadlessImage {
    fn natural_size(&self) -> Option<Size> {
        self.size
    }

    fn set_source(&mut self, src: &str) {
        src.clone_into(&mut self.src);
        self.size = None;
    }

    fn source(&self) -> &str {
        &self.src
    }
}

/// Current transform as translate-then-scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { translate_x: 0.0, translate_y: 0.0, scale_x: 1.0, scale_y: 1.0 }
    }
}

/// Everything `save()` captures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceState {
    pub transform: Transform,
    pub fill_style: String,
    pub stroke_style: String,
    pub font: String,
    pub text_align: String,
    pub text_baseline: String,
    pub shadow_color: String,
    pub shadow_offset_x: f64,
    pub shadow_offset_y: f64,
    pub shadow_blur: f64,
    pub image_smoothing: bool,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fill_style: "#000000".into(),
            stroke_style: "#000000".into(),
            font: "10px sans-serif".into(),
            text_align: "start".into(),
            text_baseline: "alphabetic".into(),
            shadow_color: "rgba(0, 0, 0, 0)".into(),
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_blur: 0.0,
            image_smoothing: true,
        }
    }
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Scale { x: f64, y: f64 },
    DrawImage {
        src: String,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
        transform: Transform,
    },
    FillText { text: String, x: f64, y: f64, style: String, font: String },
    StrokeText { text: String, x: f64, y: f64, style: String, font: String },
    StrokeRect { x: f64, y: f64, width: f64, height: f64, style: String, transform: Transform },
    MeasureText { text: String },
}

/// A [`Surface`] that records its calls.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    state: SurfaceState,
    stack: Vec<SurfaceState>,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, state: SurfaceState::default(), stack: Vec::new(), commands: Vec::new() }
    }

    /// All calls recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The live drawing state.
    #[must_use]
    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// Number of unmatched `save()` calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn font_px(&self) -> Option<f64> {
        self.state.font.split_whitespace().find_map(|part| match part.strip_suffix("px")?.parse::<f64>() {
            Ok(px) => Some(px),
            Err(_) => None,
        })
    }
}

impl Surface for RecordingSurface {
    type Image = HeadlessImage;

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::ClearRect { x, y, width, height });
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        // Unbalanced restore is ignored, as on a real canvas.
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        let t = &mut self.state.transform;
        t.translate_x += x * t.scale_x;
        t.translate_y += y * t.scale_y;
        self.commands.push(DrawCommand::Translate { x, y });
        Ok(())
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        let t = &mut self.state.transform;
        t.scale_x *= x;
        t.scale_y *= y;
        self.commands.push(DrawCommand::Scale { x, y });
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &HeadlessImage,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), RenderError> {
        if image.natural_size().is_none() {
            return Err(RenderError::Surface(format!("image not decoded: {}", image.source())));
        }
        self.commands.push(DrawCommand::DrawImage {
            src: image.source().to_owned(),
            sx,
            sy,
            sw,
            sh,
            dx,
            dy,
            dw,
            dh,
            transform: self.state.transform,
        });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::FillText {
            text: text.to_owned(),
            x,
            y,
            style: self.state.fill_style.clone(),
            font: self.state.font.clone(),
        });
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.commands.push(DrawCommand::StrokeText {
            text: text.to_owned(),
            x,
            y,
            style: self.state.stroke_style.clone(),
            font: self.state.font.clone(),
        });
        Ok(())
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::StrokeRect {
            x,
            y,
            width,
            height,
            style: self.state.stroke_style.clone(),
            transform: self.state.transform,
        });
    }

    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError> {
        self.commands.push(DrawCommand::MeasureText { text: text.to_owned() });
        // Scale glyph advance with the font size; 12px is the reference size.
        let scale = self.font_px().map_or(1.0, |px| px / 12.0);
        #[allow(clippy::cast_precision_loss)]
        let glyphs = text.chars().count() as f64;
        Ok(TextMetrics { width: glyphs * GLYPH_WIDTH * scale })
    }

    fn set_fill_style(&mut self, style: &str) {
        style.clone_into(&mut self.state.fill_style);
    }

    fn set_stroke_style(&mut self, style: &str) {
        style.clone_into(&mut self.state.stroke_style);
    }

    fn set_font(&mut self, font: &str) {
        font.clone_into(&mut self.state.font);
    }

    fn set_text_align(&mut self, align: &str) {
        align.clone_into(&mut self.state.text_align);
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        baseline.clone_into(&mut self.state.text_baseline);
    }

    fn set_shadow_color(&mut self, color: &str) {
        color.clone_into(&mut self.state.shadow_color);
    }

    fn set_shadow_offset_x(&mut self, offset: f64) {
        self.state.shadow_offset_x = offset;
    }

    fn set_shadow_offset_y(&mut self, offset: f64) {
        self.state.shadow_offset_y = offset;
    }

    fn set_shadow_blur(&mut self, blur: f64) {
        self.state.shadow_blur = blur;
    }

    fn set_image_smoothing(&mut self, enabled: bool) {
        self.state.image_smoothing = enabled;
    }
}
