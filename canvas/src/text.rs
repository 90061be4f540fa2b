//! Text labels.
//!
//! A label is drawn either filled or stroked. The mode picks both the draw
//! call (`fill_text` / `stroke_text`) and the style slot that receives the
//! label's color, and is fixed at construction unless switched explicitly.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use serde::Deserialize;

use crate::consts::{DEFAULT_FONT, DEFAULT_TEXT_COLOR};
use crate::error::RenderError;
use crate::geometry::Point;
use crate::renderable::{Drawable, Renderable};
use crate::surface::{SavedState, Surface, TextMetrics, with_surface};

/// Horizontal alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Start,
    End,
}

impl TextAlign {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Vertical alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    #[default]
    Top,
    Hanging,
    Middle,
    Alphabetic,
    Ideographic,
    Bottom,
}

impl TextBaseline {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Hanging => "hanging",
            Self::Middle => "middle",
            Self::Alphabetic => "alphabetic",
            Self::Ideographic => "ideographic",
            Self::Bottom => "bottom",
        }
    }
}

/// Declarative construction parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font: String,
    pub color: String,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub stroke: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            text: String::new(),
            font: DEFAULT_FONT.to_owned(),
            color: DEFAULT_TEXT_COLOR.to_owned(),
            align: TextAlign::default(),
            baseline: TextBaseline::default(),
            stroke: false,
        }
    }
}

/// A string drawn at a position.
pub struct Text<S: Surface> {
    base: Renderable<S>,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font: String,
    pub color: String,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    stroke: bool,
}

impl<S: Surface> Text<S> {
    #[must_use]
    pub fn new(options: TextOptions) -> Self {
        Self {
            base: Renderable::new(),
            x: options.x,
            y: options.y,
            text: options.text,
            font: options.font,
            color: options.color,
            align: options.align,
            baseline: options.baseline,
            stroke: options.stroke,
        }
    }

    /// Draw with `stroke_text` and color the stroke style.
    pub fn use_stroke(&mut self) {
        self.stroke = true;
    }

    /// Draw with `fill_text` and color the fill style.
    pub fn use_fill(&mut self) {
        self.stroke = false;
    }

    #[must_use]
    pub fn is_stroke(&self) -> bool {
        self.stroke
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Measure the current text in the current font.
    ///
    /// The font is applied under a saved state, so measuring leaves the
    /// surface as it found it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SurfaceUnbound`] before the label is bound, or
    /// the host's measuring failure.
    pub fn measure(&self) -> Result<TextMetrics, RenderError> {
        let handle = self.base.surface()?;
        let _saved = SavedState::new(handle)?;
        with_surface(handle, |surface| {
            surface.set_font(&self.font);
            surface.measure_text(&self.text)
        })
    }
}

impl<S: Surface> Drawable<S> for Text<S> {
    fn base(&self) -> &Renderable<S> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut Renderable<S> {
        &mut self.base
    }

    fn render(&mut self) -> Result<(), RenderError> {
        let handle = self.base.surface()?;
        with_surface(handle, |surface| {
            self.base.apply(surface)?;

            surface.set_font(&self.font);
            surface.set_text_align(self.align.as_str());
            surface.set_text_baseline(self.baseline.as_str());

            if self.stroke {
                surface.set_stroke_style(&self.color);
                surface.stroke_text(&self.text, self.x, self.y)
            } else {
                surface.set_fill_style(&self.color);
                surface.fill_text(&self.text, self.x, self.y)
            }
        })
    }

    fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }
}
