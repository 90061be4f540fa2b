//! Per-node drawing operations.
//!
//! A renderable records what it wants done to the surface before it draws
//! (scale, shadow styling) as a closed set of [`Operation`] variants. Each
//! variant either invokes a surface method with its arguments or assigns a
//! surface style property. Names are unique within an [`OperationSet`]:
//! recording the same name again replaces the previous value.

#[cfg(test)]
#[path = "operation_test.rs"]
mod operation_test;

use serde_json::Value;

use crate::error::RenderError;
use crate::surface::Surface;

/// A single recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Invoke `scale(x, y)` on the surface.
    Scale { x: f64, y: f64 },
    /// Assign `shadowColor`.
    ShadowColor(String),
    /// Assign `shadowOffsetX`.
    ShadowOffsetX(f64),
    /// Assign `shadowOffsetY`.
    ShadowOffsetY(f64),
    /// Assign `shadowBlur`.
    ShadowBlur(f64),
}

impl Operation {
    /// The surface name this operation targets.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scale { .. } => "scale",
            Self::ShadowColor(_) => "shadowColor",
            Self::ShadowOffsetX(_) => "shadowOffsetX",
            Self::ShadowOffsetY(_) => "shadowOffsetY",
            Self::ShadowBlur(_) => "shadowBlur",
        }
    }

    /// Whether applying this operation calls a surface method (as opposed to
    /// assigning a style property).
    #[must_use]
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Scale { .. })
    }

    /// Build an operation from a surface name and a loosely typed value, as
    /// handed over by declarative scene builders.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedOperation`] for names with no
    /// variant, and [`RenderError::MalformedOperation`] when the value has the
    /// wrong shape or is not finite.
    pub fn from_named(name: &str, value: &Value) -> Result<Self, RenderError> {
        match name {
            "scale" => {
                let args = value
                    .as_array()
                    .ok_or_else(|| RenderError::malformed(name, "expected an array of two numbers"))?;
                let [x, y] = args.as_slice() else {
                    return Err(RenderError::malformed(name, format!("expected 2 arguments, got {}", args.len())));
                };
                Ok(Self::Scale { x: finite(name, x)?, y: finite(name, y)? })
            }
            "shadowColor" => value
                .as_str()
                .map(|color| Self::ShadowColor(color.to_owned()))
                .ok_or_else(|| RenderError::malformed(name, "expected a color string")),
            "shadowOffsetX" => Ok(Self::ShadowOffsetX(finite(name, value)?)),
            "shadowOffsetY" => Ok(Self::ShadowOffsetY(finite(name, value)?)),
            "shadowBlur" => Ok(Self::ShadowBlur(finite(name, value)?)),
            other => Err(RenderError::UnsupportedOperation { name: other.to_owned() }),
        }
    }

    /// Apply this operation to `surface`.
    ///
    /// # Errors
    ///
    /// Propagates a rejected surface call.
    pub fn apply<S: Surface>(&self, surface: &mut S) -> Result<(), RenderError> {
        match self {
            Self::Scale { x, y } => surface.scale(*x, *y)?,
            Self::ShadowColor(color) => surface.set_shadow_color(color),
            Self::ShadowOffsetX(v) => surface.set_shadow_offset_x(*v),
            Self::ShadowOffsetY(v) => surface.set_shadow_offset_y(*v),
            Self::ShadowBlur(v) => surface.set_shadow_blur(*v),
        }
        Ok(())
    }
}

fn finite(name: &str, value: &Value) -> Result<f64, RenderError> {
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(RenderError::malformed(name, "number is not finite")),
        None => Err(RenderError::malformed(name, format!("expected a number, got {value}"))),
    }
}

/// Operations keyed by name; last write wins.
///
/// Iteration follows the order in which each name was first recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSet {
    ops: Vec<Operation>,
}

impl OperationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `op`, replacing any operation with the same name.
    pub fn insert(&mut self, op: Operation) {
        match self.ops.iter_mut().find(|existing| existing.name() == op.name()) {
            Some(slot) => *slot = op,
            None => self.ops.push(op),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.ops.iter().find(|op| op.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every recorded operation to `surface`.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected surface call.
    pub fn apply<S: Surface>(&self, surface: &mut S) -> Result<(), RenderError> {
        self.ops.iter().try_for_each(|op| op.apply(surface))
    }
}
