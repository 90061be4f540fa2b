//! Error types for drawing and scheduling.
//!
//! Drawing failures are reported per node by the pipeline; scheduling failures
//! come from the host that installs frame callbacks and timers. Each variant
//! maps to a stable code so hosts can log or forward them without matching on
//! display strings.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced while recording or drawing renderable operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The node was drawn before a surface was bound to it.
    #[error("no surface bound to drawable")]
    SurfaceUnbound,

    /// A drawing operation name that has no surface counterpart.
    #[error("unsupported drawing operation: {name}")]
    UnsupportedOperation { name: String },

    /// A known operation with arguments of the wrong shape.
    #[error("malformed drawing operation {name}: {reason}")]
    MalformedOperation { name: String, reason: String },

    /// The requested operation does not exist at the rendering layer.
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    /// The node is already mutably borrowed elsewhere.
    #[error("drawable is busy")]
    NodeBusy,

    /// The host surface rejected a drawing call.
    #[error("surface call failed: {0}")]
    Surface(String),

    /// One or more nodes failed during a render pass.
    #[error("{failed} node(s) failed to render; first: {first}")]
    Pass { failed: usize, first: Box<RenderError> },
}

impl RenderError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SurfaceUnbound => "E_SURFACE_UNBOUND",
            Self::UnsupportedOperation { .. } => "E_UNSUPPORTED_OPERATION",
            Self::MalformedOperation { .. } => "E_MALFORMED_OPERATION",
            Self::Unimplemented(_) => "E_UNIMPLEMENTED",
            Self::NodeBusy => "E_NODE_BUSY",
            Self::Surface(_) => "E_SURFACE",
            Self::Pass { .. } => "E_RENDER_PASS",
        }
    }

    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        Self::MalformedOperation { name: name.to_owned(), reason: reason.into() }
    }
}

/// Errors produced while installing frame callbacks and timers.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The host refused to install the callback.
    #[error("host scheduling failed: {0}")]
    Host(String),

    /// The actor is already mutably borrowed (e.g. from inside its own timer).
    #[error("actor is busy")]
    ActorBusy,
}

impl ScheduleError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Host(_) => "E_SCHEDULE_HOST",
            Self::ActorBusy => "E_ACTOR_BUSY",
        }
    }
}
