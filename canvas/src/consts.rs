//! Shared defaults for the canvas crate.

// ── Text ────────────────────────────────────────────────────────

/// Font used by text nodes that do not name one.
pub const DEFAULT_FONT: &str = "Normal 12px Verdana";

/// Color used by text nodes that do not name one.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

// ── Shadow ──────────────────────────────────────────────────────

/// Shadow color recorded when `shadow` is called without one.
pub const DEFAULT_SHADOW_COLOR: &str = "#000";

/// Shadow blur recorded when `shadow` is called without one.
pub const DEFAULT_SHADOW_BLUR: f64 = 1.0;

// ── Scheduling ──────────────────────────────────────────────────

/// Period of an actor's shared `"update"` timer, in milliseconds.
pub const DEFAULT_UPDATE_INTERVAL_MS: f64 = 100.0;

/// Timer id under which behaviour updates are scheduled.
pub const UPDATE_TIMER_ID: &str = "update";

/// Frame period for hosts without a display-frame primitive (60 Hz).
pub const FALLBACK_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

// ── Debug overlay ───────────────────────────────────────────────

/// Stroke color of the sprite outline drawn in debug mode.
pub const DEBUG_OUTLINE_COLOR: &str = "red";

/// Frame-rate overlay placement and style.
pub const FPS_OVERLAY_X: f64 = 4.0;
pub const FPS_OVERLAY_Y: f64 = 4.0;
pub const FPS_OVERLAY_FONT: &str = "12px Verdana";
pub const FPS_OVERLAY_COLOR: &str = "red";
