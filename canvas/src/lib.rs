//! Rendering and scene core for a small 2D engine.
//!
//! The crate runs natively and as WebAssembly. An [`engine::Engine`] owns a
//! [`pipeline::RenderSurface`], an ordered list of drawable nodes drawn once
//! per frame onto a [`surface::Surface`]. Nodes are sprites (bitmap strips
//! with frame animation) and text labels, both built on a shared
//! [`renderable::Renderable`] record of drawing operations. Actors pair a
//! graphic with behaviours that run on host timers, independently of the
//! frame loop.
//!
//! All host interaction (frames, timers, clock) goes through an explicit
//! [`schedule::Scheduler`] handle, and all drawing goes through the
//! [`surface::Surface`] capability, so the same scene runs against a browser
//! canvas or a recording surface.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Frame loop driver, actor tracking, frame-rate overlay |
//! | [`pipeline`] | Ordered node list and the per-frame render pass |
//! | [`renderable`] | Base operation record and the [`renderable::Drawable`] trait |
//! | [`operation`] | Closed set of recordable drawing operations |
//! | [`sprite`] | Bitmap nodes with frame strips and flipping |
//! | [`text`] | Text label nodes |
//! | [`actor`] | Actors, behaviours and their timers |
//! | [`schedule`] | Host scheduling trait and a virtual-clock host |
//! | [`surface`] | Drawing surface and image asset capabilities |
//! | [`headless`] | Recording surface for native hosts and tests |
//! | [`web`] | Browser surface, images and scheduler |
//! | [`geometry`] | Points and sizes |
//! | [`error`] | Render and scheduling errors |
//! | [`consts`] | Shared defaults (fonts, shadow, timer periods, overlay) |

pub mod actor;
pub mod consts;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod operation;
pub mod pipeline;
pub mod renderable;
pub mod schedule;
pub mod sprite;
pub mod surface;
pub mod text;
pub mod web;
