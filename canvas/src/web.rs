//! Browser host.
//!
//! This module is the only place that touches `web-sys`. [`WebSurface`] draws
//! through a [`CanvasRenderingContext2d`], [`WebImage`] wraps an
//! [`HtmlImageElement`], and [`WebScheduler`] maps frames and timers onto
//! `requestAnimationFrame` and `setInterval`.
//!
//! Fallible browser calls surface as `Result<_, JsValue>` at this boundary and
//! as [`RenderError::Surface`] / [`ScheduleError::Host`] inside the core.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Performance, Window};

use crate::consts::FALLBACK_FRAME_INTERVAL_MS;
use crate::engine::{Engine, EngineConfig, EngineHandle};
use crate::error::{RenderError, ScheduleError};
use crate::geometry::Size;
use crate::schedule::{FrameCallback, IntervalCallback, Scheduler, TimerHandle};
use crate::sprite::Sprite;
use crate::surface::{ImageAsset, Surface, TextMetrics};

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn surface_error(value: &JsValue) -> RenderError {
    RenderError::Surface(js_message(value))
}

// =============================================================
// Image
// =============================================================

/// An `<img>` element used as a sprite asset.
pub struct WebImage {
    element: HtmlImageElement,
    src: String,
    // Kept alive for as long as the element may fire it.
    onload: Option<Closure<dyn FnMut()>>,
}

impl WebImage {
    /// Create a detached image element.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if the element cannot be created.
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self::from_element(HtmlImageElement::new()?))
    }

    /// Wrap an existing element, e.g. one found in the page.
    #[must_use]
    pub fn from_element(element: HtmlImageElement) -> Self {
        let src = element.src();
        Self { element, src, onload: None }
    }

    #[must_use]
    pub fn element(&self) -> &HtmlImageElement {
        &self.element
    }

    fn set_onload(&mut self, callback: Closure<dyn FnMut()>) {
        self.element.set_onload(Some(callback.as_ref().unchecked_ref()));
        self.onload = Some(callback);
    }
}

impl ImageAsset for WebImage {
    fn natural_size(&self) -> Option<Size> {
        let (width, height) = (self.element.natural_width(), self.element.natural_height());
        if self.element.complete() && width > 0 {
            Some(Size::new(f64::from(width), f64::from(height)))
        } else {
            None
        }
    }

    fn set_source(&mut self, src: &str) {
        self.element.set_src(src);
        src.clone_into(&mut self.src);
    }

    fn source(&self) -> &str {
        &self.src
    }
}

impl Drop for WebImage {
    fn drop(&mut self) {
        if self.onload.is_some() {
            self.element.set_onload(None);
        }
    }
}

/// Point `sprite` at `src` and call [`Sprite::on_load`] when the browser has
/// decoded it.
pub fn load_sprite(sprite: &Rc<RefCell<Sprite<WebSurface>>>, src: &str) {
    let weak = Rc::downgrade(sprite);
    let source = src.to_owned();
    let onload = Closure::wrap(Box::new(move || {
        let Some(sprite) = weak.upgrade() else {
            return;
        };
        match sprite.try_borrow_mut() {
            Ok(mut sprite) => {
                sprite.on_load();
                debug!(src = %source, frames = sprite.frame_count(), "sprite loaded");
            }
            Err(_) => warn!(src = %source, "sprite busy on load; geometry not updated"),
        }
    }) as Box<dyn FnMut()>);

    match sprite.try_borrow_mut() {
        Ok(mut sprite) => {
            sprite.asset_mut().set_onload(onload);
            sprite.load(src);
        }
        Err(_) => warn!(src, "sprite busy; load not started"),
    }
}

// =============================================================
// Surface
// =============================================================

/// A `<canvas>` 2D context.
pub struct WebSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl WebSurface {
    /// Acquire the 2D context of `canvas`.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for WebSurface {
    type Image = WebImage;

    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.translate(x, y).map_err(|e| surface_error(&e))
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.scale(x, y).map_err(|e| surface_error(&e))
    }

    fn draw_image(
        &mut self,
        image: &WebImage,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<(), RenderError> {
        self.ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &image.element,
                sx,
                sy,
                sw,
                sh,
                dx,
                dy,
                dw,
                dh,
            )
            .map_err(|e| surface_error(&e))
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.fill_text(text, x, y).map_err(|e| surface_error(&e))
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        self.ctx.stroke_text(text, x, y).map_err(|e| surface_error(&e))
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.stroke_rect(x, y, width, height);
    }

    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError> {
        let metrics = self.ctx.measure_text(text).map_err(|e| surface_error(&e))?;
        Ok(TextMetrics { width: metrics.width() })
    }

    fn set_fill_style(&mut self, style: &str) {
        self.ctx.set_fill_style_str(style);
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.ctx.set_stroke_style_str(style);
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&mut self, align: &str) {
        self.ctx.set_text_align(align);
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        self.ctx.set_text_baseline(baseline);
    }

    fn set_shadow_color(&mut self, color: &str) {
        self.ctx.set_shadow_color(color);
    }

    fn set_shadow_offset_x(&mut self, offset: f64) {
        self.ctx.set_shadow_offset_x(offset);
    }

    fn set_shadow_offset_y(&mut self, offset: f64) {
        self.ctx.set_shadow_offset_y(offset);
    }

    fn set_shadow_blur(&mut self, blur: f64) {
        self.ctx.set_shadow_blur(blur);
    }

    fn set_image_smoothing(&mut self, enabled: bool) {
        self.ctx.set_image_smoothing_enabled(enabled);
    }
}

// =============================================================
// Scheduler
// =============================================================

/// `requestAnimationFrame` / `setInterval` on the page's window.
pub struct WebScheduler {
    window: Window,
    performance: Option<Performance>,
    next_id: Cell<u64>,
    // Browser timer id and the closure it calls, per handle.
    intervals: RefCell<HashMap<u64, (i32, Closure<dyn FnMut()>)>>,
}

impl WebScheduler {
    /// Bind to the global window.
    ///
    /// # Errors
    ///
    /// Returns an error outside a browser window context.
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let performance = window.performance();
        Ok(Self { window, performance, next_id: Cell::new(0), intervals: RefCell::new(HashMap::new()) })
    }
}

impl Scheduler for WebScheduler {
    fn now(&self) -> f64 {
        self.performance.as_ref().map_or_else(js_sys::Date::now, Performance::now)
    }

    fn request_frame(&self, callback: FrameCallback) -> Result<(), ScheduleError> {
        // Freed by wasm-bindgen after its single call.
        let closure = Closure::once_into_js(move || callback());
        if let Err(e) = self.window.request_animation_frame(closure.unchecked_ref()) {
            warn!(error = %js_message(&e), "requestAnimationFrame failed; falling back to a timeout");
            #[allow(clippy::cast_possible_truncation)]
            let timeout = FALLBACK_FRAME_INTERVAL_MS.round() as i32;
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), timeout)
                .map_err(|e| ScheduleError::Host(js_message(&e)))?;
        }
        Ok(())
    }

    fn set_interval(&self, period_ms: f64, callback: IntervalCallback) -> Result<TimerHandle, ScheduleError> {
        let closure = Closure::wrap(callback);
        #[allow(clippy::cast_possible_truncation)]
        let timeout = period_ms.max(1.0).round().min(f64::from(i32::MAX)) as i32;
        let browser_id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), timeout)
            .map_err(|e| ScheduleError::Host(js_message(&e)))?;

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.intervals
            .try_borrow_mut()
            .map_err(|_| ScheduleError::Host("scheduler busy".into()))?
            .insert(id, (browser_id, closure));
        Ok(TimerHandle(id))
    }

    fn clear_interval(&self, timer: TimerHandle) {
        let Ok(mut intervals) = self.intervals.try_borrow_mut() else {
            warn!(timer = timer.0, "scheduler busy; interval not cleared");
            return;
        };
        if let Some((browser_id, _closure)) = intervals.remove(&timer.0) {
            self.window.clear_interval_with_handle(browser_id);
        }
    }
}

// =============================================================
// Mount
// =============================================================

/// Build an engine on `canvas` and start its frame loop.
///
/// # Errors
///
/// Returns an error if the canvas has no 2D context, there is no window, or
/// the first frame cannot be requested.
pub fn mount(
    canvas: HtmlCanvasElement,
    config: EngineConfig,
) -> Result<(EngineHandle<WebSurface>, Rc<WebScheduler>), JsValue> {
    let surface = Rc::new(RefCell::new(WebSurface::new(canvas)?));
    let scheduler = Rc::new(WebScheduler::new()?);
    let engine = Engine::new(surface, config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let engine = Rc::new(RefCell::new(engine));
    Engine::start(&engine, scheduler.clone()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok((engine, scheduler))
}
