#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::headless::{DrawCommand, RecordingSurface};
use crate::renderable::ShadowOptions;
use crate::surface::SurfaceHandle;

fn surface() -> SurfaceHandle<RecordingSurface> {
    Rc::new(RefCell::new(RecordingSurface::new(100.0, 100.0)))
}

fn bound(options: TextOptions) -> (Text<RecordingSurface>, SurfaceHandle<RecordingSurface>) {
    let handle = surface();
    let mut text = Text::new(options);
    text.bind_surface(handle.clone());
    (text, handle)
}

// =============================================================
// Options
// =============================================================

#[test]
fn defaults_match_engine_conventions() {
    let options = TextOptions::default();
    assert_eq!(options.font, "Normal 12px Verdana");
    assert_eq!(options.color, "#000000");
    assert_eq!(options.align, TextAlign::Left);
    assert_eq!(options.baseline, TextBaseline::Top);
    assert!(!options.stroke);
}

#[test]
fn options_deserialize_with_partial_fields() {
    let options: TextOptions =
        serde_json::from_value(json!({"text": "Score", "baseline": "middle", "align": "center", "stroke": true}))
            .expect("options");
    assert_eq!(options.text, "Score");
    assert_eq!(options.baseline, TextBaseline::Middle);
    assert_eq!(options.align, TextAlign::Center);
    assert!(options.stroke);
    assert_eq!(options.font, "Normal 12px Verdana");
}

#[test]
fn baseline_and_align_strings() {
    assert_eq!(TextBaseline::Ideographic.as_str(), "ideographic");
    assert_eq!(TextBaseline::Alphabetic.as_str(), "alphabetic");
    assert_eq!(TextAlign::End.as_str(), "end");
}

// =============================================================
// Render
// =============================================================

#[test]
fn fill_mode_uses_fill_text_and_fill_style() {
    let (mut text, handle) = bound(TextOptions {
        x: 3.0,
        y: 4.0,
        text: "hi".into(),
        color: "green".into(),
        ..TextOptions::default()
    });
    text.render().expect("render");

    let s = handle.borrow();
    assert_eq!(s.state().fill_style, "green");
    assert_eq!(
        s.commands(),
        &[DrawCommand::FillText {
            text: "hi".into(),
            x: 3.0,
            y: 4.0,
            style: "green".into(),
            font: "Normal 12px Verdana".into(),
        }]
    );
}

#[test]
fn stroke_mode_never_fills() {
    let (mut text, handle) = bound(TextOptions {
        x: 10.0,
        y: 20.0,
        text: "Game Over".into(),
        color: "#fff".into(),
        stroke: true,
        ..TextOptions::default()
    });
    text.render().expect("render");

    let s = handle.borrow();
    assert!(!s.commands().iter().any(|c| matches!(c, DrawCommand::FillText { .. })));
    assert_eq!(
        s.commands(),
        &[DrawCommand::StrokeText {
            text: "Game Over".into(),
            x: 10.0,
            y: 20.0,
            style: "#fff".into(),
            font: "Normal 12px Verdana".into(),
        }]
    );
    assert_eq!(s.state().fill_style, "#000000");
}

#[test]
fn render_sets_font_align_and_baseline() {
    let (mut text, handle) = bound(TextOptions {
        font: "20px serif".into(),
        align: TextAlign::Right,
        baseline: TextBaseline::Bottom,
        ..TextOptions::default()
    });
    text.render().expect("render");
    let s = handle.borrow();
    assert_eq!(s.state().font, "20px serif");
    assert_eq!(s.state().text_align, "right");
    assert_eq!(s.state().text_baseline, "bottom");
}

#[test]
fn render_applies_recorded_operations() {
    let (mut text, handle) = bound(TextOptions::default());
    text.shadow(&ShadowOptions { blur: Some(3.0), ..ShadowOptions::default() });
    text.render().expect("render");
    assert_eq!(handle.borrow().state().shadow_blur, 3.0);
}

#[test]
fn switching_mode_after_construction() {
    let (mut text, handle) = bound(TextOptions { text: "x".into(), ..TextOptions::default() });
    text.use_stroke();
    assert!(text.is_stroke());
    text.render().expect("render");
    text.use_fill();
    text.render().expect("render");

    let s = handle.borrow();
    assert!(matches!(s.commands()[0], DrawCommand::StrokeText { .. }));
    assert!(matches!(s.commands()[1], DrawCommand::FillText { .. }));
}

#[test]
fn unbound_text_fails_to_render() {
    let mut text: Text<RecordingSurface> = Text::new(TextOptions::default());
    assert!(matches!(text.render(), Err(RenderError::SurfaceUnbound)));
}

// =============================================================
// Measure
// =============================================================

#[test]
fn measure_returns_metrics_and_restores_state() {
    let (mut text, handle) = bound(TextOptions { font: "24px Verdana".into(), ..TextOptions::default() });
    text.set_text("abc");
    let metrics = text.measure().expect("measure");
    assert_eq!(metrics.width, 36.0);

    let s = handle.borrow();
    assert_eq!(s.depth(), 0);
    assert_eq!(s.state().font, "10px sans-serif");
    assert_eq!(
        s.commands(),
        &[DrawCommand::Save, DrawCommand::MeasureText { text: "abc".into() }, DrawCommand::Restore]
    );
}

#[test]
fn measure_unbound_is_error() {
    let text: Text<RecordingSurface> = Text::new(TextOptions::default());
    assert!(matches!(text.measure(), Err(RenderError::SurfaceUnbound)));
}
