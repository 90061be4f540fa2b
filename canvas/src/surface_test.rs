use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::headless::{DrawCommand, RecordingSurface};

fn handle() -> SurfaceHandle<RecordingSurface> {
    Rc::new(RefCell::new(RecordingSurface::new(100.0, 50.0)))
}

// =============================================================
// with_surface
// =============================================================

#[test]
fn with_surface_passes_result_through() {
    let h = handle();
    let width = with_surface(&h, |surface| Ok(surface.width())).expect("width");
    assert!((width - 100.0).abs() < f64::EPSILON);
}

#[test]
fn with_surface_reports_busy_surface() {
    let h = handle();
    let _held = h.borrow();
    let err = with_surface(&h, |_| Ok(())).expect_err("busy");
    assert_eq!(err.error_code(), "E_SURFACE");
}

// =============================================================
// SavedState
// =============================================================

#[test]
fn saved_state_restores_on_drop() {
    let h = handle();
    {
        let _saved = SavedState::new(&h).expect("save");
        assert_eq!(h.borrow().depth(), 1);
    }
    assert_eq!(h.borrow().depth(), 0);
    assert_eq!(h.borrow().commands(), &[DrawCommand::Save, DrawCommand::Restore]);
}

#[test]
fn saved_state_restores_on_early_return() {
    fn failing_draw(h: &SurfaceHandle<RecordingSurface>) -> Result<(), RenderError> {
        let _saved = SavedState::new(h)?;
        with_surface(h, |surface| surface.translate(5.0, 5.0))?;
        Err(RenderError::Surface("boom".into()))
    }

    let h = handle();
    assert!(failing_draw(&h).is_err());
    assert_eq!(h.borrow().depth(), 0);
    assert!(matches!(h.borrow().commands().last(), Some(DrawCommand::Restore)));
}

#[test]
fn saved_state_fails_without_saving_when_busy() {
    let h = handle();
    let held = h.borrow_mut();
    assert!(SavedState::new(&h).is_err());
    drop(held);
    assert!(h.borrow().commands().is_empty());
}
