//! Live inspection of rendered window surfaces.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Host service reporting state that content sets on its rendered surface after mount.
pub trait SurfaceInspector {
    /// Whether the rendered content of `window_id` currently carries `data-is-busy="true"`.
    ///
    /// `None` when the surface cannot be inspected; the runtime then keeps its recorded state.
    fn is_busy(&self, window_id: u64) -> Option<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Inspector for hosts without a rendered surface.
pub struct NoopSurfaceInspector;

impl SurfaceInspector for NoopSurfaceInspector {
    fn is_busy(&self, _window_id: u64) -> Option<bool> {
        None
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory inspector; windows never marked report `None`.
pub struct MemorySurfaceInspector {
    busy: Rc<RefCell<HashMap<u64, bool>>>,
}

impl MemorySurfaceInspector {
    /// Sets the live busy flag of `window_id`.
    pub fn set_busy(&self, window_id: u64, busy: bool) {
        self.busy.borrow_mut().insert(window_id, busy);
    }
}

impl SurfaceInspector for MemorySurfaceInspector {
    fn is_busy(&self, window_id: u64) -> Option<bool> {
        self.busy.borrow().get(&window_id).copied()
    }
}
