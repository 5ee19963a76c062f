//! Host service bundle injected into the window runtime.

use std::rc::Rc;

use crate::{
    Clock, ContentInitializer, ContentProvider, NotificationService, SurfaceInspector, TaskSpawner,
    TimerService,
};

/// Runtime-selected collaborator bundle handed to the window manager.
///
/// All environment-specific selection happens before this bundle crosses into
/// `window_runtime`, which keeps the engine free of browser or test adapter details.
#[derive(Clone)]
pub struct WindowHostServices {
    /// Source of window markup.
    pub content: Rc<dyn ContentProvider>,
    /// Post-render hook for embedded content modules.
    pub initializer: Rc<dyn ContentInitializer>,
    /// Live state of rendered surfaces, consulted before silent refreshes.
    pub surfaces: Rc<dyn SurfaceInspector>,
    /// User-facing notification delivery.
    pub notifications: Rc<dyn NotificationService>,
    /// Delayed callbacks for transitions, refresh delays and resize debouncing.
    pub timers: Rc<dyn TimerService>,
    /// Millisecond clock for cooldowns and placement settling.
    pub clock: Rc<dyn Clock>,
    /// Driver for detached futures (background refreshes, trigger-initiated opens).
    pub spawner: Rc<dyn TaskSpawner>,
}
