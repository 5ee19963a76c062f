//! Window lifecycle and spatial management engine.
//!
//! Hosts independent, draggable, snap-tileable window panels inside one workspace surface.
//! [`window_manager::WindowManager`] is the entry point; the other modules are the layers it
//! composes, leaf-first: geometry bookkeeping, tiling layout, drag sessions, lifecycle state,
//! and the change-notification [`refresher`].

pub mod components;
pub mod config;
pub mod content;
pub mod drag;
pub mod geometry;
pub mod lifecycle;
pub mod model;
pub mod refresher;
pub mod router;
pub mod tiling;
pub mod window_manager;

pub use components::{use_window_manager, WindowLayer, WindowManagerContext, WindowManagerProvider};
pub use config::{RefresherConfig, WindowManagerConfig};
pub use content::WindowSurface;
pub use lifecycle::{OpenFuture, RuntimeEffect, SurfaceCommand, WindowError, WindowLifecycle};
pub use model::*;
pub use refresher::{EventPayload, RefreshPlan, WindowProvider, WindowRefresher};
pub use window_manager::{InputEvent, SnapIndicator, WindowManager};
