//! Typed host-domain contracts for the window runtime's external collaborators.
//!
//! This crate is the API-first boundary between the window engine and whatever surrounds it:
//! content retrieval, post-render content initialization, live surface inspection, user
//! notifications, timers, task spawning and wall-clock time. Concrete browser adapters live in
//! `window_host_web`; the in-memory adapters here back headless hosts and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod content;
pub mod host;
pub mod initializer;
pub mod notifications;
pub mod spawner;
pub mod surface;
pub mod time;
pub mod timers;

pub use content::{
    normalize_endpoint, static_route_candidates, ContentFuture, ContentGate, ContentProvider,
    ContentRequest, MemoryContentProvider, StaticTemplateProvider,
};
pub use host::WindowHostServices;
pub use initializer::{ContentInitializer, NoopContentInitializer, RecordingContentInitializer};
pub use notifications::{
    MemoryNotificationService, NoopNotificationService, NotificationFuture, NotificationLevel,
    NotificationService,
};
pub use spawner::{LocalPoolSpawner, SpawnedTask, TaskSpawner};
pub use surface::{MemorySurfaceInspector, NoopSurfaceInspector, SurfaceInspector};
pub use time::{unix_time_ms_now, Clock, SystemClock};
pub use timers::{ManualTimerService, TimerHandle, TimerService, TimerTask};
