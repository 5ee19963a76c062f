//! Browser (`wasm32`) implementations of [`window_host`] service contracts.
//!
//! Every adapter compiles on non-wasm targets too, where it degrades to an inert fallback so
//! the workspace builds and tests natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Host bundle assembly for browser runtimes.
pub mod adapters;
pub mod content;
pub mod notifications;
pub mod spawner;
pub mod surface;
pub mod timers;

mod interop;

pub use adapters::{build_host_services, ContentStrategy};
pub use content::{DomTemplateProvider, WebContentProvider, MODAL_REQUEST_HEADER};
pub use notifications::ConsoleNotificationService;
pub use spawner::WebTaskSpawner;
pub use surface::{DomSurfaceInspector, WINDOW_ID_ATTRIBUTE};
pub use timers::WebTimerService;
