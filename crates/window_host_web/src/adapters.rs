use std::rc::Rc;

use window_host::{ContentInitializer, ContentProvider, SystemClock, WindowHostServices};

use crate::{
    ConsoleNotificationService, DomSurfaceInspector, DomTemplateProvider, WebContentProvider,
    WebTaskSpawner, WebTimerService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where window markup comes from in a browser deployment.
pub enum ContentStrategy {
    /// Fetched from the server, optionally against a base URL other than the page origin.
    Network {
        /// Prefix for endpoint URLs; empty means the page origin.
        base_url: String,
    },
    /// Read from `<template data-route>` elements embedded in the page.
    StaticTemplates,
}

impl Default for ContentStrategy {
    fn default() -> Self {
        Self::Network {
            base_url: String::new(),
        }
    }
}

impl ContentStrategy {
    /// Returns the strategy as a stable string token.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::StaticTemplates => "static-templates",
        }
    }

    fn provider(&self) -> Rc<dyn ContentProvider> {
        match self {
            Self::Network { base_url } if base_url.is_empty() => Rc::new(WebContentProvider::new()),
            Self::Network { base_url } => {
                Rc::new(WebContentProvider::with_base_url(base_url.clone()))
            }
            Self::StaticTemplates => Rc::new(DomTemplateProvider),
        }
    }
}

/// Assembles the browser host bundle for the window manager.
pub fn build_host_services(
    strategy: &ContentStrategy,
    initializer: Rc<dyn ContentInitializer>,
) -> WindowHostServices {
    WindowHostServices {
        content: strategy.provider(),
        initializer,
        surfaces: Rc::new(DomSurfaceInspector),
        notifications: Rc::new(ConsoleNotificationService),
        timers: Rc::new(WebTimerService::new()),
        clock: Rc::new(SystemClock),
        spawner: Rc::new(WebTaskSpawner),
    }
}
