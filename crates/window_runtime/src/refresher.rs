//! Change-notification driven window refresh and dependency closure.
//!
//! Events are named `"category:action"`. A `deleted` action closes every window that declares a
//! dependency on the deleted entity; any event refreshes windows whose endpoint matches one of
//! the patterns configured for it.

use std::rc::Rc;

use leptos::logging;
use serde::{Deserialize, Serialize};
use window_host::{TaskSpawner, TimerService};

use crate::{
    config::RefresherConfig,
    lifecycle::{OpenFuture, WindowError},
    model::{OpenOptions, WindowId, WindowRecord},
    router::{match_route, normalize_path},
};

const DESTRUCTIVE_ACTION: &str = "deleted";

/// Window operations the refresher drives.
pub trait WindowProvider {
    fn get_windows(&self) -> Vec<(String, WindowRecord)>;
    fn open(&self, endpoint: &str, options: OpenOptions) -> OpenFuture;
    fn close(&self, window_id: WindowId) -> Result<(), WindowError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub id: Option<String>,
}

impl EventPayload {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }
}

/// Windows an event closes and endpoints it refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshPlan {
    pub closes: Vec<WindowId>,
    pub refreshes: Vec<String>,
}

impl RefreshPlan {
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty() && self.refreshes.is_empty()
    }
}

pub struct WindowRefresher {
    provider: Rc<dyn WindowProvider>,
    config: RefresherConfig,
    timers: Rc<dyn TimerService>,
    spawner: Rc<dyn TaskSpawner>,
}

impl WindowRefresher {
    pub fn new(
        provider: Rc<dyn WindowProvider>,
        config: RefresherConfig,
        timers: Rc<dyn TimerService>,
        spawner: Rc<dyn TaskSpawner>,
    ) -> Self {
        Self {
            provider,
            config,
            timers,
            spawner,
        }
    }

    pub fn set_refresh_map(&mut self, refresh_map: std::collections::BTreeMap<String, Vec<String>>) {
        self.config.refresh_map = refresh_map;
    }

    pub fn config(&self) -> &RefresherConfig {
        &self.config
    }

    /// Decides which open windows `event_name` closes or refreshes.
    pub fn plan_event(&self, event_name: &str, payload: &EventPayload) -> RefreshPlan {
        let (category, action) = event_name.split_once(':').unwrap_or((event_name, ""));
        let destructive = action == DESTRUCTIVE_ACTION;
        let entity_id = payload.id.as_deref().filter(|id| !id.is_empty());
        let patterns = self
            .config
            .refresh_map
            .get(event_name)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut plan = RefreshPlan::default();
        for (endpoint, record) in self.provider.get_windows() {
            if destructive {
                if let Some(id) = entity_id {
                    let depends = record
                        .depends_on
                        .iter()
                        .any(|dependency| dependency.category == category && dependency.id == id);
                    if depends {
                        plan.closes.push(record.id);
                        continue;
                    }
                }
            }

            let path = normalize_path(&endpoint);
            let route_id = if destructive { None } else { entity_id };
            if patterns
                .iter()
                .any(|pattern| match_route(pattern, &path, route_id))
            {
                plan.refreshes.push(endpoint);
            }
        }
        plan
    }

    /// Schedules the closes and silent refreshes for `event_name` after the refresh delay.
    pub fn handle_event(&self, event_name: &str, payload: &EventPayload) -> RefreshPlan {
        let plan = self.plan_event(event_name, payload);
        let delay = self.config.refresh_timeout_ms;

        for window_id in plan.closes.iter().copied() {
            let provider = self.provider.clone();
            self.timers.schedule(
                delay,
                Box::new(move || {
                    // Already closed by the user is fine.
                    if let Err(err) = provider.close(window_id) {
                        logging::log!("dependency close skipped: {err}");
                    }
                }),
            );
        }

        for endpoint in plan.refreshes.iter().cloned() {
            let provider = self.provider.clone();
            let spawner = self.spawner.clone();
            self.timers.schedule(
                delay,
                Box::new(move || {
                    let refresh = provider.open(&endpoint, OpenOptions::background_refresh());
                    spawner.spawn(Box::pin(async move {
                        if let Err(err) = refresh.await {
                            logging::warn!("silent refresh of `{endpoint}` failed: {err}");
                        }
                    }));
                }),
            );
        }
        plan
    }
}
