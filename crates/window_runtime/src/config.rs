//! Runtime tunables for the window manager and the refresher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowManagerConfig {
    pub z_index_base: u32,
    /// Window after first placement during which reported size changes re-run cascade placement.
    pub layout_stabilization_ms: u64,
    pub cascade_offset: f64,
    pub cooldown_ms: u64,
    pub max_windows: usize,
    pub snap_gap: f64,
    pub taskbar_height: f64,
    pub snap_threshold: f64,
    pub drag_threshold: f64,
    pub resize_debounce_ms: u64,
    pub animation_duration_ms: u64,
    pub default_width: f64,
    pub default_height: f64,
    pub min_margin: f64,
    /// Share of the view edge, measured from each corner, treated as a corner wedge.
    pub edge_detection_ratio: f64,
    pub scroll_restore_timeout_ms: u64,
    pub open_failed_message: String,
    pub max_windows_message: String,
}

impl Default for WindowManagerConfig {
    fn default() -> Self {
        Self {
            z_index_base: 40,
            layout_stabilization_ms: 450,
            cascade_offset: 30.0,
            cooldown_ms: 500,
            max_windows: 10,
            snap_gap: 6.0,
            taskbar_height: 64.0,
            snap_threshold: 30.0,
            drag_threshold: 10.0,
            resize_debounce_ms: 6,
            animation_duration_ms: 400,
            default_width: 800.0,
            default_height: 600.0,
            min_margin: 10.0,
            edge_detection_ratio: 0.4,
            scroll_restore_timeout_ms: 2000,
            open_failed_message: "Failed to open window.".to_string(),
            max_windows_message: "Max windows reached".to_string(),
        }
    }
}

impl WindowManagerConfig {
    /// Parses a partial JSON object; absent keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn work_area(&self, viewport: Viewport) -> Viewport {
        viewport.work_area(self.taskbar_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefresherConfig {
    /// `"category:action"` event name to the endpoint patterns it refreshes.
    pub refresh_map: BTreeMap<String, Vec<String>>,
    #[serde(alias = "refreshTimeout")]
    pub refresh_timeout_ms: u64,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            refresh_map: BTreeMap::new(),
            refresh_timeout_ms: 200,
        }
    }
}

impl RefresherConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = WindowManagerConfig::from_json(r#"{"maxWindows":3,"snapGap":8}"#)
            .expect("config parses");
        assert_eq!(config.max_windows, 3);
        assert_eq!(config.snap_gap, 8.0);
        assert_eq!(config.cooldown_ms, 500);
        assert_eq!(config.max_windows_message, "Max windows reached");
    }

    #[test]
    fn refresher_config_accepts_legacy_timeout_key() {
        let config = RefresherConfig::from_json(
            r#"{"refreshMap":{"team:updated":["teams/{id}"]},"refreshTimeout":50}"#,
        )
        .expect("config parses");
        assert_eq!(config.refresh_timeout_ms, 50);
        assert_eq!(
            config.refresh_map.get("team:updated"),
            Some(&vec!["teams/{id}".to_string()])
        );
    }

    #[test]
    fn work_area_subtracts_taskbar() {
        let config = WindowManagerConfig::default();
        assert_eq!(
            config.work_area(Viewport::new(1000.0, 800.0)),
            Viewport::new(1000.0, 736.0)
        );
    }
}
