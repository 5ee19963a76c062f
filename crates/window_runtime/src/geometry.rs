//! Geometry bookkeeping for window records: restore snapshots, cascade placement and
//! viewport-relative position ratios.

use crate::{
    config::WindowManagerConfig,
    content::WindowSurface,
    model::{PositionRatio, RestoreSnapshot, Viewport, WindowGeometry, WindowRecord},
};

/// Current geometry of a record, optionally including its position.
pub fn capture(record: &WindowRecord, include_position: bool) -> WindowGeometry {
    WindowGeometry {
        width: Some(record.rect.width),
        height: Some(record.rect.height),
        left: include_position.then_some(record.rect.left),
        top: include_position.then_some(record.rect.top),
    }
}

/// Stores a restore snapshot of the current geometry, replacing any previous one.
pub fn save_restore(record: &mut WindowRecord, include_position: bool) -> RestoreSnapshot {
    let snapshot = RestoreSnapshot {
        geometry: capture(record, include_position),
        anchor: record.position_ratio,
    };
    record.restore = Some(snapshot);
    snapshot
}

pub fn read_restore(record: &WindowRecord) -> Option<RestoreSnapshot> {
    record.restore
}

/// Applies the set fields of `geometry`; unset fields keep the current values.
pub fn apply_geometry(record: &mut WindowRecord, geometry: WindowGeometry) {
    if let Some(width) = geometry.width {
        record.rect.width = width;
    }
    if let Some(height) = geometry.height {
        record.rect.height = height;
    }
    if let Some(left) = geometry.left {
        record.rect.left = left;
    }
    if let Some(top) = geometry.top {
        record.rect.top = top;
    }
}

/// Returns the existing snapshot when it carries a full size, otherwise captures one.
pub fn ensure_restore_state(record: &mut WindowRecord) -> RestoreSnapshot {
    match record.restore {
        Some(snapshot) if snapshot.geometry.width.is_some() && snapshot.geometry.height.is_some() => {
            snapshot
        }
        _ => save_restore(record, false),
    }
}

/// Captures the restore snapshot before leaving `Free`; the position ratio moves into it.
/// The window's geometry is explicit from here on, measured or not.
pub fn capture_restore(record: &mut WindowRecord) -> RestoreSnapshot {
    record.measured = true;
    let mut snapshot = save_restore(record, false);
    if let Some(ratio) = record.position_ratio.take() {
        snapshot.anchor = Some(ratio);
        record.restore = Some(snapshot);
    }
    snapshot
}

/// Size restored when leaving a tile or maximize: the snapshot, else configured defaults.
pub fn restore_size(record: &WindowRecord, config: &WindowManagerConfig) -> (f64, f64) {
    let geometry = record.restore.map(|snapshot| snapshot.geometry).unwrap_or_default();
    (
        geometry.width.filter(|w| *w > 0.0).unwrap_or(config.default_width),
        geometry.height.filter(|h| *h > 0.0).unwrap_or(config.default_height),
    )
}

/// Size a freshly created surface takes: its declared size, else configured defaults.
pub fn natural_size(surface: &WindowSurface, config: &WindowManagerConfig) -> (f64, f64) {
    (
        surface
            .declared_width
            .filter(|w| *w > 0.0)
            .unwrap_or(config.default_width),
        surface
            .declared_height
            .filter(|h| *h > 0.0)
            .unwrap_or(config.default_height),
    )
}

/// Centers the window offset by `cascade_index` steps, pulled back inside the viewport on overflow.
pub fn position_window(
    record: &mut WindowRecord,
    cascade_index: usize,
    viewport: Viewport,
    config: &WindowManagerConfig,
) {
    let width = record.rect.width;
    let height = record.rect.height;
    let cascade = cascade_index as f64 * config.cascade_offset;

    let mut left = (viewport.width - width) / 2.0 + cascade;
    let mut top = (viewport.height - height) / 2.0 + cascade;
    if left + width > viewport.width {
        left = config.min_margin.max(viewport.width - width - config.min_margin);
    }
    if top + height > viewport.height {
        top = config.min_margin.max(viewport.height - height - config.min_margin);
    }

    record.rect.left = left.round();
    record.rect.top = top.round();
    save_position_ratios(record, viewport);
}

/// Records the window center as viewport fractions. Tiled and maximized windows keep `None`.
pub fn save_position_ratios(record: &mut WindowRecord, viewport: Viewport) {
    if !record.mode.is_free() || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return;
    }
    let (center_x, center_y) = record.rect.center();
    record.position_ratio = Some(PositionRatio {
        x: center_x / viewport.width,
        y: center_y / viewport.height,
    });
}

/// Re-centers the window on `ratio` of `viewport`. Returns `false` when there is no ratio.
pub fn reposition_from_ratio(
    record: &mut WindowRecord,
    ratio: Option<PositionRatio>,
    viewport: Viewport,
) -> bool {
    let Some(ratio) = ratio.filter(|r| r.x.is_finite() && r.y.is_finite()) else {
        return false;
    };
    let center_x = ratio.x * viewport.width;
    let center_y = ratio.y * viewport.height;
    record.rect.left = (center_x - record.rect.width / 2.0).round();
    record.rect.top = (center_y - record.rect.height / 2.0).round();
    true
}

pub fn center_in(record: &mut WindowRecord, viewport: Viewport) {
    record.rect.left = ((viewport.width - record.rect.width) / 2.0).round();
    record.rect.top = ((viewport.height - record.rect.height) / 2.0).round();
}

/// Parses the leading number of a CSS length such as `"640px"`, taking the longest numeric
/// prefix (`"1.2.3px"` is `1.2`).
pub fn parse_css_pixel_value(value: &str) -> Option<f64> {
    let value = value.trim();
    let candidate = value
        .find(|ch: char| !(ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(value.len());
    (1..=candidate)
        .rev()
        .find_map(|len| value[..len].parse::<f64>().ok())
        .filter(|px| px.is_finite())
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ScrollState, WindowId, WindowMode, WindowRect};

    pub(crate) fn record(rect: WindowRect) -> WindowRecord {
        WindowRecord {
            id: WindowId(1),
            endpoint: "team/5".to_string(),
            surface: WindowSurface::default(),
            rect,
            mode: WindowMode::Free,
            position_ratio: None,
            restore: None,
            z_index: 41,
            is_focused: true,
            busy: false,
            depends_on: Vec::new(),
            transition: None,
            transition_epoch: 0,
            scroll: ScrollState::default(),
            cascade_index: 0,
            opened_at_ms: 0,
            measured: false,
        }
    }

    #[test]
    fn cascade_placement_centers_then_offsets() {
        let config = WindowManagerConfig::default();
        let viewport = Viewport::new(1000.0, 800.0);
        let mut first = record(WindowRect::new(0.0, 0.0, 400.0, 300.0));
        position_window(&mut first, 0, viewport, &config);
        assert_eq!(first.rect, WindowRect::new(300.0, 250.0, 400.0, 300.0));
        assert_eq!(first.position_ratio, Some(PositionRatio { x: 0.5, y: 0.5 }));

        let mut third = record(WindowRect::new(0.0, 0.0, 400.0, 300.0));
        position_window(&mut third, 2, viewport, &config);
        assert_eq!((third.rect.left, third.rect.top), (360.0, 310.0));
    }

    #[test]
    fn cascade_overflow_is_pulled_back_inside_the_margin() {
        let config = WindowManagerConfig::default();
        let mut wide = record(WindowRect::new(0.0, 0.0, 900.0, 300.0));
        position_window(&mut wide, 4, Viewport::new(1000.0, 800.0), &config);
        assert_eq!(wide.rect.left, 90.0);

        let mut huge = record(WindowRect::new(0.0, 0.0, 1200.0, 300.0));
        position_window(&mut huge, 0, Viewport::new(1000.0, 800.0), &config);
        assert_eq!(huge.rect.left, 10.0);
    }

    #[test]
    fn ratios_are_not_saved_for_tiled_windows() {
        let mut tiled = record(WindowRect::new(0.0, 0.0, 400.0, 300.0));
        tiled.mode = WindowMode::Tiled(crate::model::SnapType::Left);
        save_position_ratios(&mut tiled, Viewport::new(1000.0, 800.0));
        assert_eq!(tiled.position_ratio, None);
    }

    #[test]
    fn capture_restore_moves_ratio_into_snapshot() {
        let mut free = record(WindowRect::new(300.0, 250.0, 400.0, 300.0));
        save_position_ratios(&mut free, Viewport::new(1000.0, 800.0));
        let snapshot = capture_restore(&mut free);

        assert_eq!(free.position_ratio, None);
        assert_eq!(snapshot.anchor, Some(PositionRatio { x: 0.5, y: 0.5 }));
        assert_eq!(
            snapshot.geometry,
            WindowGeometry {
                width: Some(400.0),
                height: Some(300.0),
                left: None,
                top: None,
            }
        );
    }

    #[test]
    fn restore_size_falls_back_to_defaults() {
        let config = WindowManagerConfig::default();
        let free = record(WindowRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(restore_size(&free, &config), (800.0, 600.0));
    }

    #[test]
    fn reposition_from_ratio_recenters_on_new_viewport() {
        let mut free = record(WindowRect::new(0.0, 0.0, 400.0, 300.0));
        assert!(reposition_from_ratio(
            &mut free,
            Some(PositionRatio { x: 0.5, y: 0.5 }),
            Viewport::new(1600.0, 900.0),
        ));
        assert_eq!((free.rect.left, free.rect.top), (600.0, 300.0));
        assert!(!reposition_from_ratio(&mut free, None, Viewport::new(1.0, 1.0)));
    }

    #[test]
    fn css_pixel_values_parse_leading_numbers() {
        assert_eq!(parse_css_pixel_value("640px"), Some(640.0));
        assert_eq!(parse_css_pixel_value(" 12.5px "), Some(12.5));
        assert_eq!(parse_css_pixel_value("auto"), None);
        assert_eq!(parse_css_pixel_value(""), None);
    }

    #[test]
    fn css_values_use_the_longest_numeric_prefix() {
        assert_eq!(parse_css_pixel_value("1.2.3px"), Some(1.2));
        assert_eq!(parse_css_pixel_value("-40px"), Some(-40.0));
        assert_eq!(parse_css_pixel_value("1e3px"), Some(1000.0));
        assert_eq!(parse_css_pixel_value("-px"), None);
    }
}
