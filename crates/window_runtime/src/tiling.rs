//! Snap-zone detection and quadrant/half-screen layout.

use crate::{
    config::WindowManagerConfig,
    geometry,
    lifecycle::{transition_effect, RuntimeEffect},
    model::{SnapType, SnapZone, TransitionKind, Viewport, WindowMode, WindowRecord, WindowRect},
};

/// Resolves the zone under the pointer in `view`; the first matching edge wins, in the order
/// top, left, right, bottom.
pub fn detect_snap_zone(
    config: &WindowManagerConfig,
    x: f64,
    y: f64,
    view: Viewport,
) -> Option<SnapZone> {
    let threshold = config.snap_threshold;
    let zone_w = view.width * config.edge_detection_ratio;
    let zone_h = view.height * config.edge_detection_ratio;

    if y < threshold {
        if x < zone_w {
            Some(SnapZone::Tile(SnapType::TopLeft))
        } else if x > view.width - zone_w {
            Some(SnapZone::Tile(SnapType::TopRight))
        } else {
            Some(SnapZone::Maximize)
        }
    } else if x < threshold {
        if y < zone_h {
            Some(SnapZone::Tile(SnapType::TopLeft))
        } else if y > view.height - zone_h {
            Some(SnapZone::Tile(SnapType::BottomLeft))
        } else {
            Some(SnapZone::Tile(SnapType::Left))
        }
    } else if x > view.width - threshold {
        if y < zone_h {
            Some(SnapZone::Tile(SnapType::TopRight))
        } else if y > view.height - zone_h {
            Some(SnapZone::Tile(SnapType::BottomRight))
        } else {
            Some(SnapZone::Tile(SnapType::Right))
        }
    } else if y > view.height - threshold {
        if x < view.width / 2.0 {
            Some(SnapZone::Tile(SnapType::BottomLeft))
        } else {
            Some(SnapZone::Tile(SnapType::BottomRight))
        }
    } else {
        None
    }
}

pub fn snap_layout(snap: SnapType, config: &WindowManagerConfig, view: Viewport) -> WindowRect {
    let gap = config.snap_gap;
    let half_w = (view.width - gap * 3.0) / 2.0;
    let half_h = (view.height - gap * 3.0) / 2.0;
    let full_h = view.height - gap * 2.0;
    let left_x = gap;
    let right_x = half_w + gap * 2.0;
    let top_y = gap;
    let bottom_y = half_h + gap * 2.0;

    match snap {
        SnapType::TopLeft => WindowRect::new(left_x, top_y, half_w, half_h),
        SnapType::TopRight => WindowRect::new(right_x, top_y, half_w, half_h),
        SnapType::BottomLeft => WindowRect::new(left_x, bottom_y, half_w, half_h),
        SnapType::BottomRight => WindowRect::new(right_x, bottom_y, half_w, half_h),
        SnapType::Left => WindowRect::new(left_x, top_y, half_w, full_h),
        SnapType::Right => WindowRect::new(right_x, top_y, half_w, full_h),
    }
}

pub fn maximized_rect(work_area: Viewport) -> WindowRect {
    WindowRect::new(0.0, 0.0, work_area.width, work_area.height)
}

/// Tiles the window into `snap` within `view`, capturing the restore snapshot when leaving `Free`.
pub fn snap_window(
    record: &mut WindowRecord,
    snap: SnapType,
    config: &WindowManagerConfig,
    view: Viewport,
) -> RuntimeEffect {
    if record.mode.is_free() {
        geometry::capture_restore(record);
    }
    record.position_ratio = None;
    record.mode = WindowMode::Tiled(snap);
    record.rect = snap_layout(snap, config, view);
    transition_effect(record, TransitionKind::Toggling, config)
}

/// Returns a tiled or maximized window to `Free` at its restore size; the caller positions it.
pub fn restore_from_tile_or_maximize(
    record: &mut WindowRecord,
    config: &WindowManagerConfig,
    viewport: Viewport,
) -> RuntimeEffect {
    let (width, height) = geometry::restore_size(record, config);
    record.mode = WindowMode::Free;
    record.rect.width = width;
    record.rect.height = height;
    geometry::save_position_ratios(record, viewport);
    transition_effect(record, TransitionKind::DraggingRestore, config)
}

/// Adapts every window to a new viewport: tiles are laid out again on the work area, free
/// windows re-center from their ratio, maximized windows fill the work area.
pub fn handle_viewport_resize<'a>(
    windows: impl IntoIterator<Item = &'a mut WindowRecord>,
    config: &WindowManagerConfig,
    viewport: Viewport,
) {
    let work_area = config.work_area(viewport);
    for record in windows {
        match record.mode {
            WindowMode::Tiled(snap) => record.rect = snap_layout(snap, config, work_area),
            WindowMode::Maximized { .. } => record.rect = maximized_rect(work_area),
            WindowMode::Free => {
                let ratio = record.position_ratio;
                geometry::reposition_from_ratio(record, ratio, viewport);
            }
        }
    }
}
