//! Event-driven drag sessions: threshold gating, restore-on-drag and snap-zone tracking.

use crate::{
    config::WindowManagerConfig,
    geometry,
    lifecycle::RuntimeEffect,
    model::{PointerPosition, SnapZone, Viewport, WindowId, WindowMode, WindowRecord},
    tiling,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub window_id: WindowId,
    pub start: PointerPosition,
    pub current: PointerPosition,
    pub start_left: f64,
    pub start_top: f64,
    pub initial_mode: WindowMode,
    pub restored: bool,
    /// Horizontal grab point as a fraction of window width, kept across a restore.
    pub restore_x_ratio: Option<f64>,
    pub dragging: bool,
    /// Snap detection area: full width, viewport height minus the taskbar.
    pub view: Viewport,
    pub snap: Option<SnapZone>,
}

/// Outcome of one pointer-move step.
#[derive(Debug, Default, PartialEq)]
pub struct DragStep {
    pub effects: Vec<RuntimeEffect>,
    /// `true` when the hovered snap zone differs from the previous step.
    pub snap_changed: bool,
}

impl DragSession {
    pub fn begin(
        record: &WindowRecord,
        pointer: PointerPosition,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> Self {
        Self {
            window_id: record.id,
            start: pointer,
            current: pointer,
            start_left: record.rect.left,
            start_top: record.rect.top,
            initial_mode: record.mode,
            restored: false,
            restore_x_ratio: None,
            dragging: false,
            view: config.work_area(viewport),
            snap: None,
        }
    }

    /// Moves the dragged window for a new pointer position.
    pub fn update(
        &mut self,
        record: &mut WindowRecord,
        pointer: PointerPosition,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> DragStep {
        let mut step = DragStep::default();
        self.current = pointer;
        let delta_x = pointer.x - self.start.x;
        let delta_y = pointer.y - self.start.y;

        if !self.dragging
            && (delta_x.abs() > config.drag_threshold || delta_y.abs() > config.drag_threshold)
        {
            self.dragging = true;
        }
        if !self.dragging {
            return step;
        }

        if !self.initial_mode.is_free() && !self.restored {
            if self.initial_mode.is_maximized() {
                self.restore_x_ratio = Some(if viewport.width > 0.0 {
                    self.start.x / viewport.width
                } else {
                    0.5
                });
                self.start_top = 0.0;
            } else {
                self.restore_x_ratio = Some(if record.rect.width > 0.0 {
                    (self.start.x - record.rect.left) / record.rect.width
                } else {
                    0.5
                });
                self.start_top = record.rect.top;
            }
            step.effects.push(tiling::restore_from_tile_or_maximize(
                record, config, viewport,
            ));
            self.start = pointer;
            self.restored = true;
        }

        let (left, top) = match (self.restored, self.restore_x_ratio) {
            (true, Some(ratio)) => (
                pointer.x - ratio * record.rect.width,
                (self.start_top + (pointer.y - self.start.y)).max(0.0),
            ),
            (true, None) => (
                self.start_left + (pointer.x - self.start.x),
                (self.start_top + (pointer.y - self.start.y)).max(0.0),
            ),
            (false, _) => (self.start_left + delta_x, (self.start_top + delta_y).max(0.0)),
        };
        record.rect.left = left;
        record.rect.top = top;

        let snap = tiling::detect_snap_zone(config, pointer.x, pointer.y, self.view);
        if snap != self.snap {
            self.snap = snap;
            step.snap_changed = true;
        }
        step
    }

    /// Ends the session; returns the snap zone to apply when the window was actually dragged.
    pub fn finish(self) -> Option<SnapZone> {
        self.dragging.then_some(self.snap).flatten()
    }
}

/// Applies a drag release without a snap zone: persists the free position ratio.
pub fn settle_free_position(record: &mut WindowRecord, viewport: Viewport) {
    geometry::save_position_ratios(record, viewport);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        geometry::tests::record,
        model::{SnapType, WindowRect},
    };

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    #[test]
    fn movement_within_threshold_is_ignored() {
        let config = WindowManagerConfig::default();
        let mut win = record(WindowRect::new(100.0, 100.0, 400.0, 300.0));
        let mut session =
            DragSession::begin(&win, PointerPosition::new(200.0, 110.0), viewport(), &config);

        let step = session.update(&mut win, PointerPosition::new(208.0, 118.0), viewport(), &config);

        assert_eq!(step, DragStep::default());
        assert_eq!((win.rect.left, win.rect.top), (100.0, 100.0));
        assert_eq!(session.finish(), None);
    }

    #[test]
    fn free_drag_follows_pointer_and_clamps_top() {
        let config = WindowManagerConfig::default();
        let mut win = record(WindowRect::new(100.0, 20.0, 400.0, 300.0));
        let mut session =
            DragSession::begin(&win, PointerPosition::new(200.0, 40.0), viewport(), &config);

        session.update(&mut win, PointerPosition::new(260.0, 0.0), viewport(), &config);

        assert_eq!((win.rect.left, win.rect.top), (160.0, 0.0));
    }

    #[test]
    fn dragging_a_maximized_window_restores_under_the_pointer() {
        let config = WindowManagerConfig::default();
        let mut win = record(WindowRect::new(0.0, 0.0, 1000.0, 736.0));
        win.mode = WindowMode::Maximized { from_tile: None };
        win.restore = Some(crate::model::RestoreSnapshot {
            geometry: crate::model::WindowGeometry {
                width: Some(400.0),
                height: Some(300.0),
                left: None,
                top: None,
            },
            anchor: None,
        });
        let mut session =
            DragSession::begin(&win, PointerPosition::new(250.0, 10.0), viewport(), &config);

        let step = session.update(&mut win, PointerPosition::new(250.0, 60.0), viewport(), &config);

        assert_eq!(step.effects.len(), 1);
        assert_eq!(win.mode, WindowMode::Free);
        assert_eq!(session.restore_x_ratio, Some(0.25));
        assert_eq!((win.rect.left, win.rect.top), (150.0, 0.0));

        session.update(&mut win, PointerPosition::new(300.0, 160.0), viewport(), &config);
        assert_eq!((win.rect.left, win.rect.top), (200.0, 100.0));
    }

    #[test]
    fn dragging_a_tile_keeps_the_grab_point_and_tile_top() {
        let config = WindowManagerConfig::default();
        let mut win = record(WindowRect::new(300.0, 250.0, 400.0, 300.0));
        tiling::snap_window(&mut win, SnapType::Right, &config, config.work_area(viewport()));
        let tile = win.rect;
        let grab = PointerPosition::new(tile.left + tile.width / 2.0, tile.top + 10.0);
        let mut session = DragSession::begin(&win, grab, viewport(), &config);

        session.update(
            &mut win,
            PointerPosition::new(grab.x, grab.y + 20.0),
            viewport(),
            &config,
        );

        assert_eq!(session.restore_x_ratio, Some(0.5));
        assert_eq!(win.rect.width, 400.0);
        assert_eq!(win.rect.left, grab.x - 200.0);
        assert_eq!(win.rect.top, tile.top);
    }

    #[test]
    fn dragging_a_maximized_tile_restores_the_size_before_tiling() {
        let config = WindowManagerConfig::default();
        let work_area = config.work_area(viewport());
        let mut win = record(WindowRect::new(300.0, 250.0, 400.0, 300.0));
        tiling::snap_window(&mut win, SnapType::Left, &config, work_area);
        win.mode = WindowMode::Maximized {
            from_tile: Some(SnapType::Left),
        };
        win.rect = tiling::maximized_rect(work_area);
        let mut session =
            DragSession::begin(&win, PointerPosition::new(500.0, 10.0), viewport(), &config);

        let step = session.update(&mut win, PointerPosition::new(500.0, 60.0), viewport(), &config);

        assert_eq!(step.effects.len(), 1);
        assert_eq!(win.mode, WindowMode::Free);
        assert_eq!((win.rect.width, win.rect.height), (400.0, 300.0));
        assert_eq!((win.rect.left, win.rect.top), (300.0, 0.0));
    }

    #[test]
    fn snap_zone_changes_are_reported_once() {
        let config = WindowManagerConfig::default();
        let mut win = record(WindowRect::new(100.0, 100.0, 400.0, 300.0));
        let mut session =
            DragSession::begin(&win, PointerPosition::new(500.0, 200.0), viewport(), &config);

        let first = session.update(&mut win, PointerPosition::new(500.0, 5.0), viewport(), &config);
        let second = session.update(&mut win, PointerPosition::new(510.0, 5.0), viewport(), &config);

        assert!(first.snap_changed);
        assert!(!second.snap_changed);
        assert_eq!(session.finish(), Some(SnapZone::Maximize));
    }
}
