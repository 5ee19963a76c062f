//! Window registry and lifecycle transitions: open admission, creation, in-place refresh,
//! focus, close and the maximize state machine.
//!
//! Everything here is synchronous. Operations mutate the registry and return
//! [`RuntimeEffect`]s; the window manager turns those into timers, host calls and events.

use std::collections::HashMap;

use futures::future::{LocalBoxFuture, Shared};
use leptos::logging;
use thiserror::Error;

use crate::{
    config::WindowManagerConfig,
    content::WindowSurface,
    geometry,
    model::{
        OpenOptions, ScrollOffset, ScrollState, TransitionKind, Viewport, WindowEvent, WindowId,
        WindowMode, WindowRecord, WindowRect,
    },
    tiling,
};

/// Future returned by `open`; resolves to the window id, or `None` when the open was skipped.
pub type OpenFuture = LocalBoxFuture<'static, Result<Option<WindowId>, WindowError>>;
/// Open future shared between coalesced callers of the same endpoint.
pub type SharedOpen = Shared<OpenFuture>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("maximum number of windows reached")]
    MaxWindowsReached,
    #[error("failed to fetch window content: {0}")]
    ContentFetchFailed(String),
    #[error("no window surface found in content for `{endpoint}`")]
    NoContentSurfaceFound { endpoint: String },
    #[error("window {0:?} not found")]
    WindowNotFound(WindowId),
}

/// DOM-side requests the window layer applies once a surface is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    FocusElement {
        window_id: WindowId,
        selector: String,
    },
    /// Re-apply `scroll` whenever the content resizes, for `within_ms`.
    RestoreScroll {
        window_id: WindowId,
        scroll: ScrollState,
        within_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEffect {
    SettleTransition {
        window_id: WindowId,
        token: u64,
        after_ms: u64,
    },
    RemoveSurface {
        window_id: WindowId,
        after_ms: u64,
    },
    InitializeContent {
        window_id: WindowId,
        endpoint: String,
        markup: String,
    },
    Surface(SurfaceCommand),
    Emit(WindowEvent),
}

/// Starts a transition on `record` and returns the effect that clears it.
pub(crate) fn transition_effect(
    record: &mut WindowRecord,
    kind: TransitionKind,
    config: &WindowManagerConfig,
) -> RuntimeEffect {
    let token = record.begin_transition(kind);
    RuntimeEffect::SettleTransition {
        window_id: record.id,
        token,
        after_ms: config.animation_duration_ms,
    }
}

/// Synchronous admission result of an open request.
pub enum OpenDecision {
    Rejected,
    AlreadyOpen {
        window_id: WindowId,
        effects: Vec<RuntimeEffect>,
    },
    Coalesced(SharedOpen),
    CoolingDown,
    /// Fetch content; `existed` records whether the endpoint was open at admission.
    Fetch { existed: bool },
}

pub struct WindowLifecycle {
    windows: HashMap<String, WindowRecord>,
    closing: Vec<WindowRecord>,
    pending: HashMap<String, SharedOpen>,
    last_open: HashMap<String, u64>,
    z_counter: u32,
    next_window_id: u64,
}

impl WindowLifecycle {
    pub fn new(config: &WindowManagerConfig) -> Self {
        Self {
            windows: HashMap::new(),
            closing: Vec::new(),
            pending: HashMap::new(),
            last_open: HashMap::new(),
            z_counter: config.z_index_base,
            next_window_id: 1,
        }
    }

    /// Open windows in creation order.
    pub fn windows(&self) -> Vec<&WindowRecord> {
        let mut windows: Vec<&WindowRecord> = self.windows.values().collect();
        windows.sort_by_key(|record| record.id);
        windows
    }

    pub fn windows_mut(&mut self) -> impl Iterator<Item = &mut WindowRecord> {
        self.windows.values_mut()
    }

    pub fn closing(&self) -> &[WindowRecord] {
        &self.closing
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn z_counter(&self) -> u32 {
        self.z_counter
    }

    pub fn by_endpoint(&self, endpoint: &str) -> Option<&WindowRecord> {
        self.windows.get(endpoint)
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.values().find(|record| record.id == id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Result<&mut WindowRecord, WindowError> {
        self.windows
            .values_mut()
            .find(|record| record.id == id)
            .ok_or(WindowError::WindowNotFound(id))
    }

    pub fn pending(&self, endpoint: &str) -> Option<SharedOpen> {
        self.pending.get(endpoint).cloned()
    }

    pub fn register_pending(&mut self, endpoint: &str, open: SharedOpen) {
        self.pending.insert(endpoint.to_string(), open);
    }

    pub fn clear_pending(&mut self, endpoint: &str) {
        self.pending.remove(endpoint);
    }

    /// Runs the synchronous admission checks of `open` in order: capacity, already open,
    /// coalescing, cooldown. An admitted request records its timestamp.
    pub fn begin_open(
        &mut self,
        endpoint: &str,
        options: &OpenOptions,
        now_ms: u64,
        config: &WindowManagerConfig,
    ) -> OpenDecision {
        let existing = self.windows.get(endpoint).map(|record| record.id);

        if existing.is_none() && self.windows.len() >= config.max_windows {
            return OpenDecision::Rejected;
        }

        if let Some(window_id) = existing.filter(|_| !options.force) {
            let effects = if options.activate {
                self.focus(window_id).unwrap_or_default()
            } else {
                Vec::new()
            };
            return OpenDecision::AlreadyOpen { window_id, effects };
        }

        if let Some(open) = self.pending.get(endpoint) {
            return OpenDecision::Coalesced(open.clone());
        }

        if !options.force {
            if let Some(last) = self.last_open.get(endpoint) {
                if now_ms.saturating_sub(*last) < config.cooldown_ms {
                    return OpenDecision::CoolingDown;
                }
            }
        }
        self.last_open.insert(endpoint.to_string(), now_ms);

        OpenDecision::Fetch {
            existed: existing.is_some(),
        }
    }

    /// Applies fetched `markup` for `endpoint`: refreshes the open window in place when forced,
    /// otherwise creates and places a new one.
    #[allow(clippy::too_many_arguments)]
    pub fn complete_open(
        &mut self,
        endpoint: &str,
        markup: &str,
        options: &OpenOptions,
        existed: bool,
        now_ms: u64,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> Result<(Option<WindowId>, Vec<RuntimeEffect>), WindowError> {
        if let Some(window_id) = self.windows.get(endpoint).map(|record| record.id) {
            if options.force {
                return self
                    .refresh_in_place(window_id, markup, options, config)
                    .map(|effects| (Some(window_id), effects));
            }
            let effects = if options.activate {
                self.focus(window_id)?
            } else {
                Vec::new()
            };
            return Ok((Some(window_id), effects));
        }

        if existed {
            logging::warn!("window for `{endpoint}` closed while its refresh was in flight");
            return Ok((None, Vec::new()));
        }

        if self.windows.len() >= config.max_windows {
            return Err(WindowError::MaxWindowsReached);
        }

        let surface =
            WindowSurface::parse(markup).ok_or_else(|| WindowError::NoContentSurfaceFound {
                endpoint: endpoint.to_string(),
            })?;
        let (window_id, mut effects) = self.insert_surface(endpoint, surface, now_ms, viewport, config);

        effects.push(RuntimeEffect::Emit(WindowEvent::Opened {
            window_id,
            endpoint: endpoint.to_string(),
        }));
        if options.activate {
            effects.extend(self.focus(window_id)?);
        }
        if let Some(selector) = options.focus_selector.clone() {
            effects.push(RuntimeEffect::Surface(SurfaceCommand::FocusElement {
                window_id,
                selector,
            }));
        }
        Ok((Some(window_id), effects))
    }

    fn insert_surface(
        &mut self,
        endpoint: &str,
        surface: WindowSurface,
        now_ms: u64,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> (WindowId, Vec<RuntimeEffect>) {
        let window_id = WindowId(self.next_window_id);
        self.next_window_id = self.next_window_id.saturating_add(1);

        let (width, height) = geometry::natural_size(&surface, config);
        let cascade_index = self.windows.len();
        let mut record = WindowRecord {
            id: window_id,
            endpoint: endpoint.to_string(),
            rect: WindowRect::new(0.0, 0.0, width, height),
            mode: WindowMode::Free,
            position_ratio: None,
            restore: None,
            z_index: self.z_counter,
            is_focused: false,
            busy: surface.busy,
            depends_on: surface.depends_on.clone(),
            transition: None,
            transition_epoch: 0,
            scroll: ScrollState::default(),
            cascade_index,
            opened_at_ms: now_ms,
            measured: false,
            surface,
        };

        match record.surface.default_snap {
            Some(snap) => {
                tiling::snap_window(&mut record, snap, config, config.work_area(viewport));
            }
            None => geometry::position_window(&mut record, cascade_index, viewport, config),
        }

        let mut effects = vec![transition_effect(&mut record, TransitionKind::Appearing, config)];
        effects.push(RuntimeEffect::InitializeContent {
            window_id,
            endpoint: endpoint.to_string(),
            markup: record.surface.markup.clone(),
        });
        self.windows.insert(endpoint.to_string(), record);
        (window_id, effects)
    }

    fn refresh_in_place(
        &mut self,
        window_id: WindowId,
        markup: &str,
        options: &OpenOptions,
        config: &WindowManagerConfig,
    ) -> Result<Vec<RuntimeEffect>, WindowError> {
        let record = self.get_mut(window_id)?;
        if record.busy && !options.activate {
            return Ok(Vec::new());
        }
        let Some(surface) = WindowSurface::parse(markup) else {
            logging::warn!(
                "refreshed content for `{}` has no window surface; keeping current content",
                record.endpoint
            );
            return Ok(Vec::new());
        };

        if record.mode.is_free() {
            if let Some(width) = surface.declared_width {
                record.rect.width = width;
            }
            if let Some(height) = surface.declared_height {
                record.rect.height = height;
            }
        }
        record.busy = surface.busy;
        record.depends_on = surface.depends_on.clone();
        record.surface = surface;

        let mut effects = vec![RuntimeEffect::InitializeContent {
            window_id,
            endpoint: record.endpoint.clone(),
            markup: record.surface.markup.clone(),
        }];
        if !record.scroll.is_empty() {
            effects.push(RuntimeEffect::Surface(SurfaceCommand::RestoreScroll {
                window_id,
                scroll: record.scroll.clone(),
                within_ms: config.scroll_restore_timeout_ms,
            }));
        }
        if options.activate {
            effects.extend(self.focus(window_id)?);
        }
        if let Some(selector) = options.focus_selector.clone() {
            effects.push(RuntimeEffect::Surface(SurfaceCommand::FocusElement {
                window_id,
                selector,
            }));
        }
        Ok(effects)
    }

    /// Raises the window above every other one and focuses it exclusively.
    pub fn focus(&mut self, window_id: WindowId) -> Result<Vec<RuntimeEffect>, WindowError> {
        if self.get(window_id).is_none() {
            return Err(WindowError::WindowNotFound(window_id));
        }
        self.z_counter = self.z_counter.saturating_add(1);
        let z_counter = self.z_counter;
        let mut endpoint = String::new();
        for record in self.windows.values_mut() {
            record.is_focused = record.id == window_id;
            if record.is_focused {
                record.z_index = z_counter;
                endpoint = record.endpoint.clone();
            }
        }
        Ok(vec![RuntimeEffect::Emit(WindowEvent::Focused {
            window_id,
            endpoint,
        })])
    }

    /// Unregisters the window immediately and keeps its surface for the exit transition.
    pub fn close(
        &mut self,
        window_id: WindowId,
        config: &WindowManagerConfig,
    ) -> Result<Vec<RuntimeEffect>, WindowError> {
        let endpoint = self
            .get(window_id)
            .map(|record| record.endpoint.clone())
            .ok_or(WindowError::WindowNotFound(window_id))?;
        let Some(mut record) = self.windows.remove(&endpoint) else {
            return Err(WindowError::WindowNotFound(window_id));
        };

        record.is_focused = false;
        record.begin_transition(TransitionKind::Disappearing);
        self.closing.push(record);

        Ok(vec![
            RuntimeEffect::RemoveSurface {
                window_id,
                after_ms: config.animation_duration_ms,
            },
            RuntimeEffect::Emit(WindowEvent::Closed {
                window_id,
                endpoint,
            }),
        ])
    }

    /// Drops a closed window's surface once its exit transition is over.
    pub fn finish_close(&mut self, window_id: WindowId) -> bool {
        let before = self.closing.len();
        self.closing.retain(|record| record.id != window_id);
        before != self.closing.len()
    }

    /// Closes the registered window with the highest z-index, if any.
    pub fn close_topmost(
        &mut self,
        config: &WindowManagerConfig,
    ) -> Option<Result<Vec<RuntimeEffect>, WindowError>> {
        let topmost = self
            .windows
            .values()
            .max_by_key(|record| record.z_index)
            .map(|record| record.id)?;
        Some(self.close(topmost, config))
    }

    pub fn toggle_maximize(
        &mut self,
        window_id: WindowId,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> Result<Vec<RuntimeEffect>, WindowError> {
        let record = self.get_mut(window_id)?;
        let work_area = config.work_area(viewport);

        match record.mode {
            WindowMode::Free => {
                geometry::capture_restore(record);
                record.mode = WindowMode::Maximized { from_tile: None };
                record.rect = tiling::maximized_rect(work_area);
            }
            WindowMode::Tiled(snap) => {
                record.position_ratio = None;
                record.mode = WindowMode::Maximized {
                    from_tile: Some(snap),
                };
                record.rect = tiling::maximized_rect(work_area);
            }
            WindowMode::Maximized {
                from_tile: Some(snap),
            } => {
                record.mode = WindowMode::Tiled(snap);
                record.rect = tiling::snap_layout(snap, config, work_area);
            }
            WindowMode::Maximized { from_tile: None } => {
                let (width, height) = geometry::restore_size(record, config);
                record.mode = WindowMode::Free;
                record.rect.width = width;
                record.rect.height = height;
                let anchor = record.restore.and_then(|snapshot| snapshot.anchor);
                if !geometry::reposition_from_ratio(record, anchor, viewport) {
                    geometry::center_in(record, viewport);
                }
                geometry::save_position_ratios(record, viewport);
            }
        }

        Ok(vec![transition_effect(
            record,
            TransitionKind::Toggling,
            config,
        )])
    }

    /// Clears a transition whose timer fired; stale tokens are ignored.
    pub fn settle_transition(&mut self, window_id: WindowId, token: u64) -> bool {
        self.windows
            .values_mut()
            .find(|record| record.id == window_id)
            .map(|record| record.settle_transition(token))
            .unwrap_or(false)
    }

    pub fn set_busy(&mut self, window_id: WindowId, busy: bool) -> Result<(), WindowError> {
        self.get_mut(window_id)?.busy = busy;
        Ok(())
    }

    pub fn report_scroll(
        &mut self,
        window_id: WindowId,
        path: &str,
        offset: ScrollOffset,
    ) -> Result<(), WindowError> {
        self.get_mut(window_id)?.scroll.record(path, offset);
        Ok(())
    }

    /// Adopts a rendered size reported shortly after first placement and re-runs cascade
    /// placement. Returns whether the record changed (first measurement or a new size).
    pub fn report_surface_size(
        &mut self,
        window_id: WindowId,
        width: f64,
        height: f64,
        now_ms: u64,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> Result<bool, WindowError> {
        let record = self.get_mut(window_id)?;
        let settling = now_ms.saturating_sub(record.opened_at_ms) < config.layout_stabilization_ms;
        if !settling || !record.mode.is_free() || record.surface.default_snap.is_some() {
            return Ok(false);
        }
        let first_measurement = !record.measured;
        record.measured = true;
        if record.rect.width == width && record.rect.height == height {
            return Ok(first_measurement);
        }
        record.rect.width = width;
        record.rect.height = height;
        let cascade_index = record.cascade_index;
        geometry::position_window(record, cascade_index, viewport, config);
        Ok(true)
    }

    /// Adopts a surface that is already rendered in the page. The z counter rises to the
    /// highest hydrated z-index.
    pub fn hydrate(
        &mut self,
        endpoint: &str,
        markup: &str,
        z_index: u32,
        now_ms: u64,
        viewport: Viewport,
        config: &WindowManagerConfig,
    ) -> Result<(WindowId, Vec<RuntimeEffect>), WindowError> {
        if let Some(record) = self.windows.get(endpoint) {
            return Ok((record.id, Vec::new()));
        }
        let surface =
            WindowSurface::parse(markup).ok_or_else(|| WindowError::NoContentSurfaceFound {
                endpoint: endpoint.to_string(),
            })?;
        let (window_id, mut effects) = self.insert_surface(endpoint, surface, now_ms, viewport, config);
        // Already visible; only content initialization applies.
        effects.retain(|effect| matches!(effect, RuntimeEffect::InitializeContent { .. }));
        if let Some(record) = self.windows.get_mut(endpoint) {
            record.transition = None;
            record.z_index = z_index;
        }
        self.z_counter = self.z_counter.max(z_index);
        Ok((window_id, effects))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{PositionRatio, SnapType};

    const MARKUP: &str = r#"<div nd-window class="window" style="width:400px;height:300px">body</div>"#;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    fn open(
        lifecycle: &mut WindowLifecycle,
        endpoint: &str,
        config: &WindowManagerConfig,
    ) -> WindowId {
        let options = OpenOptions::default();
        match lifecycle.begin_open(endpoint, &options, 0, config) {
            OpenDecision::Fetch { existed } => lifecycle
                .complete_open(endpoint, MARKUP, &options, existed, 0, viewport(), config)
                .expect("open succeeds")
                .0
                .expect("window created"),
            _ => panic!("expected a fetch decision"),
        }
    }

    #[test]
    fn create_places_focuses_and_emits_opened() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let options = OpenOptions::default();
        assert!(matches!(
            lifecycle.begin_open("team/5", &options, 0, &config),
            OpenDecision::Fetch { existed: false }
        ));
        let (id, effects) = lifecycle
            .complete_open("team/5", MARKUP, &options, false, 0, viewport(), &config)
            .expect("open succeeds");
        let id = id.expect("window created");

        let record = lifecycle.get(id).expect("registered");
        assert_eq!(record.rect, WindowRect::new(300.0, 250.0, 400.0, 300.0));
        assert_eq!(record.z_index, 41);
        assert!(record.is_focused);
        assert!(effects.contains(&RuntimeEffect::Emit(WindowEvent::Opened {
            window_id: id,
            endpoint: "team/5".to_string(),
        })));
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, RuntimeEffect::InitializeContent { .. })));
    }

    #[test]
    fn default_snap_content_opens_tiled() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let options = OpenOptions::default();
        let _ = lifecycle.begin_open("side", &options, 0, &config);
        let (id, _) = lifecycle
            .complete_open(
                "side",
                r#"<div nd-window data-default-snap="right"></div>"#,
                &options,
                false,
                0,
                viewport(),
                &config,
            )
            .expect("open succeeds");

        let record = lifecycle.get(id.expect("created")).expect("registered");
        assert_eq!(record.mode, WindowMode::Tiled(SnapType::Right));
        assert_eq!(record.position_ratio, None);
        assert_eq!(
            record.transition.map(|t| t.kind),
            Some(TransitionKind::Appearing)
        );
    }

    #[test]
    fn reopen_focuses_existing_window_without_fetching() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let first = open(&mut lifecycle, "a", &config);
        open(&mut lifecycle, "b", &config);

        match lifecycle.begin_open("a", &OpenOptions::default(), 10_000, &config) {
            OpenDecision::AlreadyOpen { window_id, effects } => {
                assert_eq!(window_id, first);
                assert_eq!(effects.len(), 1);
            }
            _ => panic!("expected already-open"),
        }
        let record = lifecycle.get(first).expect("registered");
        assert!(record.is_focused);
        assert_eq!(record.z_index, lifecycle.z_counter());
    }

    #[test]
    fn cooldown_blocks_quick_reopen_after_close() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        lifecycle.close(id, &config).expect("close");

        assert!(matches!(
            lifecycle.begin_open("a", &OpenOptions::default(), 100, &config),
            OpenDecision::CoolingDown
        ));
        assert!(matches!(
            lifecycle.begin_open("a", &OpenOptions::default(), 600, &config),
            OpenDecision::Fetch { existed: false }
        ));
    }

    #[test]
    fn capacity_rejects_new_endpoints_only() {
        let config = WindowManagerConfig {
            max_windows: 1,
            ..WindowManagerConfig::default()
        };
        let mut lifecycle = WindowLifecycle::new(&config);
        open(&mut lifecycle, "a", &config);

        assert!(matches!(
            lifecycle.begin_open("b", &OpenOptions::default(), 0, &config),
            OpenDecision::Rejected
        ));
        assert!(matches!(
            lifecycle.begin_open("a", &OpenOptions::default(), 0, &config),
            OpenDecision::AlreadyOpen { .. }
        ));
    }

    #[test]
    fn close_moves_window_to_closing_list() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);

        let effects = lifecycle.close(id, &config).expect("close");

        assert!(lifecycle.is_empty());
        assert_eq!(lifecycle.closing().len(), 1);
        assert_eq!(
            lifecycle.closing()[0].transition.map(|t| t.kind),
            Some(TransitionKind::Disappearing)
        );
        assert_eq!(
            effects[0],
            RuntimeEffect::RemoveSurface {
                window_id: id,
                after_ms: 400,
            }
        );
        assert!(lifecycle.finish_close(id));
        assert!(lifecycle.closing().is_empty());
        assert_eq!(
            lifecycle.close(id, &config),
            Err(WindowError::WindowNotFound(id))
        );
    }

    #[test]
    fn close_topmost_picks_highest_z_index() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let a = open(&mut lifecycle, "a", &config);
        let b = open(&mut lifecycle, "b", &config);
        lifecycle.focus(a).expect("focus");

        lifecycle.close_topmost(&config).expect("a window").expect("close");

        assert!(lifecycle.get(a).is_none());
        assert!(lifecycle.get(b).is_some());
    }

    #[test]
    fn maximize_round_trip_restores_size_and_reanchors_on_new_viewport() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);

        lifecycle
            .toggle_maximize(id, viewport(), &config)
            .expect("maximize");
        let maximized = lifecycle.get(id).expect("registered");
        assert_eq!(maximized.mode, WindowMode::Maximized { from_tile: None });
        assert_eq!(maximized.rect, WindowRect::new(0.0, 0.0, 1000.0, 736.0));
        assert_eq!(maximized.position_ratio, None);

        let wider = Viewport::new(1600.0, 900.0);
        lifecycle.toggle_maximize(id, wider, &config).expect("restore");
        let restored = lifecycle.get(id).expect("registered");
        assert_eq!(restored.mode, WindowMode::Free);
        assert_eq!(restored.rect, WindowRect::new(600.0, 300.0, 400.0, 300.0));
        assert_eq!(restored.position_ratio, Some(PositionRatio { x: 0.5, y: 0.5 }));
    }

    #[test]
    fn tile_maximize_unmaximize_returns_to_tile_on_current_viewport() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        {
            let record = lifecycle.get_mut(id).expect("registered");
            tiling::snap_window(record, SnapType::Left, &config, config.work_area(viewport()));
        }

        lifecycle
            .toggle_maximize(id, viewport(), &config)
            .expect("maximize");
        assert_eq!(
            lifecycle.get(id).map(|record| record.mode),
            Some(WindowMode::Maximized {
                from_tile: Some(SnapType::Left)
            })
        );

        let smaller = Viewport::new(800.0, 600.0);
        lifecycle.toggle_maximize(id, smaller, &config).expect("unmaximize");
        let record = lifecycle.get(id).expect("registered");
        assert_eq!(record.mode, WindowMode::Tiled(SnapType::Left));
        assert_eq!(
            record.rect,
            tiling::snap_layout(SnapType::Left, &config, config.work_area(smaller))
        );
        assert_eq!(record.position_ratio, None);
    }

    #[test]
    fn forced_refresh_keeps_mode_and_adopts_declared_size_when_free() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        lifecycle
            .report_scroll(id, ScrollState::ROOT, ScrollOffset { top: 80.0, left: 0.0 })
            .expect("scroll");
        let options = OpenOptions::background_refresh();

        assert!(matches!(
            lifecycle.begin_open("a", &options, 0, &config),
            OpenDecision::Fetch { existed: true }
        ));
        let (refreshed, effects) = lifecycle
            .complete_open(
                "a",
                r#"<div nd-window style="width:640px">new</div>"#,
                &options,
                true,
                0,
                viewport(),
                &config,
            )
            .expect("refresh");

        assert_eq!(refreshed, Some(id));
        let record = lifecycle.get(id).expect("registered");
        assert_eq!(record.surface.markup, "new");
        assert_eq!(record.rect.width, 640.0);
        assert_eq!(record.rect.height, 300.0);
        assert!(effects.iter().any(|effect| matches!(
            effect,
            RuntimeEffect::Surface(SurfaceCommand::RestoreScroll { within_ms: 2000, .. })
        )));
        assert!(!effects
            .iter()
            .any(|effect| matches!(effect, RuntimeEffect::Emit(WindowEvent::Focused { .. }))));
    }

    #[test]
    fn background_refresh_skips_busy_windows() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        lifecycle.set_busy(id, true).expect("busy");

        let (_, effects) = lifecycle
            .complete_open(
                "a",
                r#"<div nd-window>new</div>"#,
                &OpenOptions::background_refresh(),
                true,
                0,
                viewport(),
                &config,
            )
            .expect("refresh");

        assert!(effects.is_empty());
        assert_eq!(lifecycle.get(id).map(|r| r.surface.markup.as_str()), Some("body"));
    }

    #[test]
    fn refresh_of_a_window_closed_mid_fetch_does_not_resurrect_it() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        let options = OpenOptions::background_refresh();
        let _ = lifecycle.begin_open("a", &options, 0, &config);
        lifecycle.close(id, &config).expect("close");

        let outcome = lifecycle
            .complete_open("a", MARKUP, &options, true, 0, viewport(), &config)
            .expect("no error");

        assert_eq!(outcome, (None, Vec::new()));
        assert!(lifecycle.is_empty());
    }

    #[test]
    fn markup_without_surface_is_an_error() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        assert_eq!(
            lifecycle.complete_open(
                "x",
                "<p>nothing</p>",
                &OpenOptions::default(),
                false,
                0,
                viewport(),
                &config,
            ),
            Err(WindowError::NoContentSurfaceFound {
                endpoint: "x".to_string()
            })
        );
    }

    #[test]
    fn stabilization_replaces_cascade_for_early_size_reports_only() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);

        assert_eq!(
            lifecycle.report_surface_size(id, 600.0, 400.0, 100, viewport(), &config),
            Ok(true)
        );
        assert_eq!(
            lifecycle.get(id).map(|record| record.rect),
            Some(WindowRect::new(200.0, 200.0, 600.0, 400.0))
        );
        assert_eq!(
            lifecycle.report_surface_size(id, 700.0, 400.0, 1_000, viewport(), &config),
            Ok(false)
        );
    }

    #[test]
    fn first_size_report_marks_the_window_measured() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let id = open(&mut lifecycle, "a", &config);
        assert_eq!(lifecycle.get(id).map(|record| record.measured), Some(false));

        assert_eq!(
            lifecycle.report_surface_size(id, 400.0, 300.0, 50, viewport(), &config),
            Ok(true)
        );
        assert_eq!(lifecycle.get(id).map(|record| record.measured), Some(true));
        assert_eq!(
            lifecycle.report_surface_size(id, 400.0, 300.0, 60, viewport(), &config),
            Ok(false)
        );
    }

    #[test]
    fn capacity_is_checked_again_when_content_arrives() {
        let config = WindowManagerConfig {
            max_windows: 1,
            ..WindowManagerConfig::default()
        };
        let mut lifecycle = WindowLifecycle::new(&config);
        let options = OpenOptions::default();
        assert!(matches!(
            lifecycle.begin_open("a", &options, 0, &config),
            OpenDecision::Fetch { existed: false }
        ));
        assert!(matches!(
            lifecycle.begin_open("b", &options, 0, &config),
            OpenDecision::Fetch { existed: false }
        ));
        lifecycle
            .complete_open("a", MARKUP, &options, false, 0, viewport(), &config)
            .expect("first open fits");

        assert_eq!(
            lifecycle.complete_open("b", MARKUP, &options, false, 0, viewport(), &config),
            Err(WindowError::MaxWindowsReached)
        );
        assert_eq!(lifecycle.len(), 1);
        assert!(lifecycle.by_endpoint("b").is_none());
    }

    #[test]
    fn hydrate_raises_z_counter_to_highest_seen() {
        let config = WindowManagerConfig::default();
        let mut lifecycle = WindowLifecycle::new(&config);
        let (id, effects) = lifecycle
            .hydrate("a", MARKUP, 77, 0, viewport(), &config)
            .expect("hydrate");

        assert_eq!(effects.len(), 1);
        assert_eq!(lifecycle.z_counter(), 77);
        assert_eq!(lifecycle.get(id).map(|record| record.z_index), Some(77));
        let b = open(&mut lifecycle, "b", &config);
        assert_eq!(lifecycle.get(b).map(|record| record.z_index), Some(78));
    }
}
