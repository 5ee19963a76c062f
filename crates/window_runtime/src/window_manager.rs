//! Window manager facade: owns the lifecycle registry, the drag session and the snap indicator,
//! and executes [`RuntimeEffect`]s against the injected host services.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use futures::FutureExt;
use leptos::logging;
use window_host::{
    ContentRequest, NotificationLevel, TimerHandle, TimerService, WindowHostServices,
};

use crate::{
    config::WindowManagerConfig,
    drag::{self, DragSession},
    lifecycle::{OpenDecision, OpenFuture, RuntimeEffect, SurfaceCommand, WindowError, WindowLifecycle},
    model::{
        OpenOptions, PointerPosition, ScrollOffset, SnapType, SnapZone, Viewport, WindowEvent,
        WindowId, WindowRecord, WindowRect,
    },
    refresher::WindowProvider,
    tiling,
};

/// Preview of the area a drag release would snap into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapIndicator {
    pub visible: bool,
    pub rect: WindowRect,
}

impl Default for SnapIndicator {
    fn default() -> Self {
        Self {
            visible: false,
            rect: WindowRect::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// User input the window layer forwards to the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    OpenTrigger { endpoint: String },
    MaximizeControl { window_id: WindowId },
    CloseControl { window_id: WindowId },
    SurfacePointerDown { window_id: WindowId },
    TitleBarPointerDown { window_id: WindowId, pointer: PointerPosition },
    PointerMove { pointer: PointerPosition },
    PointerUp,
    KeyDown { key: String, repeat: bool },
    ViewportResized { viewport: Viewport },
}

type EventListener = Rc<dyn Fn(&WindowEvent)>;
type ChangeListener = Rc<dyn Fn()>;

struct ManagerState {
    lifecycle: WindowLifecycle,
    drag: Option<DragSession>,
    indicator: SnapIndicator,
    viewport: Viewport,
    resize_timer: Option<TimerHandle>,
    listeners: Vec<EventListener>,
    change_listeners: Vec<ChangeListener>,
    surface_commands: Vec<SurfaceCommand>,
}

#[derive(Clone)]
pub struct WindowManager {
    inner: Rc<RefCell<ManagerState>>,
    host: WindowHostServices,
    config: Rc<WindowManagerConfig>,
}

/// Non-owning handle held by timers and in-flight opens.
#[derive(Clone)]
struct WeakManager {
    inner: Weak<RefCell<ManagerState>>,
    host: WindowHostServices,
    config: Rc<WindowManagerConfig>,
}

impl WeakManager {
    fn upgrade(&self) -> Option<WindowManager> {
        Some(WindowManager {
            inner: self.inner.upgrade()?,
            host: self.host.clone(),
            config: self.config.clone(),
        })
    }
}

/// Removes the pending-open entry when the open task finishes or is dropped.
///
/// When the state is borrowed at drop time the removal is retried from a zero-delay timer.
struct PendingGuard {
    state: Weak<RefCell<ManagerState>>,
    timers: Rc<dyn TimerService>,
    endpoint: String,
}

impl PendingGuard {
    fn clear(state: &Weak<RefCell<ManagerState>>, endpoint: &str) -> bool {
        let Some(state) = state.upgrade() else {
            return true;
        };
        let Ok(mut state) = state.try_borrow_mut() else {
            return false;
        };
        state.lifecycle.clear_pending(endpoint);
        true
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if Self::clear(&self.state, &self.endpoint) {
            return;
        }
        logging::warn!(
            "pending open for `{}` released while the manager was busy; retrying",
            self.endpoint
        );
        let state = self.state.clone();
        let endpoint = std::mem::take(&mut self.endpoint);
        self.timers.schedule(
            0,
            Box::new(move || {
                if !PendingGuard::clear(&state, &endpoint) {
                    logging::error!("pending open for `{endpoint}` could not be released");
                }
            }),
        );
    }
}

async fn notify(host: &WindowHostServices, level: NotificationLevel, message: &str) {
    if let Err(err) = host.notifications.notify(level, message).await {
        logging::warn!("window notification delivery failed: {err}");
    }
}

fn log_failure(operation: &str, result: Result<(), WindowError>) {
    if let Err(err) = result {
        logging::warn!("window {operation} failed: {err}");
    }
}

fn indicator_for(
    snap: Option<SnapZone>,
    view: Viewport,
    config: &WindowManagerConfig,
) -> SnapIndicator {
    match snap {
        Some(SnapZone::Maximize) => SnapIndicator {
            visible: true,
            rect: tiling::maximized_rect(view),
        },
        Some(SnapZone::Tile(snap)) => SnapIndicator {
            visible: true,
            rect: tiling::snap_layout(snap, config, view),
        },
        None => SnapIndicator::default(),
    }
}

impl WindowManager {
    pub fn new(host: WindowHostServices, config: WindowManagerConfig, viewport: Viewport) -> Self {
        let state = ManagerState {
            lifecycle: WindowLifecycle::new(&config),
            drag: None,
            indicator: SnapIndicator::default(),
            viewport,
            resize_timer: None,
            listeners: Vec::new(),
            change_listeners: Vec::new(),
            surface_commands: Vec::new(),
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
            host,
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &WindowManagerConfig {
        &self.config
    }

    pub fn host(&self) -> &WindowHostServices {
        &self.host
    }

    fn downgrade(&self) -> WeakManager {
        WeakManager {
            inner: Rc::downgrade(&self.inner),
            host: self.host.clone(),
            config: self.config.clone(),
        }
    }

    /// Opens (or refreshes, with `force`) the window for `endpoint`.
    ///
    /// Admission runs before this returns: capacity, already-open, coalescing and cooldown.
    /// Concurrent calls for the same endpoint share one fetch.
    pub fn open(&self, endpoint: &str, options: OpenOptions) -> OpenFuture {
        let now_ms = self.host.clock.now_ms();
        let decision = self
            .inner
            .borrow_mut()
            .lifecycle
            .begin_open(endpoint, &options, now_ms, &self.config);

        match decision {
            OpenDecision::Rejected => {
                let host = self.host.clone();
                let message = self.config.max_windows_message.clone();
                async move {
                    notify(&host, NotificationLevel::Error, &message).await;
                    Err(WindowError::MaxWindowsReached)
                }
                .boxed_local()
            }
            OpenDecision::AlreadyOpen { window_id, effects } => {
                self.run_effects(effects);
                async move { Ok(Some(window_id)) }.boxed_local()
            }
            OpenDecision::Coalesced(open) => open.boxed_local(),
            OpenDecision::CoolingDown => async { Ok(None) }.boxed_local(),
            OpenDecision::Fetch { existed } => {
                let open = self
                    .fetch_and_place(endpoint.to_string(), options, existed)
                    .shared();
                self.inner
                    .borrow_mut()
                    .lifecycle
                    .register_pending(endpoint, open.clone());
                open.boxed_local()
            }
        }
    }

    fn fetch_and_place(&self, endpoint: String, options: OpenOptions, existed: bool) -> OpenFuture {
        let weak = self.downgrade();
        async move {
            let _pending = PendingGuard {
                state: weak.inner.clone(),
                timers: weak.host.timers.clone(),
                endpoint: endpoint.clone(),
            };
            let request = ContentRequest {
                force: options.force,
                activate: options.activate,
            };
            let fetched = weak.host.content.fetch(&endpoint, &request).await;
            let markup = match fetched {
                Ok(markup) => markup,
                Err(err) => {
                    logging::error!("window content for `{endpoint}` failed to load: {err}");
                    notify(
                        &weak.host,
                        NotificationLevel::Error,
                        &weak.config.open_failed_message,
                    )
                    .await;
                    return Err(WindowError::ContentFetchFailed(err));
                }
            };

            let Some(manager) = weak.upgrade() else {
                return Ok(None);
            };
            match manager.place_content(&endpoint, &markup, &options, existed) {
                Err(WindowError::MaxWindowsReached) => {
                    notify(
                        &weak.host,
                        NotificationLevel::Error,
                        &weak.config.max_windows_message,
                    )
                    .await;
                    Err(WindowError::MaxWindowsReached)
                }
                Err(err) => {
                    logging::error!("window `{endpoint}` could not be opened: {err}");
                    Err(err)
                }
                Ok(window_id) => Ok(window_id),
            }
        }
        .boxed_local()
    }

    fn place_content(
        &self,
        endpoint: &str,
        markup: &str,
        options: &OpenOptions,
        existed: bool,
    ) -> Result<Option<WindowId>, WindowError> {
        let now_ms = self.host.clock.now_ms();
        let live_busy = self.live_busy(endpoint, options);
        let (window_id, effects) = {
            let mut state = self.inner.borrow_mut();
            if let Some((window_id, busy)) = live_busy {
                state.lifecycle.set_busy(window_id, busy)?;
            }
            let viewport = state.viewport;
            state.lifecycle.complete_open(
                endpoint,
                markup,
                options,
                existed,
                now_ms,
                viewport,
                &self.config,
            )?
        };
        self.run_effects(effects);
        Ok(window_id)
    }

    /// Busy state of the rendered surface behind a silent refresh of `endpoint`, when the host
    /// can inspect it.
    fn live_busy(&self, endpoint: &str, options: &OpenOptions) -> Option<(WindowId, bool)> {
        if !options.force || options.activate {
            return None;
        }
        let window_id = self.inner.borrow().lifecycle.by_endpoint(endpoint)?.id;
        let busy = self.host.surfaces.is_busy(window_id.0)?;
        Some((window_id, busy))
    }

    /// Applies effects in render order: timers and surface commands, change notification,
    /// content initialization, then lifecycle events.
    fn run_effects(&self, effects: Vec<RuntimeEffect>) {
        let mut initializations = Vec::new();
        let mut events = Vec::new();

        for effect in effects {
            match effect {
                RuntimeEffect::SettleTransition {
                    window_id,
                    token,
                    after_ms,
                } => {
                    let weak = self.downgrade();
                    self.host.timers.schedule(
                        after_ms,
                        Box::new(move || {
                            let Some(manager) = weak.upgrade() else {
                                return;
                            };
                            let settled = manager
                                .inner
                                .borrow_mut()
                                .lifecycle
                                .settle_transition(window_id, token);
                            if settled {
                                manager.notify_changed();
                            }
                        }),
                    );
                }
                RuntimeEffect::RemoveSurface {
                    window_id,
                    after_ms,
                } => {
                    let weak = self.downgrade();
                    self.host.timers.schedule(
                        after_ms,
                        Box::new(move || {
                            let Some(manager) = weak.upgrade() else {
                                return;
                            };
                            let removed = manager.inner.borrow_mut().lifecycle.finish_close(window_id);
                            if removed {
                                manager.notify_changed();
                            }
                        }),
                    );
                }
                RuntimeEffect::InitializeContent {
                    window_id,
                    endpoint,
                    markup,
                } => initializations.push((window_id, endpoint, markup)),
                RuntimeEffect::Surface(command) => {
                    self.inner.borrow_mut().surface_commands.push(command);
                }
                RuntimeEffect::Emit(event) => events.push(event),
            }
        }

        self.notify_changed();

        for (window_id, endpoint, markup) in initializations {
            self.host.initializer.initialize(window_id.0, &endpoint, &markup);
        }
        if !events.is_empty() {
            let listeners = self.inner.borrow().listeners.clone();
            for event in &events {
                for listener in &listeners {
                    listener(event);
                }
            }
        }
    }

    fn notify_changed(&self) {
        let listeners = self.inner.borrow().change_listeners.clone();
        for listener in listeners {
            listener();
        }
    }

    pub fn close(&self, window_id: WindowId) -> Result<(), WindowError> {
        let effects = self
            .inner
            .borrow_mut()
            .lifecycle
            .close(window_id, &self.config)?;
        self.run_effects(effects);
        Ok(())
    }

    /// Closes the topmost window; returns its id, or `None` when nothing is open.
    pub fn close_topmost(&self) -> Result<Option<WindowId>, WindowError> {
        let closed = {
            let mut state = self.inner.borrow_mut();
            let topmost = state
                .lifecycle
                .windows()
                .into_iter()
                .max_by_key(|record| record.z_index)
                .map(|record| record.id);
            match state.lifecycle.close_topmost(&self.config) {
                Some(effects) => Some((topmost, effects?)),
                None => None,
            }
        };
        match closed {
            Some((window_id, effects)) => {
                self.run_effects(effects);
                Ok(window_id)
            }
            None => Ok(None),
        }
    }

    pub fn focus(&self, window_id: WindowId) -> Result<(), WindowError> {
        let effects = self.inner.borrow_mut().lifecycle.focus(window_id)?;
        self.run_effects(effects);
        Ok(())
    }

    pub fn toggle_maximize(&self, window_id: WindowId) -> Result<(), WindowError> {
        let effects = {
            let mut state = self.inner.borrow_mut();
            let viewport = state.viewport;
            state
                .lifecycle
                .toggle_maximize(window_id, viewport, &self.config)?
        };
        self.run_effects(effects);
        Ok(())
    }

    /// Tiles the window into `snap` on the current work area.
    pub fn snap(&self, window_id: WindowId, snap: SnapType) -> Result<(), WindowError> {
        let effect = {
            let mut state = self.inner.borrow_mut();
            let work_area = self.config.work_area(state.viewport);
            let record = state.lifecycle.get_mut(window_id)?;
            tiling::snap_window(record, snap, &self.config, work_area)
        };
        self.run_effects(vec![effect]);
        Ok(())
    }

    /// Starts a drag session. Ignored while another session is active.
    pub fn drag(&self, window_id: WindowId, pointer: PointerPosition) -> Result<(), WindowError> {
        let mut state = self.inner.borrow_mut();
        if state.drag.is_some() {
            return Ok(());
        }
        let viewport = state.viewport;
        let record = state
            .lifecycle
            .get(window_id)
            .ok_or(WindowError::WindowNotFound(window_id))?;
        let session = DragSession::begin(record, pointer, viewport, &self.config);
        state.drag = Some(session);
        Ok(())
    }

    pub fn drag_move(&self, pointer: PointerPosition) {
        let effects = {
            let mut guard = self.inner.borrow_mut();
            let state = &mut *guard;
            let Some(session) = state.drag.as_mut() else {
                return;
            };
            let Ok(record) = state.lifecycle.get_mut(session.window_id) else {
                state.drag = None;
                state.indicator = SnapIndicator::default();
                return;
            };
            let step = session.update(record, pointer, state.viewport, &self.config);
            if !session.dragging {
                return;
            }
            if step.snap_changed {
                state.indicator = indicator_for(session.snap, session.view, &self.config);
            }
            step.effects
        };
        self.run_effects(effects);
    }

    /// Ends the drag session: maximize, tile, or persist the free position.
    pub fn drag_end(&self) {
        let session = {
            let mut state = self.inner.borrow_mut();
            state.indicator = SnapIndicator::default();
            state.drag.take()
        };
        let Some(session) = session else {
            return;
        };
        let window_id = session.window_id;
        let result = match session.finish() {
            Some(SnapZone::Maximize) => self.toggle_maximize(window_id),
            Some(SnapZone::Tile(snap)) => self.snap(window_id, snap),
            None => {
                {
                    let mut state = self.inner.borrow_mut();
                    let viewport = state.viewport;
                    if let Ok(record) = state.lifecycle.get_mut(window_id) {
                        drag::settle_free_position(record, viewport);
                    }
                }
                self.notify_changed();
                Ok(())
            }
        };
        log_failure("drag release", result);
    }

    /// Adapts all windows to `viewport` immediately.
    pub fn handle_viewport_resize(&self, viewport: Viewport) {
        {
            let mut state = self.inner.borrow_mut();
            state.viewport = viewport;
            state.resize_timer = None;
            tiling::handle_viewport_resize(state.lifecycle.windows_mut(), &self.config, viewport);
        }
        self.notify_changed();
    }

    /// Debounced [`Self::handle_viewport_resize`]; each call restarts the delay.
    pub fn schedule_viewport_resize(&self, viewport: Viewport) {
        let previous = self.inner.borrow_mut().resize_timer.take();
        if let Some(handle) = previous {
            self.host.timers.cancel(handle);
        }
        let weak = self.downgrade();
        let handle = self.host.timers.schedule(
            self.config.resize_debounce_ms,
            Box::new(move || {
                if let Some(manager) = weak.upgrade() {
                    manager.handle_viewport_resize(viewport);
                }
            }),
        );
        self.inner.borrow_mut().resize_timer = Some(handle);
    }

    pub fn handle_input(&self, event: InputEvent) {
        match event {
            InputEvent::OpenTrigger { endpoint } => {
                let open = self.open(&endpoint, OpenOptions::default());
                self.host.spawner.spawn(Box::pin(async move {
                    match open.await {
                        Ok(_) | Err(WindowError::MaxWindowsReached) => {}
                        Err(err) => logging::warn!("opening `{endpoint}` failed: {err}"),
                    }
                }));
            }
            InputEvent::MaximizeControl { window_id } => {
                log_failure("maximize", self.toggle_maximize(window_id));
            }
            InputEvent::CloseControl { window_id } => log_failure("close", self.close(window_id)),
            InputEvent::SurfacePointerDown { window_id } => {
                log_failure("focus", self.focus(window_id));
            }
            InputEvent::TitleBarPointerDown { window_id, pointer } => {
                log_failure("focus", self.focus(window_id));
                log_failure("drag", self.drag(window_id, pointer));
            }
            InputEvent::PointerMove { pointer } => self.drag_move(pointer),
            InputEvent::PointerUp => self.drag_end(),
            InputEvent::KeyDown { key, repeat } => {
                if key == "Escape" && !repeat {
                    if let Err(err) = self.close_topmost() {
                        logging::warn!("closing topmost window failed: {err}");
                    }
                }
            }
            InputEvent::ViewportResized { viewport } => self.schedule_viewport_resize(viewport),
        }
    }

    /// Adopts a window already rendered in the page.
    pub fn hydrate(
        &self,
        endpoint: &str,
        markup: &str,
        z_index: u32,
    ) -> Result<WindowId, WindowError> {
        let now_ms = self.host.clock.now_ms();
        let (window_id, effects) = {
            let mut state = self.inner.borrow_mut();
            let viewport = state.viewport;
            state
                .lifecycle
                .hydrate(endpoint, markup, z_index, now_ms, viewport, &self.config)?
        };
        self.run_effects(effects);
        Ok(window_id)
    }

    pub fn set_busy(&self, window_id: WindowId, busy: bool) -> Result<(), WindowError> {
        self.inner.borrow_mut().lifecycle.set_busy(window_id, busy)
    }

    pub fn report_scroll(
        &self,
        window_id: WindowId,
        path: &str,
        offset: ScrollOffset,
    ) -> Result<(), WindowError> {
        self.inner
            .borrow_mut()
            .lifecycle
            .report_scroll(window_id, path, offset)
    }

    /// Feeds a rendered size back for layout stabilization.
    pub fn report_surface_size(
        &self,
        window_id: WindowId,
        width: f64,
        height: f64,
    ) -> Result<(), WindowError> {
        let now_ms = self.host.clock.now_ms();
        let moved = {
            let mut state = self.inner.borrow_mut();
            let viewport = state.viewport;
            state.lifecycle.report_surface_size(
                window_id,
                width,
                height,
                now_ms,
                viewport,
                &self.config,
            )?
        };
        if moved {
            self.notify_changed();
        }
        Ok(())
    }

    /// Open windows as `(endpoint, record)` pairs in creation order.
    pub fn get_windows(&self) -> Vec<(String, WindowRecord)> {
        self.inner
            .borrow()
            .lifecycle
            .windows()
            .into_iter()
            .map(|record| (record.endpoint.clone(), record.clone()))
            .collect()
    }

    pub fn window(&self, window_id: WindowId) -> Option<WindowRecord> {
        self.inner.borrow().lifecycle.get(window_id).cloned()
    }

    /// Windows whose exit transition is still running.
    pub fn closing_windows(&self) -> Vec<WindowRecord> {
        self.inner.borrow().lifecycle.closing().to_vec()
    }

    pub fn snap_indicator(&self) -> SnapIndicator {
        self.inner.borrow().indicator
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.inner
            .borrow()
            .drag
            .as_ref()
            .map(|session| session.dragging)
            .unwrap_or(false)
    }

    /// Registers a lifecycle event listener (`Opened`, `Closed`, `Focused`).
    pub fn subscribe(&self, listener: impl Fn(&WindowEvent) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    /// Registers a callback invoked after every state change that affects rendering.
    pub fn subscribe_changes(&self, listener: impl Fn() + 'static) {
        self.inner
            .borrow_mut()
            .change_listeners
            .push(Rc::new(listener));
    }

    /// Drains DOM-side commands queued for the window layer.
    pub fn take_surface_commands(&self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.inner.borrow_mut().surface_commands)
    }
}

impl WindowProvider for WindowManager {
    fn get_windows(&self) -> Vec<(String, WindowRecord)> {
        WindowManager::get_windows(self)
    }

    fn open(&self, endpoint: &str, options: OpenOptions) -> OpenFuture {
        WindowManager::open(self, endpoint, options)
    }

    fn close(&self, window_id: WindowId) -> Result<(), WindowError> {
        WindowManager::close(self, window_id)
    }
}
