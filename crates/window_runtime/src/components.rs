//! Leptos bindings that render window frames and forward DOM input to the [`WindowManager`].

use leptos::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

use crate::{
    lifecycle::SurfaceCommand,
    model::{PointerPosition, Viewport, WindowId, WindowMode, WindowRecord, WindowRect},
    window_manager::{InputEvent, WindowManager},
};

/// Reactive handle to the window manager provided by [`WindowManagerProvider`].
#[derive(Clone, Copy)]
pub struct WindowManagerContext {
    pub manager: StoredValue<WindowManager>,
    /// Bumped after every manager state change.
    pub revision: RwSignal<u64>,
}

impl WindowManagerContext {
    pub fn dispatch(&self, event: InputEvent) {
        self.manager.get_value().handle_input(event);
    }

    /// Ids of open and closing windows, tracked by the revision signal.
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.revision.track();
        let manager = self.manager.get_value();
        let mut ids: Vec<WindowId> = manager
            .get_windows()
            .into_iter()
            .map(|(_, record)| record.id)
            .chain(manager.closing_windows().into_iter().map(|record| record.id))
            .collect();
        ids.sort();
        ids
    }

    pub fn record(&self, window_id: WindowId) -> Option<WindowRecord> {
        self.revision.track();
        let manager = self.manager.get_value();
        manager.window(window_id).or_else(|| {
            manager
                .closing_windows()
                .into_iter()
                .find(|record| record.id == window_id)
        })
    }
}

pub fn use_window_manager() -> WindowManagerContext {
    use_context::<WindowManagerContext>().expect("WindowManagerContext not provided")
}

fn pointer_from_pointer_event(ev: &web_sys::PointerEvent) -> PointerPosition {
    PointerPosition::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

#[cfg(target_arch = "wasm32")]
fn current_viewport() -> Viewport {
    let Some(window) = web_sys::window() else {
        return Viewport::default();
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1024.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(768.0);
    Viewport::new(width, height)
}

#[cfg(not(target_arch = "wasm32"))]
fn current_viewport() -> Viewport {
    Viewport::default()
}

#[cfg(target_arch = "wasm32")]
fn try_set_pointer_capture(ev: &web_sys::PointerEvent) {
    if let Some(target) = ev.current_target() {
        if let Ok(element) = target.dyn_into::<web_sys::Element>() {
            let _ = element.set_pointer_capture(ev.pointer_id());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn try_set_pointer_capture(_: &web_sys::PointerEvent) {}

#[cfg(target_arch = "wasm32")]
fn window_element(window_id: WindowId) -> Option<web_sys::Element> {
    web_sys::window()?
        .document()?
        .query_selector(&format!("[data-window-id=\"{}\"] [nd-window-content]", window_id.0))
        .ok()
        .flatten()
}

#[cfg(target_arch = "wasm32")]
fn apply_scroll(root: &web_sys::Element, scroll: &crate::model::ScrollState) {
    for (path, offset) in &scroll.0 {
        let element = if path == crate::model::ScrollState::ROOT {
            Some(root.clone())
        } else {
            root.query_selector(path).ok().flatten()
        };
        if let Some(element) = element {
            element.set_scroll_top(offset.top as i32);
            element.set_scroll_left(offset.left as i32);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn apply_surface_command(command: SurfaceCommand) {
    request_animation_frame(move || apply_surface_command_now(command));
}

#[cfg(target_arch = "wasm32")]
fn apply_surface_command_now(command: SurfaceCommand) {
    use wasm_bindgen::closure::Closure;

    match command {
        SurfaceCommand::FocusElement {
            window_id,
            selector,
        } => {
            let Some(root) = window_element(window_id) else {
                return;
            };
            let Some(element) = root.query_selector(&selector).ok().flatten() else {
                return;
            };
            if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
                if matches!(input.type_().as_str(), "radio" | "checkbox") {
                    input.set_checked(true);
                }
            }
            if let Ok(element) = element.dyn_into::<web_sys::HtmlElement>() {
                let _ = element.focus();
            }
        }
        SurfaceCommand::RestoreScroll {
            window_id,
            scroll,
            within_ms,
        } => {
            let Some(root) = window_element(window_id) else {
                return;
            };
            apply_scroll(&root, &scroll);

            let observed = root.clone();
            let callback = Closure::<dyn FnMut()>::new(move || apply_scroll(&observed, &scroll));
            let Ok(observer) = web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref())
            else {
                return;
            };
            observer.observe(&root);
            set_timeout(
                move || {
                    observer.disconnect();
                    drop(callback);
                },
                std::time::Duration::from_millis(within_ms),
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn apply_surface_command(_: SurfaceCommand) {}

/// Feeds the frame's rendered size to the manager until layout stabilization ends.
#[cfg(target_arch = "wasm32")]
fn observe_initial_size(context: WindowManagerContext, window_id: WindowId) {
    use wasm_bindgen::closure::Closure;

    let Some(within_ms) = context
        .manager
        .try_get_value()
        .map(|manager| manager.config().layout_stabilization_ms)
    else {
        return;
    };
    request_animation_frame(move || {
        let Some(frame) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| {
                document
                    .query_selector(&format!("[data-window-id=\"{}\"]", window_id.0))
                    .ok()
                    .flatten()
            })
            .and_then(|frame| frame.dyn_into::<web_sys::HtmlElement>().ok())
        else {
            return;
        };

        let observed = frame.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            let (width, height) = (observed.offset_width(), observed.offset_height());
            if width <= 0 || height <= 0 {
                return;
            }
            let Some(manager) = context.manager.try_get_value() else {
                return;
            };
            if let Err(err) =
                manager.report_surface_size(window_id, f64::from(width), f64::from(height))
            {
                logging::warn!("surface size report dropped: {err}");
            }
        });
        let Ok(observer) = web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) else {
            return;
        };
        observer.observe(&frame);
        set_timeout(
            move || {
                observer.disconnect();
                drop(callback);
            },
            std::time::Duration::from_millis(within_ms),
        );
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn observe_initial_size(_: WindowManagerContext, _: WindowId) {}

#[cfg(target_arch = "wasm32")]
fn report_scroll_offset(context: WindowManagerContext, window_id: WindowId, ev: &web_sys::Event) {
    let Some(element) = ev
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
    else {
        return;
    };
    let offset = crate::model::ScrollOffset {
        top: f64::from(element.scroll_top()),
        left: f64::from(element.scroll_left()),
    };
    if let Err(err) = context
        .manager
        .get_value()
        .report_scroll(window_id, crate::model::ScrollState::ROOT, offset)
    {
        logging::warn!("scroll report dropped: {err}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn report_scroll_offset(_: WindowManagerContext, _: WindowId, _: &web_sys::Event) {}

fn rect_style(rect: WindowRect) -> String {
    format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;",
        rect.left, rect.top, rect.width, rect.height
    )
}

/// Frame geometry. A free window with no declared dimension renders that dimension at its
/// natural size until a measurement arrives.
fn frame_style(record: &WindowRecord) -> String {
    let natural = record.mode.is_free() && !record.measured;
    let rect = record.rect;
    let mut style = format!("left:{}px;top:{}px;", rect.left, rect.top);
    if !(natural && record.surface.declared_width.is_none()) {
        style.push_str(&format!("width:{}px;", rect.width));
    }
    if !(natural && record.surface.declared_height.is_none()) {
        style.push_str(&format!("height:{}px;", rect.height));
    }
    style.push_str(&format!("z-index:{};", record.z_index));
    style
}

fn frame_class(record: &WindowRecord) -> String {
    let mut class = String::from("window nd-window");
    if let Some(extra) = &record.surface.class_name {
        class.push(' ');
        class.push_str(extra);
    }
    if record.is_focused {
        class.push_str(" focused");
    }
    match record.mode {
        WindowMode::Free => {}
        WindowMode::Tiled(snap) => {
            class.push_str(" tiled snap-");
            class.push_str(snap.as_str());
        }
        WindowMode::Maximized { .. } => class.push_str(" maximized"),
    }
    if let Some(transition) = record.transition {
        class.push(' ');
        class.push_str(transition.kind.css_class());
    }
    class
}

/// Provides [`WindowManagerContext`] and binds document-level keyboard, pointer and resize
/// events to the manager.
#[component]
pub fn WindowManagerProvider(manager: WindowManager, children: Children) -> impl IntoView {
    let revision = create_rw_signal(0_u64);
    manager.subscribe_changes(move || revision.update(|value| *value = value.wrapping_add(1)));
    manager.handle_viewport_resize(current_viewport());

    let context = WindowManagerContext {
        manager: store_value(manager),
        revision,
    };
    provide_context(context);

    let keydown_listener = window_event_listener(ev::keydown, move |ev| {
        if ev.default_prevented() {
            return;
        }
        context.dispatch(InputEvent::KeyDown {
            key: ev.key(),
            repeat: ev.repeat(),
        });
    });
    on_cleanup(move || keydown_listener.remove());

    let pointer_move_listener = window_event_listener(ev::pointermove, move |ev| {
        context.dispatch(InputEvent::PointerMove {
            pointer: pointer_from_pointer_event(&ev),
        });
    });
    on_cleanup(move || pointer_move_listener.remove());

    let pointer_up_listener = window_event_listener(ev::pointerup, move |_| {
        context.dispatch(InputEvent::PointerUp);
    });
    on_cleanup(move || pointer_up_listener.remove());

    let resize_listener = window_event_listener(ev::resize, move |_| {
        context.dispatch(InputEvent::ViewportResized {
            viewport: current_viewport(),
        });
    });
    on_cleanup(move || resize_listener.remove());

    children()
}

/// Renders every open or closing window and the snap indicator.
#[component]
pub fn WindowLayer() -> impl IntoView {
    let context = use_window_manager();

    create_effect(move |_| {
        context.revision.track();
        for command in context.manager.get_value().take_surface_commands() {
            apply_surface_command(command);
        }
    });

    view! {
        <div class="nd-window-layer">
            <For
                each=move || context.window_ids()
                key=|window_id| *window_id
                children=move |window_id| view! { <WindowFrame window_id=window_id /> }
            />
            <SnapIndicatorView />
        </div>
    }
}

#[component]
fn WindowFrame(window_id: WindowId) -> impl IntoView {
    let context = use_window_manager();
    let record = create_memo(move |_| context.record(window_id));
    let markup = create_memo(move |_| {
        record
            .get()
            .map(|record| record.surface.markup)
            .unwrap_or_default()
    });
    let style = move || record.get().map(|record| frame_style(&record)).unwrap_or_default();
    let class = move || record.get().map(|record| frame_class(&record)).unwrap_or_default();
    let maximized = move || {
        record
            .get()
            .map(|record| record.mode.is_maximized())
            .unwrap_or(false)
    };

    let focus = move |_: web_sys::PointerEvent| {
        let should_focus = record
            .get_untracked()
            .map(|record| !record.is_focused)
            .unwrap_or(false);
        if should_focus {
            context.dispatch(InputEvent::SurfacePointerDown { window_id });
        }
    };
    let begin_drag = move |ev: web_sys::PointerEvent| {
        if ev.pointer_type() == "mouse" && ev.button() != 0 {
            return;
        }
        if ev.pointer_type() != "mouse" && !ev.is_primary() {
            return;
        }
        try_set_pointer_capture(&ev);
        ev.prevent_default();
        ev.stop_propagation();
        context.dispatch(InputEvent::TitleBarPointerDown {
            window_id,
            pointer: pointer_from_pointer_event(&ev),
        });
    };
    let on_scroll = move |ev: web_sys::Event| report_scroll_offset(context, window_id, &ev);
    let stop_pointer = move |ev: web_sys::PointerEvent| {
        ev.prevent_default();
        ev.stop_propagation();
    };
    observe_initial_size(context, window_id);

    view! {
        <section
            class=class
            style=style
            data-window-id=window_id.0.to_string()
            role="dialog"
            on:pointerdown=focus
        >
            <header
                class="nd-window-header"
                on:pointerdown=begin_drag
                on:dblclick=move |_| context.dispatch(InputEvent::MaximizeControl { window_id })
            >
                <button
                    class="nd-window-button"
                    data-maximize="true"
                    aria-label=move || if maximized() { "Restore window" } else { "Maximize window" }
                    on:pointerdown=stop_pointer
                    on:click=move |_| context.dispatch(InputEvent::MaximizeControl { window_id })
                >
                    {move || if maximized() { "\u{2750}" } else { "\u{25A1}" }}
                </button>
                <button
                    class="nd-window-button"
                    data-close="true"
                    aria-label="Close window"
                    on:pointerdown=stop_pointer
                    on:click=move |_| context.dispatch(InputEvent::CloseControl { window_id })
                >
                    "\u{2715}"
                </button>
            </header>
            <div nd-window-content="" class="nd-window-content" on:scroll=on_scroll inner_html=move || markup.get()></div>
        </section>
    }
}

#[component]
fn SnapIndicatorView() -> impl IntoView {
    let context = use_window_manager();
    let indicator = create_memo(move |_| {
        context.revision.track();
        context.manager.get_value().snap_indicator()
    });

    view! {
        <div
            class=move || {
                if indicator.get().visible { "snap-indicator visible" } else { "snap-indicator" }
            }
            style=move || rect_style(indicator.get().rect)
        ></div>
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        content::WindowSurface,
        model::{ScrollState, SnapType, TransitionKind, WindowTransition},
    };

    #[test]
    fn frame_class_reflects_mode_focus_and_transition() {
        let mut record = WindowRecord {
            id: WindowId(3),
            endpoint: "team/5".to_string(),
            surface: WindowSurface {
                class_name: Some("teams".to_string()),
                ..WindowSurface::default()
            },
            rect: WindowRect::new(6.0, 6.0, 491.0, 724.0),
            mode: WindowMode::Tiled(SnapType::Left),
            position_ratio: None,
            restore: None,
            z_index: 44,
            is_focused: true,
            busy: false,
            depends_on: Vec::new(),
            transition: Some(WindowTransition {
                kind: TransitionKind::Toggling,
                token: 1,
            }),
            transition_epoch: 1,
            scroll: ScrollState::default(),
            cascade_index: 0,
            opened_at_ms: 0,
            measured: false,
        };

        assert_eq!(
            frame_class(&record),
            "window nd-window teams focused tiled snap-left nd-toggling"
        );

        record.mode = WindowMode::Maximized { from_tile: None };
        record.transition = None;
        record.is_focused = false;
        assert_eq!(frame_class(&record), "window nd-window teams maximized");
    }

    #[test]
    fn unmeasured_frames_keep_their_natural_size() {
        let rect = WindowRect::new(100.0, 100.0, 800.0, 600.0);
        let mut record = crate::geometry::tests::record(rect);
        record.z_index = 7;
        assert_eq!(frame_style(&record), "left:100px;top:100px;z-index:7;");

        record.surface.declared_width = Some(420.0);
        assert_eq!(
            frame_style(&record),
            "left:100px;top:100px;width:800px;z-index:7;"
        );

        record.measured = true;
        assert_eq!(
            frame_style(&record),
            "left:100px;top:100px;width:800px;height:600px;z-index:7;"
        );

        record.measured = false;
        record.mode = WindowMode::Maximized { from_tile: None };
        assert_eq!(
            frame_style(&record),
            "left:100px;top:100px;width:800px;height:600px;z-index:7;"
        );
    }

    #[test]
    fn rect_style_renders_pixel_geometry() {
        assert_eq!(
            rect_style(WindowRect::new(10.0, 20.5, 300.0, 200.0)),
            "left:10px;top:20.5px;width:300px;height:200px;"
        );
    }
}
