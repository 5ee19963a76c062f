//! `setTimeout`-backed timer service.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use window_host::{TimerHandle, TimerService, TimerTask};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[derive(Default)]
struct TimerState {
    next_handle: u64,
    /// `setTimeout` ids of timers that have not fired yet.
    pending: HashMap<TimerHandle, i32>,
}

#[derive(Clone, Default)]
/// Browser timer service.
///
/// Off the browser there is no event loop: tasks are dropped on `schedule` and never tracked.
pub struct WebTimerService {
    state: Rc<RefCell<TimerState>>,
}

impl WebTimerService {
    /// Creates an empty timer service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers scheduled but not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl TimerService for WebTimerService {
    fn schedule(&self, delay_ms: u64, task: TimerTask) -> TimerHandle {
        let handle = {
            let mut state = self.state.borrow_mut();
            state.next_handle += 1;
            TimerHandle(state.next_handle)
        };

        #[cfg(target_arch = "wasm32")]
        {
            let state = Rc::downgrade(&self.state);
            let callback = Closure::once_into_js(move || {
                if let Some(state) = state.upgrade() {
                    state.borrow_mut().pending.remove(&handle);
                }
                task();
            });
            let Some(window) = web_sys::window() else {
                console_warn("timer scheduled without a window");
                return handle;
            };
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms.min(i32::MAX as u64) as i32,
            ) {
                Ok(timeout_id) => {
                    self.state.borrow_mut().pending.insert(handle, timeout_id);
                }
                Err(err) => console_warn(&crate::interop::js_error_to_string(err)),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        drop((delay_ms, task));

        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let removed = self.state.borrow_mut().pending.remove(&handle);

        #[cfg(target_arch = "wasm32")]
        if let (Some(timeout_id), Some(window)) = (removed, web_sys::window()) {
            window.clear_timeout_with_handle(timeout_id);
        }

        #[cfg(not(target_arch = "wasm32"))]
        let _ = removed;
    }
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(message));
}
