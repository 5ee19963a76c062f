//! DOM-backed inspection of rendered window frames.

use window_host::SurfaceInspector;

/// Attribute the window layer writes on every frame element.
pub const WINDOW_ID_ATTRIBUTE: &str = "data-window-id";

/// Selector for the frame of `window_id`.
pub fn frame_selector(window_id: u64) -> String {
    format!("[{WINDOW_ID_ATTRIBUTE}=\"{window_id}\"]")
}

#[derive(Debug, Clone, Copy, Default)]
/// Inspector querying the live document for `[data-is-busy="true"]` inside a window frame.
pub struct DomSurfaceInspector;

impl SurfaceInspector for DomSurfaceInspector {
    fn is_busy(&self, window_id: u64) -> Option<bool> {
        #[cfg(target_arch = "wasm32")]
        {
            let document = web_sys::window()?.document()?;
            let frame = document
                .query_selector(&frame_selector(window_id))
                .ok()
                .flatten()?;
            let busy = frame
                .query_selector("[data-is-busy=\"true\"]")
                .ok()
                .flatten()
                .is_some();
            Some(busy)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = window_id;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn frames_are_selected_by_window_id() {
        assert_eq!(frame_selector(7), "[data-window-id=\"7\"]");
    }

    #[test]
    fn nothing_is_inspectable_without_a_document() {
        assert_eq!(DomSurfaceInspector.is_busy(7), None);
    }
}
