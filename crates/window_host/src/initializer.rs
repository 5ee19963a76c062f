//! Content-initializer contracts invoked after a window surface is created or refreshed.

use std::{cell::RefCell, rc::Rc};

/// Hook that (re)activates feature modules embedded in a window's markup.
///
/// Called after every create and every in-place refresh, once the surface is rendered.
/// `window_id` is the value the window layer writes to the frame's `data-window-id` attribute,
/// so implementations can locate the mounted content. Return values are ignored, so
/// implementations report their own failures.
pub trait ContentInitializer {
    /// Initializes the surface rendered for `endpoint` from `markup`.
    fn initialize(&self, window_id: u64, endpoint: &str, markup: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// Initializer for hosts whose window content carries no interactive modules.
pub struct NoopContentInitializer;

impl ContentInitializer for NoopContentInitializer {
    fn initialize(&self, _window_id: u64, _endpoint: &str, _markup: &str) {}
}

#[derive(Debug, Clone, Default)]
/// Initializer that records every call.
pub struct RecordingContentInitializer {
    calls: Rc<RefCell<Vec<(u64, String)>>>,
}

impl RecordingContentInitializer {
    /// `(window_id, endpoint)` pairs initialized so far, in call order.
    pub fn calls(&self) -> Vec<(u64, String)> {
        self.calls.borrow().clone()
    }

    /// Endpoints initialized so far, in call order.
    pub fn endpoints(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(_, endpoint)| endpoint.clone())
            .collect()
    }
}

impl ContentInitializer for RecordingContentInitializer {
    fn initialize(&self, window_id: u64, endpoint: &str, _markup: &str) {
        self.calls
            .borrow_mut()
            .push((window_id, endpoint.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn recording_initializer_keeps_window_ids() {
        let initializer = RecordingContentInitializer::default();
        let shared: Rc<dyn ContentInitializer> = Rc::new(initializer.clone());

        shared.initialize(3, "team/5", "<p></p>");
        shared.initialize(4, "settings", "");

        assert_eq!(
            initializer.calls(),
            vec![(3, "team/5".to_string()), (4, "settings".to_string())]
        );
        assert_eq!(initializer.endpoints(), vec!["team/5", "settings"]);
    }
}
