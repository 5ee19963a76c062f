//! Console-backed notification adapter.

use window_host::{NotificationFuture, NotificationLevel, NotificationService};

#[derive(Debug, Clone, Copy, Default)]
/// Browser notification adapter writing to the developer console at the matching level.
///
/// Pages with their own toast component provide a [`NotificationService`] of their own; this
/// adapter keeps failures visible when none is installed.
pub struct ConsoleNotificationService;

/// Formats the console line for a notification.
pub fn console_line(level: NotificationLevel, message: &str) -> String {
    format!("[window:{}] {}", level.as_str(), message.trim())
}

impl NotificationService for ConsoleNotificationService {
    fn notify<'a>(
        &'a self,
        level: NotificationLevel,
        message: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let line = console_line(level, message);

            #[cfg(target_arch = "wasm32")]
            {
                let value = wasm_bindgen::JsValue::from_str(&line);
                match level {
                    NotificationLevel::Info | NotificationLevel::Success => {
                        web_sys::console::info_1(&value)
                    }
                    NotificationLevel::Warning => web_sys::console::warn_1(&value),
                    NotificationLevel::Error => web_sys::console::error_1(&value),
                }
            }

            #[cfg(not(target_arch = "wasm32"))]
            let _ = line;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lines_carry_the_level_token() {
        assert_eq!(
            console_line(NotificationLevel::Error, " Failed to open window. "),
            "[window:error] Failed to open window."
        );
    }

    #[test]
    fn notify_always_succeeds() {
        let result = block_on(
            ConsoleNotificationService.notify(NotificationLevel::Warning, "Max windows reached"),
        );

        assert_eq!(result, Ok(()));
    }
}
