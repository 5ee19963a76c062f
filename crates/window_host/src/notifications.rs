//! Notification service contracts and no-op/in-memory adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`NotificationService`].
pub type NotificationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational message.
    Info,
    /// Completed action.
    Success,
    /// Recoverable problem.
    Warning,
    /// Failed action.
    Error,
}

impl NotificationLevel {
    /// Returns a stable lowercase token for logging and toast styling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Host service for user-visible notifications.
pub trait NotificationService {
    /// Dispatches a notification message.
    fn notify<'a>(
        &'a self,
        level: NotificationLevel,
        message: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op notification service for unsupported targets.
pub struct NoopNotificationService;

impl NotificationService for NoopNotificationService {
    fn notify<'a>(
        &'a self,
        _level: NotificationLevel,
        _message: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// Notification service that keeps every delivered message in memory.
pub struct MemoryNotificationService {
    delivered: Rc<RefCell<Vec<(NotificationLevel, String)>>>,
}

impl MemoryNotificationService {
    /// Delivered notifications, oldest first.
    pub fn delivered(&self) -> Vec<(NotificationLevel, String)> {
        self.delivered.borrow().clone()
    }
}

impl NotificationService for MemoryNotificationService {
    fn notify<'a>(
        &'a self,
        level: NotificationLevel,
        message: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.delivered
                .borrow_mut()
                .push((level, message.to_string()));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn memory_service_keeps_delivery_order() {
        let service = MemoryNotificationService::default();
        let service_obj: &dyn NotificationService = &service;

        block_on(service_obj.notify(NotificationLevel::Info, "first")).expect("notify");
        block_on(service_obj.notify(NotificationLevel::Error, "second")).expect("notify");

        assert_eq!(
            service.delivered(),
            vec![
                (NotificationLevel::Info, "first".to_string()),
                (NotificationLevel::Error, "second".to_string()),
            ]
        );
        assert_eq!(NotificationLevel::Error.as_str(), "error");
    }
}
