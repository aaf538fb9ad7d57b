/// Non-blocking user-facing message.
///
/// No failure routed through here is fatal to the session; the host decides
/// how to display these (toast, banner, console).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Collects notifications between host polls.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.items.push(Notification {
            severity,
            message: message.into(),
        });
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.items)
    }
}
