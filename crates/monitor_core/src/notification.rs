#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Transient confirmation of a user action.
    Info,
    /// Transient report of a failed dispatch or save; the user may retry.
    Failure,
    /// The event channel is gone; no further events will be observed.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            description,
        }
    }

    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Failure,
            title: title.into(),
            description: Some(description.into()),
        }
    }

    pub fn fatal(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Fatal,
            title: title.into(),
            description: Some(description.into()),
        }
    }
}
