use monitor_core::{
    ChannelStatus, EventRowView, MonitorViewModel, Notification, NotificationLevel, Screen,
};

use super::constants::{PROGRESS_BAR_WIDTH, PROGRESS_EMPTY, PROGRESS_FILLED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub stream: Stream,
    pub text: String,
}

impl TerminalLine {
    pub fn out(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Out,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Err,
            text: text.into(),
        }
    }
}

/// Tracks what has already been printed so each render only emits the delta.
#[derive(Debug, Default)]
pub struct RenderCursor {
    rows_printed: usize,
    last_percent: Option<f64>,
}

impl RenderCursor {
    /// First row the next render needs, for `MonitorState::view_from`.
    pub fn first_unprinted(&self, event_count: usize) -> usize {
        if event_count < self.rows_printed {
            0
        } else {
            self.rows_printed
        }
    }
}

pub fn render(view: &MonitorViewModel, cursor: &mut RenderCursor) -> Vec<TerminalLine> {
    let mut lines = Vec::new();

    // A new session cleared the log underneath us.
    if view.event_count < cursor.rows_printed {
        cursor.rows_printed = 0;
        cursor.last_percent = None;
        lines.push(TerminalLine::out("-- new session --"));
    }

    for row in view
        .events
        .iter()
        .filter(|row| row.index >= cursor.rows_printed)
    {
        lines.push(TerminalLine::out(format_row(row)));
    }
    cursor.rows_printed = view.event_count;

    if view.global_percent != cursor.last_percent {
        if let Some(percent) = view.global_percent {
            lines.push(TerminalLine::out(format_progress(percent)));
        }
        cursor.last_percent = view.global_percent;
    }

    lines
}

pub fn format_row(row: &EventRowView) -> String {
    let mut text = format!(
        "{} [{}] {} {}",
        row.timestamp, row.kind, row.job_id, row.stage
    );
    if let Some(message) = &row.message {
        text.push_str(" - ");
        text.push_str(message);
    }
    if let Some(percent) = row.percent {
        text.push_str(&format!(" ({percent:.0}%)"));
    }
    text
}

pub fn format_progress(percent: f64) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * PROGRESS_BAR_WIDTH as f64).round() as usize;
    format!(
        "progress [{}{}] {:.1}%",
        PROGRESS_FILLED.repeat(filled),
        PROGRESS_EMPTY.repeat(PROGRESS_BAR_WIDTH - filled),
        clamped
    )
}

pub fn render_notification(notification: &Notification) -> TerminalLine {
    let label = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Failure => "failed",
        NotificationLevel::Fatal => "fatal",
    };
    let text = match &notification.description {
        Some(description) => format!("{label}: {}: {description}", notification.title),
        None => format!("{label}: {}", notification.title),
    };
    match notification.level {
        NotificationLevel::Info => TerminalLine::out(text),
        NotificationLevel::Failure | NotificationLevel::Fatal => TerminalLine::err(text),
    }
}

pub fn render_error_dialog(message: &str) -> Vec<TerminalLine> {
    vec![
        TerminalLine::err("!! sidecar error"),
        TerminalLine::err(format!("!! {message}")),
    ]
}

pub fn render_summary(view: &MonitorViewModel) -> Vec<TerminalLine> {
    let progress = match view.global_percent {
        Some(percent) => format!("{percent:.1}%"),
        None => "n/a".to_string(),
    };
    let mut lines = vec![TerminalLine::out(format!(
        "{} | channel: {} | events: {} (rejected {}) | jobs: {} | progress: {}",
        screen_label(view.screen),
        channel_label(&view.channel),
        view.event_count,
        view.rejected_count,
        view.job_ids.len(),
        progress
    ))];
    if view.interrupt_count > 0 || view.dispatch_failures > 0 {
        lines.push(TerminalLine::err(format!(
            "errors: {} | dispatch failures: {}",
            view.interrupt_count, view.dispatch_failures
        )));
    }
    lines
}

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Loading => "loading",
        Screen::Setup => "setup required",
        Screen::Monitor => "monitor",
    }
}

fn channel_label(channel: &ChannelStatus) -> String {
    match channel {
        ChannelStatus::Detached => "detached".to_string(),
        ChannelStatus::Attached => "attached".to_string(),
        ChannelStatus::Failed(reason) => format!("failed ({reason})"),
    }
}
