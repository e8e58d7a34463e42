use std::collections::VecDeque;
use std::path::PathBuf;

use crate::view_model::{EventRowView, MonitorViewModel};
use crate::{normalize_percent, Event, EventLog};

/// Which top-level screen the session shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Settings not loaded yet; the monitor is usable meanwhile.
    #[default]
    Loading,
    /// First launch (or unreadable settings): setup must be completed first.
    Setup,
    Monitor,
}

/// Lifecycle of the session's channel listener as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Detached,
    Attached,
    /// Registration or removal failed; no events will be observed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitorState {
    log: EventLog,
    rejected: usize,
    screen: Screen,
    channel: ChannelStatus,
    selected_files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    error_dialogs: VecDeque<String>,
    interrupts: usize,
    dispatch_failures: usize,
    dirty: bool,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> MonitorViewModel {
        self.view_from(0)
    }

    /// Like [`view`](Self::view), but only builds timeline rows from `first_row` on.
    ///
    /// Row indices stay absolute, so a renderer that already printed the first
    /// rows can ask for the tail alone.
    pub fn view_from(&self, first_row: usize) -> MonitorViewModel {
        let events = self.log.snapshot();
        let start = first_row.min(events.len());
        MonitorViewModel {
            screen: self.screen,
            channel: self.channel.clone(),
            events: events[start..]
                .iter()
                .enumerate()
                .map(|(offset, event)| EventRowView::from((start + offset, event)))
                .collect(),
            event_count: events.len(),
            rejected_count: self.rejected,
            global_percent: self.log.latest_percent().map(normalize_percent),
            job_ids: self.log.jobs().into_iter().map(str::to_owned).collect(),
            selected_files: self.selected_files.clone(),
            output_dir: self.output_dir.clone(),
            error_dialog: self.error_dialogs.front().cloned(),
            queued_error_dialogs: self.error_dialogs.len().saturating_sub(1),
            interrupt_count: self.interrupts,
            dispatch_failures: self.dispatch_failures,
            dirty: self.dirty,
        }
    }

    /// Read-only view of the event log.
    pub fn snapshot(&self) -> &[Event] {
        self.log.snapshot()
    }

    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn channel(&self) -> &ChannelStatus {
        &self.channel
    }

    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected_files
    }

    pub fn output_dir(&self) -> Option<&PathBuf> {
        self.output_dir.as_ref()
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn append_event(&mut self, event: Event) {
        self.log.append(event);
        self.mark_dirty();
    }

    pub(crate) fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    pub(crate) fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_channel(&mut self, channel: ChannelStatus) {
        if self.channel != channel {
            self.channel = channel;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_selected_files(&mut self, files: Vec<PathBuf>) {
        self.selected_files = files;
        self.mark_dirty();
    }

    pub(crate) fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = Some(dir);
        self.mark_dirty();
    }

    pub(crate) fn open_error_dialog(&mut self, message: String) {
        self.error_dialogs.push_back(message);
        self.interrupts += 1;
        self.mark_dirty();
    }

    pub(crate) fn close_error_dialog(&mut self) -> Option<String> {
        let closed = self.error_dialogs.pop_front();
        if closed.is_some() {
            self.mark_dirty();
        }
        closed
    }

    pub(crate) fn record_dispatch_failure(&mut self) {
        self.dispatch_failures += 1;
        self.mark_dirty();
    }

    pub(crate) fn reset_session(&mut self) {
        self.log.reset();
        self.rejected = 0;
        self.error_dialogs.clear();
        self.mark_dirty();
    }
}
