use std::collections::HashSet;

use crate::Event;

// TODO: cap or rotate once sessions with tens of thousands of progress pings show up.
/// Append-only, arrival-ordered record of accepted events for one session.
///
/// The log never reorders by timestamp and keeps repeated identical events;
/// readers only ever get a shared slice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventLog {
    events: Vec<Event>,
    job_ids: Vec<String>,
    seen_jobs: HashSet<String>,
    latest_percent: Option<f64>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) {
        if !self.seen_jobs.contains(event.job_id()) {
            self.seen_jobs.insert(event.job_id().to_string());
            self.job_ids.push(event.job_id().to_string());
        }
        if let Some(percent) = event.percent() {
            self.latest_percent = Some(percent);
        }
        self.events.push(event);
    }

    /// Raw percent of the most recent event that carried one.
    pub fn latest_percent(&self) -> Option<f64> {
        self.latest_percent
    }

    pub fn snapshot(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct job ids in first-seen order.
    pub fn jobs(&self) -> Vec<&str> {
        self.job_ids.iter().map(String::as_str).collect()
    }

    /// Drops every event. Only a new session may do this.
    pub(crate) fn reset(&mut self) {
        self.events.clear();
        self.job_ids.clear();
        self.seen_jobs.clear();
        self.latest_percent = None;
    }
}
