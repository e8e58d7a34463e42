use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use monitor_logging::monitor_trace;

/// Callback invoked with each payload emitted on a channel.
pub type Listener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("event bus is closed")]
    Closed,
    #[error("listener {id:?} is not registered on channel {channel}")]
    UnknownListener { channel: String, id: ListenerId },
}

/// Registration surface of a named event channel.
pub trait EventSource: Send + Sync {
    fn listen(&self, channel: &str, listener: Listener) -> Result<ListenerId, BusError>;
    fn unlisten(&self, channel: &str, id: ListenerId) -> Result<(), BusError>;
}

#[derive(Default)]
struct BusInner {
    closed: bool,
    next_id: u64,
    channels: HashMap<String, Vec<(ListenerId, Listener)>>,
}

/// In-process named channels carrying text payloads from the worker side to listeners.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every listener on `channel`; returns how many were called.
    ///
    /// Listeners run on the caller's thread, outside the bus lock.
    pub fn emit(&self, channel: &str, payload: &str) -> usize {
        let listeners: Vec<Listener> = {
            let inner = self.lock();
            match inner.channels.get(channel) {
                Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => Vec::new(),
            }
        };
        monitor_trace!(
            "emit channel={} listeners={} len={}",
            channel,
            listeners.len(),
            payload.len()
        );
        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.lock().channels.get(channel).map_or(0, Vec::len)
    }

    /// Drop every listener; later registrations fail with [`BusError::Closed`].
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.channels.clear();
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSource for EventBus {
    fn listen(&self, channel: &str, listener: Listener) -> Result<ListenerId, BusError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(BusError::Closed);
        }
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner
            .channels
            .entry(channel.to_string())
            .or_default()
            .push((id, listener));
        Ok(id)
    }

    fn unlisten(&self, channel: &str, id: ListenerId) -> Result<(), BusError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(BusError::Closed);
        }
        let unknown = || BusError::UnknownListener {
            channel: channel.to_string(),
            id,
        };
        let entries = inner.channels.get_mut(channel).ok_or_else(unknown)?;
        let position = entries
            .iter()
            .position(|(entry_id, _)| *entry_id == id)
            .ok_or_else(unknown)?;
        entries.remove(position);
        if entries.is_empty() {
            inner.channels.remove(channel);
        }
        Ok(())
    }
}
