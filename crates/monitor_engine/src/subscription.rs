use std::sync::Arc;

use monitor_logging::{monitor_debug, monitor_error, monitor_info};

use crate::bus::{BusError, EventSource, Listener, ListenerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Detached,
    Attached(ListenerId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("failed to register listener on {channel}: {source}")]
    Register {
        channel: String,
        #[source]
        source: BusError,
    },
    #[error("failed to remove listener from {channel}: {source}")]
    Deregister {
        channel: String,
        #[source]
        source: BusError,
    },
}

/// Owns the session's single listener on one channel.
///
/// Attaching twice is a no-op, and dropping the manager detaches, so a
/// session never leaves a second listener behind.
pub struct SubscriptionManager {
    source: Arc<dyn EventSource>,
    channel: String,
    state: SubscriptionState,
}

impl SubscriptionManager {
    pub fn new(source: Arc<dyn EventSource>, channel: impl Into<String>) -> Self {
        Self {
            source,
            channel: channel.into(),
            state: SubscriptionState::Detached,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, SubscriptionState::Attached(_))
    }

    /// Register `deliver` on the channel unless a listener is already attached.
    pub fn attach<F>(&mut self, deliver: F) -> Result<(), SubscriptionError>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        if self.is_attached() {
            monitor_debug!("Listener on {} already attached", self.channel);
            return Ok(());
        }

        let listener: Listener = Arc::new(deliver);
        let id = self
            .source
            .listen(&self.channel, listener)
            .map_err(|source| SubscriptionError::Register {
                channel: self.channel.clone(),
                source,
            })?;
        self.state = SubscriptionState::Attached(id);
        monitor_info!("Attached listener {:?} on {}", id, self.channel);
        Ok(())
    }

    /// Remove the listener registered by [`attach`](Self::attach).
    ///
    /// The manager is `Detached` afterwards even when removal fails; the error
    /// is still returned so the session can report it.
    pub fn detach(&mut self) -> Result<(), SubscriptionError> {
        let SubscriptionState::Attached(id) = self.state else {
            return Ok(());
        };
        self.state = SubscriptionState::Detached;
        self.source
            .unlisten(&self.channel, id)
            .map_err(|source| SubscriptionError::Deregister {
                channel: self.channel.clone(),
                source,
            })?;
        monitor_info!("Detached listener {:?} from {}", id, self.channel);
        Ok(())
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        if let Err(err) = self.detach() {
            monitor_error!("{}", err);
        }
    }
}
