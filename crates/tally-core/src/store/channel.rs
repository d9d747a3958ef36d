//! Replication channel: deliver the latest full snapshot to every listener.
//!
//! Messages always carry the whole snapshot; listeners replace their copy
//! rather than applying a delta. Delivery is last-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ErrorCode;
use crate::model::snapshot::{Snapshot, iso_millis};

/// Message published after every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    #[serde(rename = "data_updated")]
    DataUpdated {
        #[serde(with = "iso_millis")]
        timestamp: DateTime<Utc>,
        data: Box<Snapshot>,
    },
}

impl ChannelMessage {
    #[must_use]
    pub fn data_updated(snapshot: &Snapshot) -> Self {
        Self::DataUpdated {
            timestamp: snapshot.last_updated,
            data: Box::new(snapshot.clone()),
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> Snapshot {
        match self {
            Self::DataUpdated { data, .. } => *data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("replication channel is not available")]
    Unavailable,
}

impl ChannelError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable => ErrorCode::ChannelUnavailable,
        }
    }
}

/// Publish/subscribe transport between scoreboard contexts.
pub trait Channel {
    /// Send `message` to every current listener.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unavailable`] when the transport cannot deliver; the
    /// caller falls back to the sentinel slot key.
    fn publish(&self, message: &ChannelMessage) -> Result<(), ChannelError>;

    /// Register a new listener.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Unavailable`] when the transport cannot deliver.
    fn listen(&self) -> Result<Receiver<ChannelMessage>, ChannelError>;
}

/// In-process fan-out. Clones share the same listener set.
#[derive(Debug, Clone, Default)]
pub struct LocalBus {
    listeners: Arc<Mutex<Vec<Sender<ChannelMessage>>>>,
}

impl LocalBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners still connected.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Channel for LocalBus {
    fn publish(&self, message: &ChannelMessage) -> Result<(), ChannelError> {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Dropped receivers fail to send; forget them.
        listeners.retain(|tx| tx.send(message.clone()).is_ok());
        Ok(())
    }

    fn listen(&self) -> Result<Receiver<ChannelMessage>, ChannelError> {
        let (tx, rx) = mpsc::channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Ok(rx)
    }
}

/// A transport that never delivers. Writers fall back to the sentinel key
/// and readers to polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Channel for Unavailable {
    fn publish(&self, _message: &ChannelMessage) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable)
    }

    fn listen(&self) -> Result<Receiver<ChannelMessage>, ChannelError> {
        Err(ChannelError::Unavailable)
    }
}
