//! Output sink for a research run.

use crate::research::activity::ActivityEvent;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

/// One structured write to the external stream.
///
/// Serialized as `{"type": "activity" | "report" | "error", "content": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum StreamMessage {
    Activity(ActivityEvent),
    Report(String),
    /// A run aborted; written by the caller that owns the stream.
    Error(String),
}

/// Fire-and-forget sink; writes never fail from the caller's point of view.
pub trait DataStream: Send + Sync {
    fn write_data(&self, message: StreamMessage);
}

/// Forwards messages to an unbounded channel.
///
/// Writes after the receiver is dropped are discarded.
pub struct ChannelStream {
    tx: mpsc::UnboundedSender<StreamMessage>,
}

impl ChannelStream {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DataStream for ChannelStream {
    fn write_data(&self, message: StreamMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("Stream receiver dropped, discarding message");
        }
    }
}

/// Keeps every message in memory.
#[derive(Default)]
pub struct MemoryStream {
    messages: Mutex<Vec<StreamMessage>>,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<StreamMessage> {
        self.messages.lock().clone()
    }

    /// Last report written, if any.
    pub fn report(&self) -> Option<String> {
        self.messages
            .lock()
            .iter()
            .rev()
            .find_map(|message| match message {
                StreamMessage::Report(report) => Some(report.clone()),
                _ => None,
            })
    }

    pub fn activities(&self) -> Vec<ActivityEvent> {
        self.messages
            .lock()
            .iter()
            .filter_map(|message| match message {
                StreamMessage::Activity(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DataStream for MemoryStream {
    fn write_data(&self, message: StreamMessage) {
        self.messages.lock().push(message);
    }
}
