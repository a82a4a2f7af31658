//! Progress reporting
//!
//! The coordinator and its collaborators report what they are doing through
//! an injected [`ActivityTracker`]. The production tracker,
//! [`StreamTracker`], forwards each activity to the run's [`DataStream`]
//! stamped with the current progress counters.

use crate::research::state::ResearchProgress;
use crate::research::stream::{DataStream, StreamMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Planning,
    Search,
    Extract,
    Analyze,
    Report,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityType::Planning => "planning",
            ActivityType::Search => "search",
            ActivityType::Extract => "extract",
            ActivityType::Analyze => "analyze",
            ActivityType::Report => "report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Complete,
    Warning,
    Error,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityStatus::Pending => "pending",
            ActivityStatus::Complete => "complete",
            ActivityStatus::Warning => "warning",
            ActivityStatus::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub completed_steps: u32,
    pub tokens_used: u64,
}

/// Write-only progress sink.
pub trait ActivityTracker: Send + Sync {
    fn add(&self, activity_type: ActivityType, status: ActivityStatus, message: &str);
}

/// Tracker that writes every activity to a [`DataStream`].
pub struct StreamTracker {
    stream: Arc<dyn DataStream>,
    progress: Arc<ResearchProgress>,
}

impl StreamTracker {
    pub fn new(stream: Arc<dyn DataStream>, progress: Arc<ResearchProgress>) -> Self {
        Self { stream, progress }
    }
}

impl ActivityTracker for StreamTracker {
    fn add(&self, activity_type: ActivityType, status: ActivityStatus, message: &str) {
        if status == ActivityStatus::Complete {
            self.progress.complete_step();
        }
        let progress = self.progress.snapshot();

        tracing::debug!(
            activity = %activity_type,
            status = %status,
            completed_steps = progress.completed_steps,
            "{}",
            message
        );

        self.stream
            .write_data(StreamMessage::Activity(ActivityEvent {
                activity_type,
                status,
                message: message.to_string(),
                timestamp: Utc::now(),
                completed_steps: progress.completed_steps,
                tokens_used: progress.tokens_used,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::stream::MemoryStream;

    #[test]
    fn test_stream_tracker_counts_completed_steps() {
        let stream = Arc::new(MemoryStream::new());
        let progress = Arc::new(ResearchProgress::default());
        let tracker = StreamTracker::new(stream.clone(), progress.clone());

        tracker.add(ActivityType::Search, ActivityStatus::Pending, "Searching");
        tracker.add(ActivityType::Search, ActivityStatus::Complete, "Found 3");

        let events = stream.activities();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].completed_steps, 0);
        assert_eq!(events[1].completed_steps, 1);
        assert_eq!(events[1].message, "Found 3");
        assert_eq!(progress.snapshot().completed_steps, 1);
    }

    #[test]
    fn test_activity_event_wire_names() {
        let event = ActivityEvent {
            activity_type: ActivityType::Analyze,
            status: ActivityStatus::Warning,
            message: "m".into(),
            timestamp: Utc::now(),
            completed_steps: 2,
            tokens_used: 10,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "analyze");
        assert_eq!(value["status"], "warning");
        assert_eq!(value["completedSteps"], 2);
        assert_eq!(value["tokensUsed"], 10);
    }
}
