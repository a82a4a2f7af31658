//! Helpers shared by every LLM-backed research step.

use crate::research::activity::{ActivityStatus, ActivityTracker, ActivityType};
use crate::types::{AppError, Finding, Result};
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;

/// Sleep between retry attempts.
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Join findings into one text block, in order.
///
/// Each finding renders as `<summary>\n\n Source: <source>`; findings are
/// separated by `\n\n---\n\n`. Downstream prompts depend on this exact shape.
pub fn combine_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|finding| format!("{}\n\n Source: {}", finding.summary, finding.source))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Parse the JSON object in a model reply.
///
/// Markdown code fences and prose around the outermost `{...}` are ignored.
pub fn extract_json(reply: &str) -> Result<Value> {
    let text = reply.trim();
    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    };

    serde_json::from_str(candidate)
        .map_err(|_| AppError::LLM("Could not parse LLM response into valid JSON.".to_string()))
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Swallow an error into `fallback`.
///
/// With a tracker and activity type, an `error` activity
/// `"<context> failed: <message>"` is emitted first.
pub fn capture_error<E, T>(
    error: E,
    context: &str,
    tracker: Option<&dyn ActivityTracker>,
    activity_type: Option<ActivityType>,
    fallback: T,
) -> T
where
    E: Display,
{
    let message = error.to_string();
    let message = if message.is_empty() {
        "Unknown error".to_string()
    } else {
        message
    };

    tracing::warn!(context = %context, error = %message, "Absorbed research step failure");

    if let (Some(tracker), Some(activity_type)) = (tracker, activity_type) {
        tracker.add(
            activity_type,
            ActivityStatus::Error,
            &format!("{} failed: {}", context, message),
        );
    }

    fallback
}

/// Report a failed retry attempt. `attempt` is zero-based.
pub fn log_attempt_failure(
    tracker: &dyn ActivityTracker,
    activity_type: ActivityType,
    attempt: usize,
    message: &str,
) {
    tracker.add(
        activity_type,
        ActivityStatus::Warning,
        &format!("Attempt {} failed: {}", attempt + 1, message),
    );
}

/// Report that a prompt was shortened before retrying.
pub fn log_prompt_reduction(
    tracker: &dyn ActivityTracker,
    activity_type: ActivityType,
    prompt: &str,
) {
    tracker.add(
        activity_type,
        ActivityStatus::Pending,
        &format!(
            "Reducing prompt size to {} and retrying.",
            prompt.chars().count()
        ),
    );
}
