use crate::{
    llm::TaskCategory,
    research::utils::extract_json,
    types::{AppError, ClarifyRequest, ClarifyResponse, Result},
    AppState,
};
use axum::{extract::State, Json};
use serde_json::Value;

fn clarify_prompt(topic: &str) -> String {
    format!(
        r#"Given the research topic: "{}", generate 2-4 clarifying questions to help narrow down the research scope. Focus on identifying:
- Specific aspects of interest
- Required depth/complexity level
- Any particular perspective or excluded sources.

Respond only with a JSON object like:
{{
  "questions": ["Question 1", "Question 2"]
}}"#,
        topic
    )
}

/// Pull a non-empty list of non-empty question strings out of a reply.
fn parse_questions(reply: &str) -> Result<Vec<String>> {
    let value = extract_json(reply)?;
    let invalid = || AppError::LLM("Model returned invalid clarifying questions".to_string());

    let items = value
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(ToString::to_string)
                .ok_or_else(invalid)
        })
        .collect()
}

/// Ask the planning models for clarifying questions about a topic
pub async fn clarify_research_goals(state: &AppState, topic: &str) -> Result<Vec<String>> {
    let prompt = clarify_prompt(topic);

    let reply = state
        .fallback
        .dispatch(TaskCategory::Planning, |model| {
            let prompt = prompt.as_str();
            async move {
                let client = state.llm_factory.create(&model)?;
                client.generate(prompt).await
            }
        })
        .await?;

    tracing::debug!(reply = %reply, "Clarifying questions reply");
    parse_questions(&reply)
}

/// Generate clarifying questions for a research topic
#[utoipa::path(
    post,
    path = "/api/clarify",
    request_body = ClarifyRequest,
    responses(
        (status = 200, description = "Clarifying questions", body = ClarifyResponse),
        (status = 400, description = "Invalid topic input"),
        (status = 500, description = "Failed to generate questions")
    ),
    tag = "research"
)]
pub async fn clarify(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ClarifyResponse>> {
    let topic = payload
        .get("topic")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Invalid topic input".to_string()))?;

    let questions = clarify_research_goals(&state, topic).await?;
    Ok(Json(ClarifyResponse { questions }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_topic() {
        let prompt = clarify_prompt("ocean acidification");
        assert!(prompt.contains("\"ocean acidification\""));
        assert!(prompt.contains("\"questions\""));
    }

    #[test]
    fn test_parse_questions() {
        let questions =
            parse_questions("```json\n{\"questions\": [\"Which region?\", \" Time span? \"]}\n```")
                .unwrap();
        assert_eq!(questions, vec!["Which region?", "Time span?"]);
    }

    #[test]
    fn test_parse_questions_rejects_blank_entries() {
        assert!(parse_questions(r#"{"questions": ["ok", ""]}"#).is_err());
        assert!(parse_questions(r#"{"questions": "ok"}"#).is_err());
    }

    #[test]
    fn test_parse_questions_reports_bad_json() {
        let err = parse_questions("no json here").unwrap_err();
        assert!(err.to_string().contains("Could not parse LLM response"));
    }
}
