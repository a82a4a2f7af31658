use crate::llm::fallback::TaskCategory;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Research Types =============

/// A summarized piece of evidence with its source attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    pub summary: String,
    pub source: String,
}

impl Finding {
    pub fn new(summary: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            source: source.into(),
        }
    }
}

/// Raw search hit handed from the search step to the processing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// A clarifying question together with the user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClarifyRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClarifyResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub clarifications: Vec<Clarification>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    #[schema(value_type = Object)]
    pub initial_queries: serde_json::Value,
    pub report: String,
    pub iterations: usize,
    pub termination: String,
    pub findings: Vec<Finding>,
    #[schema(value_type = Vec<Object>)]
    pub activities: Vec<serde_json::Value>,
    pub duration_ms: u64,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("All model calls failed for task: {0}")]
    AllModelsFailed(TaskCategory),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Research error: {0}")]
    Research(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::InvalidInput(msg) => msg,
            AppError::LLM(msg) | AppError::Internal(msg) => msg,
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_all_models_failed_names_category() {
        let err = AppError::AllModelsFailed(TaskCategory::Analysis);
        assert_eq!(err.to_string(), "All model calls failed for task: ANALYSIS");
    }

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let response = AppError::InvalidInput("Invalid topic input".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let response = AppError::Research("boom".into()).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_research_request_defaults_clarifications() {
        let req: ResearchRequest = serde_json::from_str(r#"{"topic":"rust async"}"#).unwrap();
        assert_eq!(req.topic, "rust async");
        assert!(req.clarifications.is_empty());
    }
}
