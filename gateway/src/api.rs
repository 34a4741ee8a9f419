use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use steward_core::error::AgentError;

/// Input: free text describing what the caller wants done.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Wraps the core taxonomy so it can carry an HTTP status out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::NoOperationSelected
            | AgentError::UnknownOperation(_)
            | AgentError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
            AgentError::NotFound(_) => StatusCode::NOT_FOUND,
            AgentError::Transport(_) | AgentError::UpstreamModel(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use steward_core::error::AgentError;

    use super::ApiError;

    #[test]
    fn validation_failures_are_client_errors() {
        for err in [
            AgentError::NoOperationSelected,
            AgentError::UnknownOperation("drop_all_users".to_string()),
            AgentError::missing_field("email"),
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn store_not_found_propagates_as_404() {
        let err = ApiError(AgentError::NotFound("user-1".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failures_are_bad_gateway() {
        for err in [
            AgentError::Transport("connection refused".to_string()),
            AgentError::UpstreamModel("model returned no choices".to_string()),
        ] {
            assert_eq!(ApiError(err).status(), StatusCode::BAD_GATEWAY);
        }
    }
}
