use thiserror::Error;

/// Everything that can go wrong between "free text arrived" and "the store
/// answered". All variants are terminal; nothing here is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("model selected no operation")]
    NoOperationSelected,
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid arguments: field '{field}': {reason}")]
    InvalidArguments { field: String, reason: String },
    #[error("no user with id '{0}'")]
    NotFound(String),
    #[error("user store unreachable: {0}")]
    Transport(String),
    #[error("model service failure: {0}")]
    UpstreamModel(String),
}

impl AgentError {
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidArguments {
            field: field.to_string(),
            reason: "missing required field".to_string(),
        }
    }

    pub fn wrong_type(field: &str, found: &'static str) -> Self {
        Self::InvalidArguments {
            field: field.to_string(),
            reason: format!("expected a string, found {found}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentError;

    #[test]
    fn invalid_arguments_names_the_offending_field() {
        let err = AgentError::missing_field("email");
        assert_eq!(
            err.to_string(),
            "invalid arguments: field 'email': missing required field"
        );
    }

    #[test]
    fn wrong_type_reports_what_was_found() {
        let err = AgentError::wrong_type("user_id", "number");
        assert_eq!(
            err.to_string(),
            "invalid arguments: field 'user_id': expected a string, found number"
        );
    }
}
