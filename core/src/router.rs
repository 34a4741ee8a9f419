use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog;
use crate::client::{UserPayload, UserRecord, UserStore};
use crate::error::AgentError;

/// What the model proposed for one piece of input text: an operation name and
/// a raw argument object. Both are untrusted until validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationProposal {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// A proposal after validation: the only form that ever reaches dispatch.
/// Parsing into this enum is the closed mapping from model-controlled text to
/// concrete operations; no string lookup happens past this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCall {
    Create { name: String, email: String, role: String },
    Get { user_id: String },
    List,
    Update { user_id: String, name: String, email: String, role: String },
    Delete { user_id: String },
}

impl UserCall {
    /// Validates a proposal against the catalog: the name must be a catalog
    /// entry, every required field must be present and a string. Undeclared
    /// fields are ignored so minor model over-generation never fails a call.
    pub fn from_proposal(proposal: &OperationProposal) -> Result<Self, AgentError> {
        if catalog::descriptor(&proposal.name).is_none() {
            return Err(AgentError::UnknownOperation(proposal.name.clone()));
        }
        let args = &proposal.arguments;
        let call = match proposal.name.as_str() {
            "create_user" => Self::Create {
                name: required_string(args, "name")?,
                email: required_string(args, "email")?,
                role: required_string(args, "role")?,
            },
            "get_user" => Self::Get { user_id: required_string(args, "user_id")? },
            "get_users" => Self::List,
            "update_user" => Self::Update {
                user_id: required_string(args, "user_id")?,
                name: required_string(args, "name")?,
                email: required_string(args, "email")?,
                role: required_string(args, "role")?,
            },
            "delete_user" => Self::Delete { user_id: required_string(args, "user_id")? },
            // Unreachable while the catalog and this match stay in sync; the
            // drift guard test below pins that.
            other => return Err(AgentError::UnknownOperation(other.to_string())),
        };
        Ok(call)
    }
}

fn required_string(args: &Map<String, Value>, field: &str) -> Result<String, AgentError> {
    match args.get(field) {
        None => Err(AgentError::missing_field(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(AgentError::wrong_type(field, json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalized payload of a successful operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OperationOutput {
    User(UserRecord),
    Users(Vec<UserRecord>),
    Deleted(DeleteAck),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteAck {
    pub status: &'static str,
}

impl DeleteAck {
    fn success() -> Self {
        Self { status: "success" }
    }
}

/// What the caller of the router gets back for a successful route.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub function_called: String,
    pub arguments: Value,
    pub result: OperationOutput,
}

/// Validates proposals and dispatches them onto the store. Holds no mutable
/// state; the catalog it validates against is baked into the binary.
pub struct Router<S> {
    store: S,
}

impl<S: UserStore> Router<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Routes one proposal end to end. Validation failures return before any
    /// store call; a successful route makes exactly one.
    pub async fn route(
        &self,
        proposal: Option<OperationProposal>,
    ) -> Result<Invocation, AgentError> {
        let proposal = proposal.ok_or(AgentError::NoOperationSelected)?;
        let call = UserCall::from_proposal(&proposal)?;
        info!("Dispatching operation '{}'", proposal.name);
        let result = self.dispatch(call).await?;
        Ok(Invocation {
            function_called: proposal.name,
            arguments: Value::Object(proposal.arguments),
            result,
        })
    }

    async fn dispatch(&self, call: UserCall) -> Result<OperationOutput, AgentError> {
        match call {
            UserCall::Create { name, email, role } => {
                let created = self
                    .store
                    .create_user(&UserPayload { name, email, role })
                    .await?;
                Ok(OperationOutput::User(created))
            }
            UserCall::Get { user_id } => {
                Ok(OperationOutput::User(self.store.get_user(&user_id).await?))
            }
            UserCall::List => Ok(OperationOutput::Users(self.store.list_users().await?)),
            UserCall::Update { user_id, name, email, role } => {
                let updated = self
                    .store
                    .update_user(&user_id, &UserPayload { name, email, role })
                    .await?;
                Ok(OperationOutput::User(updated))
            }
            UserCall::Delete { user_id } => {
                self.store.delete_user(&user_id).await?;
                Ok(OperationOutput::Deleted(DeleteAck::success()))
            }
        }
    }
}
