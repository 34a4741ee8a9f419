use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
        ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        FunctionObjectArgs,
    },
    Client,
};
use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::OperationDescriptor;
use crate::error::AgentError;
use crate::router::OperationProposal;

/// The planner: hands the model a task plus the operation catalog and asks it
/// to pick at most one operation. Whatever comes back is untrusted; the
/// router validates it.
pub struct Planner {
    client: Client<OpenAIConfig>,
    model: String,
}

impl Planner {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY must be set in the environment or .env")?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        info!("Planner connected. Model: {}", model);
        Ok(Self { client, model })
    }

    /// Sends one chat completion carrying the catalog as function tools.
    /// Returns `None` when the model declines to select an operation.
    pub async fn plan(
        &self,
        task: &str,
        catalog: &[OperationDescriptor],
    ) -> Result<Option<OperationProposal>, AgentError> {
        let tools = catalog
            .iter()
            .map(tool_schema)
            .collect::<Result<Vec<_>, AgentError>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(task)
                    .build()
                    .map_err(|err| AgentError::UpstreamModel(err.to_string()))?,
            )])
            .tools(tools)
            .build()
            .map_err(|err| AgentError::UpstreamModel(err.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|err| AgentError::UpstreamModel(err.to_string()))?;

        let Some(choice) = response.choices.first() else {
            return Err(AgentError::UpstreamModel("model returned no choices".to_string()));
        };
        let Some(call) = choice.message.tool_calls.as_ref().and_then(|calls| calls.first())
        else {
            return Ok(None);
        };

        let arguments = serde_json::from_str(&call.function.arguments).map_err(|err| {
            AgentError::UpstreamModel(format!("malformed tool-call arguments: {err}"))
        })?;

        Ok(Some(OperationProposal {
            name: call.function.name.clone(),
            arguments,
        }))
    }
}

/// Converts one catalog entry into the function-tool shape the model service
/// expects.
fn tool_schema(descriptor: &OperationDescriptor) -> Result<ChatCompletionTool, AgentError> {
    FunctionObjectArgs::default()
        .name(descriptor.name)
        .description(descriptor.description)
        .parameters(descriptor.parameters_schema())
        .build()
        .and_then(|function| {
            ChatCompletionToolArgs::default()
                .r#type(ChatCompletionToolType::Function)
                .function(function)
                .build()
        })
        .map_err(|err| AgentError::UpstreamModel(err.to_string()))
}
