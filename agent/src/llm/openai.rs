use crate::llm;
use crate::tools::ToolDefinition;
use crate::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
        ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
        ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs, Role,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Chat completions against any OpenAI-compatible endpoint.
pub struct OpenAI {
    model: String,
    client: Client<OpenAIConfig>,
}

/// One HTTP request per completion. Retrying is left to the caller, which
/// knows how long a rate limit is worth waiting out.
fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

impl OpenAI {
    /// Uses the default OpenAI endpoint and `OPENAI_API_KEY`.
    pub fn new(model: String) -> Arc<Self> {
        Arc::new(Self {
            model,
            client: Client::new().with_backoff(single_attempt()),
        })
    }

    pub fn with_endpoint(model: String, api_base: &str, api_key: &str) -> Arc<Self> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Arc::new(Self {
            model,
            client: Client::with_config(config).with_backoff(single_attempt()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Maps a client failure onto the transient/fatal split the workflow retries on.
///
/// HTTP error statuses never reach here as `Reqwest` errors: rate limits and
/// server errors arrive as `ApiError`, with the raw body as message for 5xx.
fn classify(err: OpenAIError) -> Error {
    match &err {
        OpenAIError::Reqwest(source) if source.is_timeout() || source.is_connect() => {
            Error::ProviderUnavailable(err.to_string())
        }
        OpenAIError::ApiError(api) => {
            let details: Vec<&str> = [api.r#type.as_deref(), api.code.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if details.is_empty() {
                Error::provider(api.message.clone())
            } else {
                Error::provider(format!("{} ({})", api.message, details.join(", ")))
            }
        }
        _ => Error::provider(err.to_string()),
    }
}

impl TryFrom<&llm::Message> for ChatCompletionRequestMessage {
    type Error = Error;

    fn try_from(msg: &llm::Message) -> Result<Self> {
        match msg {
            llm::Message::User(msg) => Ok(ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(msg.clone()),
                    name: None,
                },
            )),
            llm::Message::System(msg) => Ok(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.clone()),
                    name: None,
                },
            )),
            llm::Message::Tool { id, result, .. } => Ok(ChatCompletionRequestMessage::Tool(
                ChatCompletionRequestToolMessage {
                    content: ChatCompletionRequestToolMessageContent::Text(result.clone()),
                    tool_call_id: id.clone(),
                },
            )),
            llm::Message::Assistant(msg, tool_calls) => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                args.content(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.clone(),
                ));
                // some compatible endpoints reject an empty tool_calls array
                if !tool_calls.is_empty() {
                    args.tool_calls(
                        tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.args.clone(),
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                Ok(ChatCompletionRequestMessage::Assistant(args.build()?))
            }
        }
    }
}

impl TryFrom<&ToolDefinition> for ChatCompletionTool {
    type Error = Error;

    fn try_from(tool: &ToolDefinition) -> Result<Self> {
        let res = ChatCompletionToolArgs::default()
            .function(
                FunctionObjectArgs::default()
                    .name(tool.name.clone())
                    .description(tool.desc.clone())
                    .parameters(tool.params.clone())
                    .build()?,
            )
            .build()?;

        Ok(res)
    }
}

#[async_trait]
impl llm::LLM for OpenAI {
    async fn completion<'a>(
        &self,
        request: llm::CompletionRequest<'a>,
    ) -> Result<llm::CompletionResponse> {
        let mut completion = CreateChatCompletionRequestArgs::default();
        completion.model(&self.model).messages(
            request
                .messages
                .iter()
                .map(ChatCompletionRequestMessage::try_from)
                .collect::<Result<Vec<_>>>()?,
        );

        if !request.tools.is_empty() {
            completion.tools(
                request
                    .tools
                    .iter()
                    .map(ChatCompletionTool::try_from)
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        let completion = completion.build()?;

        let res = self
            .client
            .chat()
            .create(completion)
            .await
            .map_err(classify)?;

        let choice = res
            .choices
            .first()
            .ok_or(Error::LLMResponseError("choices is empty".to_string()))?;

        if choice.message.role != Role::Assistant {
            return Err(Error::LLMResponseError(
                "expected role to be assistant".to_string(),
            ));
        }

        let tool_calls: Vec<_> = choice
            .message
            .tool_calls
            .iter()
            .flat_map(|calls| {
                calls.iter().map(|call| crate::tools::ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    args: call.function.arguments.clone(),
                })
            })
            .collect();

        let content = match (&choice.message.content, tool_calls.is_empty()) {
            (Some(content), _) => content.clone(),
            (None, false) => String::new(),
            (None, true) => {
                return Err(Error::LLMResponseError("content is empty".to_string()));
            }
        };

        Ok(llm::CompletionResponse {
            content,
            tool_calls,
        })
    }
}
