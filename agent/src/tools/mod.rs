use crate::Result;
use crate::llm::Message;
use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};

mod fetch_page;
pub use fetch_page::PageFetcher;

mod web_search;
pub use web_search::{SearchHit, WebSearch};

pub struct ToolDefinition {
    pub name: String,
    pub desc: String,
    pub params: serde_json::Value,
}

impl ToolDefinition {
    pub fn new<P: JsonSchema>(name: &str, desc: &str) -> Result<Self> {
        let schema = schema_for!(P);
        let params = serde_json::to_value(&schema.schema)?;
        Ok(Self {
            name: name.to_string(),
            desc: desc.to_string(),
            params,
        })
    }
}

#[derive(Clone, Debug, std::hash::Hash)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: String,
}

impl ToolCall {
    pub fn args<O: for<'de> serde::Deserialize<'de>>(&self) -> Result<O> {
        let args = serde_json::from_str(&self.args)?;
        Ok(args)
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "- {} ({})\n\t- `{}`\n", self.name, self.id, self.args)
    }
}

/// Result of a facade call to an outside source.
///
/// `Unavailable` is a soft failure: the calling agent is told what went wrong
/// and carries on without the data.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome<T> {
    Found(T),
    Unavailable(String),
}

impl<T> ToolOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ToolOutcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            ToolOutcome::Found(value) => Some(value),
            ToolOutcome::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ToolOutcome<U> {
        match self {
            ToolOutcome::Found(value) => ToolOutcome::Found(f(value)),
            ToolOutcome::Unavailable(reason) => ToolOutcome::Unavailable(reason),
        }
    }
}

#[async_trait]
pub trait Tool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke(&mut self, args: &ToolCall, messages: Vec<Message>) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait FunctionalTool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke_fn(&mut self, args: &ToolCall) -> Result<Message>;
}

#[async_trait]
impl<T> Tool for T
where
    T: FunctionalTool + Send + Sync,
{
    fn definition(&self) -> Result<ToolDefinition> {
        FunctionalTool::definition(self)
    }

    async fn invoke(
        &mut self,
        args: &ToolCall,
        mut messages: Vec<Message>,
    ) -> Result<Vec<Message>> {
        let result = self.invoke_fn(args).await?;
        messages.push(result);
        Ok(messages)
    }
}
