use crate::callbacks;
use crate::llm::{self, Message};
use crate::tools;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

const FINAL_ANSWER_PROMPT: &str = "You have used all the tool calls available for this task. \
Do not call any more tools. Using everything gathered so far, give your best complete final answer now.";

pub trait StopCondition {
    fn done(&self, history: &[llm::Message]) -> bool;
}

/// Stops once the model answers without asking for a tool.
pub struct FinalAnswer;

impl StopCondition for FinalAnswer {
    fn done(&self, history: &[llm::Message]) -> bool {
        matches!(history.last(), Some(Message::Assistant(_, tool_calls)) if tool_calls.is_empty())
    }
}

type Tool = Box<dyn tools::Tool + Send>;
type Callback = Box<dyn callbacks::Callback + Send>;

pub struct Agent {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    system_prompt: Option<String>,
    tools: HashMap<String, Tool>,
    callbacks: Vec<Callback>,
    tool_defs: Vec<tools::ToolDefinition>,
    stop_condition: Box<dyn StopCondition + Send>,
    max_iterations: usize,
}

impl Agent {
    async fn execute_tool_call(
        &mut self,
        tool_call: &tools::ToolCall,
        messages: Vec<llm::Message>,
    ) -> Result<Vec<llm::Message>> {
        let tool = self
            .tools
            .get_mut(&tool_call.name)
            .ok_or(Error::ToolDoesNotExist(tool_call.name.clone()))?;

        let messages = tool.invoke(tool_call, messages).await?;

        Ok(messages)
    }

    /// Runs the agent on `task` until the stop condition holds.
    ///
    /// At most `max_iterations` completions may use tools. If the limit is hit
    /// first, one more completion is requested with no tools offered and the
    /// run ends there.
    pub async fn run(&mut self, task: Vec<llm::Message>) -> Result<Vec<Message>> {
        let mut messages = Vec::with_capacity(task.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::System(prompt.clone()));
        }
        messages.extend(task);

        let mut iterations = 0;
        while !self.stop_condition.done(&messages) {
            let final_turn = iterations >= self.max_iterations;
            if final_turn && matches!(messages.last(), Some(Message::Tool { .. })) {
                messages.push(Message::User(FINAL_ANSWER_PROMPT.to_string()));
            }

            let tool_defs: &[tools::ToolDefinition] =
                if final_turn { &[] } else { &self.tool_defs };
            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: tool_defs,
                })
                .await?;
            iterations += 1;

            let tool_calls = if final_turn { Vec::new() } else { next.tool_calls };
            messages.push(llm::Message::Assistant(next.content, tool_calls.clone()));

            for tool_call in &tool_calls {
                messages = self.execute_tool_call(tool_call, messages).await?;
            }

            for callback in &mut self.callbacks {
                messages = callback.call(messages).await?;
            }

            if final_turn {
                break;
            }
        }

        Ok(messages)
    }
}

/// Content of the last assistant message in `history`.
pub fn final_answer(history: &[Message]) -> Option<&str> {
    history.iter().rev().find_map(|message| match message {
        Message::Assistant(content, _) => Some(content.as_str()),
        _ => None,
    })
}

pub struct AgentBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    system_prompt: Option<String>,
    tools: Vec<Tool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
    max_iterations: usize,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            system_prompt: None,
            tools: Vec::new(),
            callbacks: Vec::new(),
            stop_condition: None,
            max_iterations: 25,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let mut tool_defs = Vec::new();
        let mut tools = HashMap::new();

        for tool in self.tools {
            let def = tool.definition()?;
            tools.insert(def.name.clone(), tool);
            tool_defs.push(def);
        }

        Ok(Agent {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            system_prompt: self.system_prompt,
            tools,
            tool_defs,
            callbacks: self.callbacks,
            stop_condition: self.stop_condition.ok_or(Error::MissingArg(
                "stop_condition is required for agent".to_string(),
            ))?,
            max_iterations: self.max_iterations,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
