use crate::crew::RoleProfile;
use crate::workflow::{LlmFactory, Toolbox, agent_for, strip_reasoning};
use agent::Result;
use agent::llm::Message;
use agent::tools::{FunctionalTool, ToolCall, ToolDefinition};
use agent::final_answer;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
struct AskCoworkerArgs {
    /// role of the coworker to ask, e.g. "researcher"
    coworker: String,
    /// the question, with everything the coworker needs to answer it
    question: String,
}

/// Lets a role hand a question to another member of the crew.
///
/// The coworker runs with its own tools and model but cannot delegate further.
pub struct AskCoworker {
    coworkers: Vec<RoleProfile>,
    llms: LlmFactory,
    toolbox: Toolbox,
}

impl AskCoworker {
    pub fn new(coworkers: Vec<RoleProfile>, llms: LlmFactory, toolbox: Toolbox) -> Self {
        Self {
            coworkers,
            llms,
            toolbox,
        }
    }

    fn find(&self, name: &str) -> Option<&RoleProfile> {
        let name = name.trim().to_lowercase();
        self.coworkers.iter().find(|profile| {
            profile.role.key() == name || profile.title.to_lowercase() == name
        })
    }

    fn roster(&self) -> String {
        self.coworkers
            .iter()
            .map(|profile| profile.role.key())
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn ask(&self, profile: &RoleProfile, question: &str) -> Result<String> {
        tracing::info!(coworker = profile.role.key(), "delegating question");
        let llm = (self.llms)(&profile.model);
        let mut agent = agent_for(profile, llm, self.toolbox.tools_for(profile))?;
        let history = agent.run(vec![Message::User(question.to_string())]).await?;
        Ok(final_answer(&history)
            .map(strip_reasoning)
            .unwrap_or_default())
    }
}

#[async_trait]
impl FunctionalTool for AskCoworker {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<AskCoworkerArgs>(
            "ask_coworker",
            &format!(
                "Ask a question to one of your coworkers ({}) and get their answer back.",
                self.roster()
            ),
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: AskCoworkerArgs = call.args()?;
        let result = match self.find(&args.coworker) {
            Some(profile) => {
                let answer = self.ask(profile, &args.question).await?;
                if answer.is_empty() {
                    format!("{} had no answer", profile.title)
                } else {
                    answer
                }
            }
            None => format!(
                "Coworker '{}' not found. Available: {}",
                args.coworker,
                self.roster()
            ),
        };

        Ok(Message::Tool {
            id: call.id.clone(),
            name: "ask_coworker".to_string(),
            result,
        })
    }
}
