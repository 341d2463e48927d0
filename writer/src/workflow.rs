use crate::article::{GenerationResult, Topic, WordCount};
use crate::artifact::ArtifactStore;
use crate::config::{Config, ModelConfig, RetryConfig};
use crate::crew::{self, Capability, CrewProfile, RoleProfile, Step};
use crate::delegate::AskCoworker;
use crate::error::GenerationError;
use crate::frameworks::FrameworkLookup;
use agent::callbacks::MessageLogger;
use agent::llm::{LLM, Message, OpenAI};
use agent::tools::{PageFetcher, Tool, WebSearch};
use agent::{Agent, AgentBuilder, FinalAnswer, final_answer};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Resolves a model identifier to a completion client.
pub type LlmFactory = Arc<dyn Fn(&str) -> Arc<dyn LLM + Send + Sync> + Send + Sync>;

/// Outside-world facades the roles may be given.
#[derive(Clone)]
pub struct Toolbox {
    search: WebSearch,
    fetcher: PageFetcher,
}

impl Toolbox {
    pub fn new(search: WebSearch, fetcher: PageFetcher) -> Self {
        Self { search, fetcher }
    }

    pub fn from_config(config: &Config) -> agent::Result<Self> {
        Ok(Self {
            search: WebSearch::new(&config.search.endpoint, config.search.max_results),
            fetcher: PageFetcher::new(config.fetch.timeout(), config.fetch.max_chars)?,
        })
    }

    pub fn search(&self) -> &WebSearch {
        &self.search
    }

    pub fn tools_for(&self, profile: &RoleProfile) -> Vec<Box<dyn Tool + Send>> {
        profile
            .capabilities
            .iter()
            .map(|capability| -> Box<dyn Tool + Send> {
                match capability {
                    Capability::WebSearch => Box::new(self.search.clone()),
                    Capability::FetchPage => Box::new(self.fetcher.clone()),
                    Capability::Frameworks => Box::new(FrameworkLookup),
                }
            })
            .collect()
    }
}

/// Whole-workflow retry on transient provider faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    /// `base_delay` plus a uniform jitter in `[0, jitter]`, whole seconds.
    pub fn backoff(&self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=self.jitter.as_secs());
        self.base_delay + Duration::from_secs(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        (&RetryConfig::default()).into()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_secs(config.base_delay_secs),
            jitter: Duration::from_secs(config.jitter_secs),
        }
    }
}

/// Builds the agent that performs one role's work.
pub(crate) fn agent_for(
    profile: &RoleProfile,
    llm: Arc<dyn LLM + Send + Sync>,
    tools: Vec<Box<dyn Tool + Send>>,
) -> agent::Result<Agent> {
    AgentBuilder::new()
        .llm(llm)
        .system_prompt(profile.system_prompt())
        .tools(tools)
        .callback(MessageLogger::new(profile.role.key()))
        .stop_condition(Box::new(FinalAnswer))
        .max_iterations(profile.max_iterations)
        .build()
}

/// Drops `<think>...</think>` blocks some reasoning models prepend to answers.
pub(crate) fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Sequential research and writing workflow with bounded retry.
///
/// Holds no per-run state, so one instance can serve any number of runs.
pub struct Workflow {
    profile: CrewProfile,
    models: ModelConfig,
    llms: LlmFactory,
    toolbox: Toolbox,
    retry: RetryPolicy,
    store: ArtifactStore,
}

impl Workflow {
    pub fn new(
        profile: CrewProfile,
        models: ModelConfig,
        llms: LlmFactory,
        toolbox: Toolbox,
        retry: RetryPolicy,
        store: ArtifactStore,
    ) -> Self {
        Self {
            profile,
            models,
            llms,
            toolbox,
            retry,
            store,
        }
    }

    /// Workflow talking to the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &Config, api_key: &str) -> agent::Result<Self> {
        let api_base = config.api_base.clone();
        let api_key = api_key.to_string();
        let llms: LlmFactory = Arc::new(move |model: &str| -> Arc<dyn LLM + Send + Sync> {
            OpenAI::with_endpoint(model.to_string(), &api_base, &api_key)
        });

        Ok(Self::new(
            config.profile,
            config.models.clone(),
            llms,
            Toolbox::from_config(config)?,
            RetryPolicy::from(&config.retry),
            ArtifactStore::new(&config.output_dir),
        ))
    }

    pub fn profile(&self) -> CrewProfile {
        self.profile
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Generates, saves and returns an article on `topic`.
    ///
    /// Transient provider faults restart the whole crew from the first step
    /// after a backoff, up to `max_attempts` runs in total. Any other fault is
    /// returned at once.
    pub async fn run(
        &self,
        topic: &Topic,
        word_count: WordCount,
    ) -> Result<GenerationResult, GenerationError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        let content = loop {
            tracing::info!(
                topic = %topic,
                word_count = word_count.get(),
                profile = ?self.profile,
                attempt,
                max_attempts,
                "starting generation"
            );

            match self.run_steps(topic, word_count).await {
                Ok(content) => break content,
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let wait = self.retry.backoff();
                    tracing::warn!(
                        error = %err,
                        wait_secs = wait.as_secs(),
                        "service issue, retrying {}/{}",
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(GenerationError::Exhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => return Err(GenerationError::Agent(err)),
            }
        };

        let result = GenerationResult::completed(topic, content);
        self.store.save(&topic.slug(), &result.content).await?;

        tracing::info!(
            filename = %result.filename,
            word_count = result.word_count,
            "generation complete"
        );
        Ok(result)
    }

    async fn run_steps(&self, topic: &Topic, word_count: WordCount) -> agent::Result<String> {
        let steps = crew::plan(self.profile, topic, word_count, &self.models);

        let mut context: Option<String> = None;
        for step in &steps {
            context = Some(self.run_step(step, context.as_deref()).await?);
        }

        context.ok_or(agent::Error::AgentWorkflowError(
            "crew has no steps".to_string(),
        ))
    }

    async fn run_step(&self, step: &Step, context: Option<&str>) -> agent::Result<String> {
        let profile = &step.profile;
        tracing::info!(role = profile.role.key(), model = %profile.model, "step started");

        let mut tools = self.toolbox.tools_for(profile);
        if profile.allow_delegation {
            let coworkers = crew::roles(self.profile)
                .iter()
                .filter(|&&role| role != profile.role)
                .map(|&role| RoleProfile::for_role(role, &self.models))
                .collect::<Vec<_>>();
            if !coworkers.is_empty() {
                tools.push(Box::new(AskCoworker::new(
                    coworkers,
                    self.llms.clone(),
                    self.toolbox.clone(),
                )));
            }
        }

        let llm = (self.llms)(&profile.model);
        let mut agent = agent_for(profile, llm, tools)?;
        let history = agent
            .run(vec![Message::User(step.task_prompt(context))])
            .await?;

        let answer = final_answer(&history)
            .map(strip_reasoning)
            .filter(|answer| !answer.is_empty())
            .ok_or_else(|| {
                agent::Error::LLMResponseError(format!("{} gave an empty answer", profile.title))
            })?;

        tracing::info!(
            role = profile.role.key(),
            words = answer.split_whitespace().count(),
            "step finished"
        );
        Ok(answer)
    }
}
