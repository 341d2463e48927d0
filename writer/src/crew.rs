use crate::article::{Topic, WordCount};
use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};

const COMBINED_TASK: &str = include_str!("prompts/combined_task.md");
const RESEARCH_TASK: &str = include_str!("prompts/research_task.md");
const WRITE_TASK: &str = include_str!("prompts/write_task.md");
const VALIDATE_TASK: &str = include_str!("prompts/validate_task.md");

/// Shape of the crew that runs a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrewProfile {
    /// one role researches and writes in a single step
    #[default]
    Single,
    /// researcher, writer and validator run in sequence
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Researcher,
    Writer,
    Validator,
    Combined,
}

impl Role {
    pub fn key(self) -> &'static str {
        match self {
            Role::Researcher => "researcher",
            Role::Writer => "writer",
            Role::Validator => "validator",
            Role::Combined => "combined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    WebSearch,
    FetchPage,
    Frameworks,
}

#[derive(Debug, Clone)]
pub struct RoleProfile {
    pub role: Role,
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub capabilities: &'static [Capability],
    pub model: String,
    pub max_iterations: usize,
    pub allow_delegation: bool,
}

impl RoleProfile {
    pub fn for_role(role: Role, models: &ModelConfig) -> Self {
        match role {
            Role::Combined => Self {
                role,
                title: "AI Security Content Generator",
                goal: "Research and write comprehensive AI security content",
                backstory: "You are an expert AI security consultant who can research, analyze, \
                    and write authoritative content on AI security topics. You have deep knowledge \
                    of OWASP, ISO 42001, NIST AI RMF, and current threats.",
                capabilities: &[Capability::WebSearch, Capability::Frameworks],
                model: models.writer.clone(),
                max_iterations: 1,
                allow_delegation: false,
            },
            Role::Researcher => Self {
                role,
                title: "AI Security Researcher",
                goal: "Find current, authoritative information on AI security threats, \
                    frameworks and mitigations",
                backstory: "You are a senior threat intelligence analyst who tracks LLM attacks, \
                    AI governance standards and incident reports. You always keep track of where \
                    each finding came from.",
                capabilities: &[
                    Capability::WebSearch,
                    Capability::FetchPage,
                    Capability::Frameworks,
                ],
                model: models.researcher.clone(),
                max_iterations: 3,
                allow_delegation: false,
            },
            Role::Writer => Self {
                role,
                title: "AI Security Content Writer",
                goal: "Turn research findings into clear, practical and well cited articles",
                backstory: "You are a technical writer who has spent years explaining security \
                    engineering to practitioners. You write structured Markdown with concrete \
                    examples and never invent sources.",
                capabilities: &[Capability::Frameworks],
                model: models.writer.clone(),
                max_iterations: 2,
                allow_delegation: true,
            },
            Role::Validator => Self {
                role,
                title: "AI Security Content Validator",
                goal: "Make sure every article is technically accurate, well sourced and ready \
                    to publish",
                backstory: "You are a meticulous security reviewer who checks framework \
                    references, citations and technical claims before anything is published.",
                capabilities: &[Capability::Frameworks],
                model: models.validator.clone(),
                max_iterations: 2,
                allow_delegation: false,
            },
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.title, self.backstory, self.goal
        )
    }
}

/// One unit of the workflow, bound to the role that performs it.
#[derive(Debug, Clone)]
pub struct Step {
    pub profile: RoleProfile,
    pub description: String,
    pub expected_output: String,
}

impl Step {
    fn new(
        profile: RoleProfile,
        template: &str,
        expected_output: String,
        topic: &Topic,
        word_count: WordCount,
    ) -> Self {
        Self {
            profile,
            description: render(template, topic, word_count),
            expected_output,
        }
    }

    /// Task message for this step, with the previous step's output appended.
    pub fn task_prompt(&self, context: Option<&str>) -> String {
        let mut prompt = format!(
            "{}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description.trim_end(),
            self.expected_output
        );
        if let Some(context) = context {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }
        prompt
    }
}

fn render(template: &str, topic: &Topic, word_count: WordCount) -> String {
    template
        .replace("{topic}", topic.as_str())
        .replace("{word_count}", &word_count.to_string())
}

/// Roles taking part in a profile, in execution order.
pub fn roles(profile: CrewProfile) -> &'static [Role] {
    match profile {
        CrewProfile::Single => &[Role::Combined],
        CrewProfile::Multi => &[Role::Researcher, Role::Writer, Role::Validator],
    }
}

/// Steps for one generation, in the order they must run.
pub fn plan(
    profile: CrewProfile,
    topic: &Topic,
    word_count: WordCount,
    models: &ModelConfig,
) -> Vec<Step> {
    roles(profile)
        .iter()
        .map(|&role| {
            let profile = RoleProfile::for_role(role, models);
            match role {
                Role::Combined => Step::new(
                    profile,
                    COMBINED_TASK,
                    format!(
                        "A complete {}-word article in Markdown format with research citations",
                        word_count
                    ),
                    topic,
                    word_count,
                ),
                Role::Researcher => Step::new(
                    profile,
                    RESEARCH_TASK,
                    "Research findings in Markdown: key developments, relevant framework \
                     controls, threats and mitigations, each with its source URL"
                        .to_string(),
                    topic,
                    word_count,
                ),
                Role::Writer => Step::new(
                    profile,
                    WRITE_TASK,
                    format!(
                        "A complete {}-word draft article in Markdown format with citations",
                        word_count
                    ),
                    topic,
                    word_count,
                ),
                Role::Validator => Step::new(
                    profile,
                    VALIDATE_TASK,
                    "The final approved article in Markdown, followed by a short \
                     '## Validation Notes' section listing what was checked or corrected"
                        .to_string(),
                    topic,
                    word_count,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> ModelConfig {
        ModelConfig {
            researcher: "research-model".to_string(),
            writer: "writer-model".to_string(),
            validator: "validator-model".to_string(),
        }
    }

    #[test]
    fn test_single_profile() {
        let topic = Topic::parse("Prompt Injection Prevention").unwrap();
        let steps = plan(CrewProfile::Single, &topic, WordCount::new(800), &models());

        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.profile.role, Role::Combined);
        assert_eq!(step.profile.max_iterations, 1);
        assert!(!step.profile.allow_delegation);
        assert_eq!(step.profile.model, "writer-model");
        assert!(step.description.contains("800-word article on: \"Prompt Injection Prevention\""));
        assert!(!step.description.contains("{topic}"));
        assert_eq!(
            step.expected_output,
            "A complete 800-word article in Markdown format with research citations"
        );
    }

    #[test]
    fn test_multi_profile_order_and_limits() {
        let topic = Topic::parse("AI Model Governance").unwrap();
        let steps = plan(CrewProfile::Multi, &topic, WordCount::default(), &models());

        let summary: Vec<_> = steps
            .iter()
            .map(|s| {
                (
                    s.profile.role,
                    s.profile.max_iterations,
                    s.profile.allow_delegation,
                    s.profile.model.as_str(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (Role::Researcher, 3, false, "research-model"),
                (Role::Writer, 2, true, "writer-model"),
                (Role::Validator, 2, false, "validator-model"),
            ]
        );
        assert!(steps[0].profile.capabilities.contains(&Capability::FetchPage));
        assert!(steps.iter().all(|s| s.description.contains("AI Model Governance")));
    }

    #[test]
    fn test_task_prompt_context() {
        let topic = Topic::parse("OWASP LLM Top 10").unwrap();
        let step = plan(CrewProfile::Multi, &topic, WordCount::default(), &models()).remove(1);

        let without = step.task_prompt(None);
        assert!(!without.contains("context you're working with"));

        let with = step.task_prompt(Some("finding: LLM01 prompt injection"));
        assert!(with.ends_with(
            "This is the context you're working with:\nfinding: LLM01 prompt injection"
        ));
        assert!(with.contains(&step.expected_output));
    }

    #[test]
    fn test_system_prompt() {
        let profile = RoleProfile::for_role(Role::Validator, &models());
        let prompt = profile.system_prompt();
        assert!(prompt.starts_with("You are AI Security Content Validator."));
        assert!(prompt.contains("Your personal goal is: Make sure every article"));
    }
}
