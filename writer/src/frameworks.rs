use agent::Result;
use agent::llm::Message;
use agent::tools::{FunctionalTool, ToolCall, ToolDefinition, ToolOutcome};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FrameworkRecord {
    pub name: &'static str,
    pub version: &'static str,
    pub key_points: &'static [&'static str],
    pub url: &'static str,
}

const FRAMEWORKS: &[(&str, FrameworkRecord)] = &[
    (
        "owasp",
        FrameworkRecord {
            name: "OWASP Top 10 for LLM Applications",
            version: "1.1",
            key_points: &[
                "LLM01: Prompt Injection",
                "LLM02: Insecure Output Handling",
                "LLM03: Training Data Poisoning",
                "LLM04: Model Denial of Service",
                "LLM05: Supply Chain Vulnerabilities",
                "LLM06: Sensitive Information Disclosure",
                "LLM07: Insecure Plugin Design",
                "LLM08: Excessive Agency",
                "LLM09: Overreliance",
                "LLM10: Model Theft",
            ],
            url: "https://owasp.org/www-project-top-10-for-large-language-model-applications/",
        },
    ),
    (
        "iso42001",
        FrameworkRecord {
            name: "ISO/IEC 42001:2023",
            version: "2023",
            key_points: &[
                "AI management system requirements",
                "Risk management for AI systems",
                "AI governance framework",
                "Performance evaluation metrics",
                "Continuous improvement processes",
            ],
            url: "https://www.iso.org/standard/81230.html",
        },
    ),
    (
        "nist",
        FrameworkRecord {
            name: "NIST AI Risk Management Framework",
            version: "1.0",
            key_points: &[
                "GOVERN: Governance and oversight",
                "MAP: Context and risks mapped",
                "MEASURE: Risks measured and assessed",
                "MANAGE: Risks managed and monitored",
            ],
            url: "https://www.nist.gov/itl/ai-risk-management-framework",
        },
    ),
];

pub fn keys() -> impl Iterator<Item = &'static str> {
    FRAMEWORKS.iter().map(|(key, _)| *key)
}

/// Case-insensitive lookup. A miss names the keys that do exist.
pub fn lookup(key: &str) -> ToolOutcome<&'static FrameworkRecord> {
    let wanted = key.trim().to_lowercase();
    match FRAMEWORKS.iter().find(|(k, _)| *k == wanted) {
        Some((_, record)) => ToolOutcome::Found(record),
        None => ToolOutcome::Unavailable(format!(
            "Framework '{}' not found. Available: {}",
            key,
            keys().collect::<Vec<_>>().join(", ")
        )),
    }
}

#[derive(Deserialize, JsonSchema)]
struct FrameworkArgs {
    /// one of: owasp, iso42001, nist
    framework_name: String,
}

pub struct FrameworkLookup;

#[async_trait]
impl FunctionalTool for FrameworkLookup {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<FrameworkArgs>(
            "get_security_frameworks",
            "Get information about AI security frameworks (owasp, iso42001, nist).",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: FrameworkArgs = call.args()?;
        let result = match lookup(&args.framework_name) {
            ToolOutcome::Found(record) => serde_json::to_string_pretty(record)?,
            ToolOutcome::Unavailable(reason) => reason,
        };
        Ok(Message::Tool {
            id: call.id.clone(),
            name: "get_security_frameworks".to_string(),
            result,
        })
    }
}
