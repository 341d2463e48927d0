use crate::Result;
use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition, ToolOutcome};
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches a page and reduces it to plain text small enough for a prompt.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl PageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, max_chars })
    }

    pub async fn fetch(&self, url: &str) -> ToolOutcome<String> {
        match self.request(url).await {
            Ok(html) => ToolOutcome::Found(truncate(&extract_text(&html), self.max_chars)),
            Err(err) => {
                tracing::warn!(url, error = %err, "page fetch unavailable");
                ToolOutcome::Unavailable(err.to_string())
            }
        }
    }

    async fn request(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

struct Patterns {
    hidden: Regex,
    tags: Regex,
    whitespace: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        hidden: Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
            .unwrap(),
        tags: Regex::new(r"(?s)<[^>]*>").unwrap(),
        whitespace: Regex::new(r"\s+").unwrap(),
    })
}

/// Strips scripts, styles, comments and markup, then collapses whitespace.
pub(crate) fn extract_text(html: &str) -> String {
    let patterns = patterns();
    let text = patterns.hidden.replace_all(html, " ");
    let text = patterns.tags.replace_all(&text, " ");
    let text = decode_entities(&text);
    patterns
        .whitespace
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    // &amp; goes last so "&amp;lt;" stays "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn render(outcome: ToolOutcome<String>) -> String {
    match outcome {
        ToolOutcome::Found(text) if text.is_empty() => {
            "Page contained no readable text".to_string()
        }
        ToolOutcome::Found(text) => text,
        ToolOutcome::Unavailable(reason) => format!("Failed to fetch content: {}", reason),
    }
}

#[derive(Deserialize, JsonSchema)]
struct FetchPageArgs {
    url: String,
}

#[async_trait]
impl FunctionalTool for PageFetcher {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<FetchPageArgs>(
            "fetch_url_content",
            "Fetch and extract text content from a URL.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: FetchPageArgs = call.args()?;
        let outcome = self.fetch(&args.url).await;
        Ok(Message::Tool {
            id: call.id.clone(),
            name: "fetch_url_content".to_string(),
            result: render(outcome),
        })
    }
}
