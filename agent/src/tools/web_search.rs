use crate::Result;
use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition, ToolOutcome};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl std::fmt::Display for SearchHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Title: {}\nURL: {}\nSnippet: {}\n",
            self.title, self.url, self.snippet
        )
    }
}

/// Web search backed by the DuckDuckGo instant answer API.
#[derive(Clone)]
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl WebSearch {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.duckduckgo.com/";

    pub fn new(endpoint: &str, max_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            max_results,
        }
    }

    pub async fn search(&self, query: &str) -> ToolOutcome<Vec<SearchHit>> {
        match self.request(query).await {
            Ok(answer) => ToolOutcome::Found(answer.hits(self.max_results)),
            Err(err) => {
                tracing::warn!(query, error = %err, "web search unavailable");
                ToolOutcome::Unavailable(err.to_string())
            }
        }
    }

    async fn request(&self, query: &str) -> std::result::Result<InstantAnswer, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENDPOINT, 5)
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn collect(&self, hits: &mut Vec<SearchHit>) {
        match self {
            RelatedTopic::Entry { text, first_url } => hits.push(SearchHit {
                title: title_of(text, first_url),
                url: first_url.clone(),
                snippet: text.clone(),
            }),
            RelatedTopic::Group { topics } => topics.iter().for_each(|t| t.collect(hits)),
        }
    }
}

impl InstantAnswer {
    fn hits(&self, max_results: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        if !self.abstract_text.is_empty() {
            hits.push(SearchHit {
                title: self.heading.clone(),
                url: self.abstract_url.clone(),
                snippet: self.abstract_text.clone(),
            });
        }
        self.related_topics.iter().for_each(|t| t.collect(&mut hits));
        hits.truncate(max_results);
        hits
    }
}

fn title_of(text: &str, url: &str) -> String {
    if let Some((title, _)) = text.split_once(" - ") {
        return title.trim().to_string();
    }
    url.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace('_', " "))
        .unwrap_or_else(|| text.to_string())
}

fn render(query: &str, outcome: ToolOutcome<Vec<SearchHit>>) -> String {
    match outcome {
        ToolOutcome::Found(hits) if hits.is_empty() => {
            format!("No results found for '{}'", query)
        }
        ToolOutcome::Found(hits) => hits
            .iter()
            .map(SearchHit::to_string)
            .collect::<Vec<_>>()
            .join("\n---\n"),
        ToolOutcome::Unavailable(reason) => format!("Search failed: {}", reason),
    }
}

#[derive(Deserialize, JsonSchema)]
struct WebSearchArgs {
    query: String,
}

#[async_trait]
impl FunctionalTool for WebSearch {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<WebSearchArgs>(
            "web_search",
            "Search the web for current information on AI security topics.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: WebSearchArgs = call.args()?;
        let outcome = self.search(&args.query).await;
        Ok(Message::Tool {
            id: call.id.clone(),
            name: "web_search".to_string(),
            result: render(&args.query, outcome),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{InstantAnswer, SearchHit, WebSearch, render};
    use crate::llm::Message;
    use crate::test_server;
    use crate::tools::{FunctionalTool, ToolCall, ToolOutcome};

    const ANSWER: &str = r#"{
        "Heading": "Prompt injection",
        "AbstractText": "Prompt injection is a family of attacks on LLM applications.",
        "AbstractURL": "https://en.wikipedia.org/wiki/Prompt_injection",
        "RelatedTopics": [
            {"Text": "Jailbreak - Bypassing model safeguards.", "FirstURL": "https://duckduckgo.com/Jailbreak", "Icon": {}},
            {"Name": "Security", "Topics": [
                {"Text": "Data poisoning of training sets.", "FirstURL": "https://duckduckgo.com/Data_poisoning"},
                {"Text": "Model theft - Extraction of weights.", "FirstURL": "https://duckduckgo.com/Model_theft"}
            ]},
            {"Text": "OWASP - Open Worldwide Application Security Project.", "FirstURL": "https://duckduckgo.com/OWASP"},
            {"Text": "NIST - National Institute of Standards.", "FirstURL": "https://duckduckgo.com/NIST"}
        ]
    }"#;

    #[test]
    fn test_hits_are_flattened_and_capped() {
        let answer: InstantAnswer = serde_json::from_str(ANSWER).unwrap();
        let hits = answer.hits(5);

        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].title, "Prompt injection");
        assert_eq!(hits[1].title, "Jailbreak");
        assert_eq!(hits[2].title, "Data poisoning");
        assert_eq!(hits[2].url, "https://duckduckgo.com/Data_poisoning");
        assert_eq!(hits[4].title, "OWASP");
    }

    #[test]
    fn test_empty_answer() {
        let answer: InstantAnswer = serde_json::from_str("{}").unwrap();
        assert!(answer.hits(5).is_empty());
        assert_eq!(
            render("nothing", ToolOutcome::Found(vec![])),
            "No results found for 'nothing'"
        );
    }

    #[test]
    fn test_render() {
        let hits = vec![
            SearchHit {
                title: "a".to_string(),
                url: "https://a".to_string(),
                snippet: "first".to_string(),
            },
            SearchHit {
                title: "b".to_string(),
                url: "https://b".to_string(),
                snippet: "second".to_string(),
            },
        ];
        assert_eq!(
            render("q", ToolOutcome::Found(hits)),
            "Title: a\nURL: https://a\nSnippet: first\n\n---\nTitle: b\nURL: https://b\nSnippet: second\n"
        );
        assert_eq!(
            render("q", ToolOutcome::Unavailable("timed out".to_string())),
            "Search failed: timed out"
        );
    }

    #[tokio::test]
    async fn test_search_against_endpoint() {
        let (base, _) = test_server::serve("200 OK", ANSWER).await;

        let hits = WebSearch::new(&base, 2).search("prompt injection").await.found().unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Prompt_injection");
    }

    #[tokio::test]
    async fn test_search_error_status_is_unavailable() {
        let (base, _) = test_server::serve("503 Service Unavailable", "{}").await;

        let outcome = WebSearch::new(&base, 5).search("prompt injection").await;

        assert!(matches!(outcome, ToolOutcome::Unavailable(ref reason) if reason.contains("503")));
    }

    #[tokio::test]
    async fn test_search_unreachable_is_soft_failure() {
        let mut search = WebSearch::new("http://127.0.0.1:9/", 5);
        assert!(!search.search("owasp").await.is_found());

        let message = search
            .invoke_fn(&ToolCall {
                id: "call1".to_string(),
                name: "web_search".to_string(),
                args: "{\"query\":\"owasp\"}".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(
            message,
            Message::Tool { result, .. } if result.starts_with("Search failed: ")
        ));
    }
}
