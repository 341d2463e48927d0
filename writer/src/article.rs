use crate::artifact::slugify;
use crate::error::GenerationError;
use serde::Serialize;

pub const DEFAULT_WORD_COUNT: u32 = 1000;

/// A non-empty article topic whose slug is also non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let topic = raw.trim();
        if topic.is_empty() || slugify(topic).is_empty() {
            return Err(GenerationError::EmptyTopic);
        }
        Ok(Self(topic.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn slug(&self) -> String {
        slugify(&self.0)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target article length. Only the prompt enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCount(u32);

impl WordCount {
    pub fn new(count: u32) -> Self {
        if count == 0 {
            Self(DEFAULT_WORD_COUNT)
        } else {
            Self(count)
        }
    }

    /// Parses user input, falling back to the default on anything that is not
    /// a positive integer.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<u32>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for WordCount {
    fn default() -> Self {
        Self(DEFAULT_WORD_COUNT)
    }
}

impl std::fmt::Display for WordCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub topic: String,
    pub content: String,
    pub word_count: usize,
    pub filename: String,
    pub status: CompletionStatus,
}

impl GenerationResult {
    pub fn completed(topic: &Topic, content: String) -> Self {
        Self {
            topic: topic.to_string(),
            word_count: content.split_whitespace().count(),
            filename: format!("{}.md", topic.slug()),
            content,
            status: CompletionStatus::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_rejects_blank() {
        assert!(matches!(Topic::parse(""), Err(GenerationError::EmptyTopic)));
        assert!(matches!(Topic::parse("  \t\n"), Err(GenerationError::EmptyTopic)));
        assert_eq!(Topic::parse("  OWASP LLM Top 10 ").unwrap().as_str(), "OWASP LLM Top 10");
        assert_eq!(Topic::parse("..").unwrap().slug(), "..");
    }

    #[test]
    fn test_word_count_defaults() {
        assert_eq!(WordCount::parse(None).get(), 1000);
        assert_eq!(WordCount::parse(Some("abc")).get(), 1000);
        assert_eq!(WordCount::parse(Some("-5")).get(), 1000);
        assert_eq!(WordCount::parse(Some("0")).get(), 1000);
        assert_eq!(WordCount::parse(Some(" 1500 ")).get(), 1500);
    }

    #[test]
    fn test_result_counts_actual_words() {
        let topic = Topic::parse("Zero Trust for AI/ML").unwrap();
        let result =
            GenerationResult::completed(&topic, "# Title\n\nthree more  words".to_string());

        assert_eq!(result.word_count, 5);
        assert_eq!(result.filename, "zero_trust_for_ai_ml.md");
        assert_eq!(result.status, CompletionStatus::Completed);
        assert_eq!(
            serde_json::to_value(&result).unwrap()["status"],
            serde_json::json!("completed")
        );
    }
}
