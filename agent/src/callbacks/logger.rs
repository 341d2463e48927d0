use crate::Result;
use crate::callbacks::Callback;
use crate::llm::Message;
use async_trait::async_trait;

/// Logs each turn of an agent's history, emitting only what changed since the
/// previous turn.
pub struct MessageLogger {
    name: String,
    last_hashes: Vec<u64>,
    step: u32,
}

impl MessageLogger {
    pub fn new(name: &str) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            last_hashes: Vec::new(),
            step: 0,
        })
    }

    fn display_messages(&self, messages: &[Message]) {
        for message in messages {
            tracing::debug!(agent = %self.name, step = self.step, "{}", message);
        }
    }

    /// Number of leading messages unchanged since the last turn.
    fn prefix_match_len(&self, new_hashes: &[u64]) -> usize {
        new_hashes
            .iter()
            .zip(self.last_hashes.iter())
            .take_while(|&(a, b)| *a == *b)
            .count()
    }

    fn new_messages<'a>(
        &self,
        messages: &'a [Message],
        new_hashes: &[u64],
    ) -> Option<&'a [Message]> {
        if new_hashes.len() < self.last_hashes.len()
            || self.prefix_match_len(new_hashes) != self.last_hashes.len()
        {
            None
        } else {
            Some(&messages[self.last_hashes.len()..])
        }
    }
}

#[async_trait]
impl Callback for MessageLogger {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        let new_hashes = messages.iter().map(Message::get_hash).collect::<Vec<_>>();

        match self.new_messages(&messages, &new_hashes) {
            Some(added) => self.display_messages(added),
            None => {
                tracing::debug!(agent = %self.name, step = self.step, "history cleared");
                self.display_messages(&messages);
            }
        }

        self.step += 1;
        self.last_hashes = new_hashes;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::MessageLogger;
    use crate::Result;
    use crate::callbacks::Callback;
    use crate::llm::Message;

    #[tokio::test]
    async fn test_logger_tracks_new_messages() -> Result<()> {
        let mut logger = MessageLogger::new("researcher");

        let history = vec![
            Message::System("be brief".to_string()),
            Message::User("research owasp".to_string()),
        ];
        let history = logger.call(history).await?;
        assert_eq!(logger.step, 1);

        let mut extended = history.clone();
        extended.push(Message::Assistant("done".to_string(), vec![]));
        let hashes = extended.iter().map(Message::get_hash).collect::<Vec<_>>();
        let added = logger.new_messages(&extended, &hashes).unwrap();
        assert_eq!(added.len(), 1);

        let rewritten = vec![Message::User("summary".to_string())];
        let hashes = rewritten.iter().map(Message::get_hash).collect::<Vec<_>>();
        assert!(logger.new_messages(&rewritten, &hashes).is_none());

        let returned = logger.call(extended).await?;
        assert_eq!(returned.len(), 3);
        assert_eq!(logger.step, 2);

        Ok(())
    }
}
