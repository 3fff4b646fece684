//! Reply generation trait

use async_trait::async_trait;

use crate::error::StageError;
use crate::stage::{Reply, ReplyRequest};

/// Reply-generation collaborator
///
/// Takes the transcribed user text plus the agent profile's instructions
/// and produces the conversational reply that will be synthesized.
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn ReplyGenerator> = Arc::new(HttpReplyGenerator::new(config)?);
/// let request = ReplyRequest::new("what are your hours", profile.system_prompt.clone())
///     .with_max_tokens(profile.max_reply_tokens);
/// let reply = llm.generate_reply(request).await?;
/// println!("{}", reply.text);
/// ```
#[async_trait]
pub trait ReplyGenerator: Send + Sync + 'static {
    /// Generate a reply for the transcribed utterance
    async fn generate_reply(&self, request: ReplyRequest) -> Result<Reply, StageError>;

    /// Provider label for logging and response metadata
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLlm;

    #[async_trait]
    impl ReplyGenerator for MockLlm {
        async fn generate_reply(&self, request: ReplyRequest) -> Result<Reply, StageError> {
            Ok(Reply::new(
                format!("echo: {}", request.user_text),
                "mock-llm",
                "mock-model",
            ))
        }

        fn provider_name(&self) -> &str {
            "mock-llm"
        }
    }

    #[tokio::test]
    async fn test_mock_reply() {
        let llm = MockLlm;
        let request = ReplyRequest::new("hello", "You are helpful");
        let reply = llm.generate_reply(request).await.unwrap();
        assert_eq!(reply.text, "echo: hello");
        assert_eq!(reply.model, "mock-model");
    }
}
