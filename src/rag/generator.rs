//! Answer generation through the completion service

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::debug;

use super::RequestState;
use crate::llm::prompts::BoardPrompts;
use crate::llm::ChatCompletion;
use crate::llm::ChatMessage;
use crate::BoardRagError;
use crate::Result;

fn generation_error(e: BoardRagError) -> BoardRagError {
    match e {
        BoardRagError::Generation(_) => e,
        other => BoardRagError::Generation(other.to_string()),
    }
}

pub struct ResponseGenerator {
    llm: Arc<dyn ChatCompletion>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }

    /// System instruction followed by context and question
    #[must_use]
    pub fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
        let values = HashMap::from([("context", context), ("question", question)]);
        vec![
            ChatMessage::system(BoardPrompts::system()),
            ChatMessage::user(BoardPrompts::question().render(&values)),
        ]
    }

    /// Full answer text; tokens also go to the state's sink when it has one
    pub async fn generate(&self, state: &RequestState) -> Result<String> {
        let messages = Self::build_messages(state.formatted_context(), state.question());

        let Some(sink) = state.token_sink() else {
            return self.llm.complete(&messages).await.map_err(generation_error);
        };

        let result = self.stream_into(&messages, |token| sink.send(token)).await;
        sink.finish();
        result
    }

    async fn stream_into<F>(&self, messages: &[ChatMessage], mut on_token: F) -> Result<String>
    where
        F: FnMut(String) + Send,
    {
        let mut stream = self
            .llm
            .stream(messages)
            .await
            .map_err(generation_error)?
            .into_stream();

        let mut answer = String::new();
        while let Some(token) = stream.next().await {
            let token = token.map_err(generation_error)?;
            answer.push_str(&token);
            on_token(token);
        }

        debug!("Generated answer with {} chars", answer.chars().count());
        Ok(answer)
    }
}
