use super::ModelService;
use crate::prompts::Prompt;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure(String),
}

/// Model double that replays scripted replies in order, cycling when it
/// runs out.
#[derive(Clone)]
pub struct MockModelClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Text(reply.into()));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn received_prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for MockModelClient {
    async fn invoke(&self, prompt: &Prompt) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.clone());

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(r#"["apple", "banana", "cherry"]"#.to_string());
        }

        match &replies[(count - 1) % replies.len()] {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
