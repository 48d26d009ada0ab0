/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Echoes every segment with a `[TRANSLATED]` prefix
 * - `MockProvider::wrong_count()` - Answers with one segment too many
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::empty()` - Answers with an empty body
 * - `MockProvider::scripted(..)` - Plays back a fixed list of replies
 *
 * Every prompt the provider receives is recorded for later inspection.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::batch::SEGMENT_DELIMITER;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one translated segment per input segment
    Working,
    /// Succeeds but returns one segment more than it received
    WrongCount,
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
}

/// A single reply in a scripted conversation
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Translate the prompt like `MockBehavior::Working`
    Echo,
    /// Answer with one segment too many
    WrongCount,
    /// Fail with a simulated server error
    Fail,
    /// Answer with a fixed text
    Text(String),
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode once the script is exhausted
    behavior: MockBehavior,
    /// Requests received so far
    request_count: Arc<AtomicUsize>,
    /// Prompts received, in order
    requests: Arc<Mutex<Vec<String>>>,
    /// Replies played back before falling back to `behavior`
    script: Arc<Mutex<VecDeque<MockReply>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock provider that always returns a wrong segment count
    pub fn wrong_count() -> Self {
        Self::new(MockBehavior::WrongCount)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that plays back `replies`, then behaves like `working()`
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        let provider = Self::working();
        provider.script.lock().extend(replies);
        provider
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Translate every segment of a joined batch prompt
    pub fn echo_translation(text: &str) -> String {
        text.split(SEGMENT_DELIMITER)
            .map(|segment| format!("[TRANSLATED] {}", segment))
            .collect::<Vec<_>>()
            .join(SEGMENT_DELIMITER)
    }

    fn wrong_count_reply(text: &str) -> String {
        format!("{}{}[EXTRA SEGMENT]", Self::echo_translation(text), SEGMENT_DELIMITER)
    }

    fn simulated_failure(count: usize) -> ProviderError {
        ProviderError::ApiError {
            message: format!("Simulated provider failure (request #{})", count + 1),
            status_code: 503,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            script: Arc::clone(&self.script),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(text.to_string());

        let scripted = self.script.lock().pop_front();
        if let Some(reply) = scripted {
            return match reply {
                MockReply::Echo => Ok(Self::echo_translation(text)),
                MockReply::WrongCount => Ok(Self::wrong_count_reply(text)),
                MockReply::Fail => Err(Self::simulated_failure(count)),
                MockReply::Text(fixed) => Ok(fixed),
            };
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::echo_translation(text)),

            MockBehavior::WrongCount => Ok(Self::wrong_count_reply(text)),

            MockBehavior::Failing => Err(Self::simulated_failure(count)),

            MockBehavior::Empty => Ok(String::new()),
        }
    }
}
