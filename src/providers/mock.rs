/*!
 * Mock collaborator for testing.
 *
 * This module provides a scripted backend that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, prefixing each text with `[TRANSLATED]`
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::new(behavior)` - Any other `MockBehavior`
 *
 * Every batch call is recorded so tests can assert on what was sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::translation::{CancellationToken, ContextClassifier, DocumentContext, TranslationBackend};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Returns every text unchanged
    Echo,
    /// Always fails with an error
    Failing,
    /// Fails only the given zero-based call
    FailOnCall { call: usize },
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Succeeds with `delta` more (or fewer) entries than requested
    WrongLength { delta: isize },
    /// Fails with an authentication error
    Unauthorized,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// One recorded batch call
#[derive(Debug, Clone)]
pub struct MockCall {
    pub texts: Vec<String>,
    pub document_context: String,
    pub section_context: Option<String>,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Batch calls made so far
    request_count: Arc<AtomicUsize>,
    /// Cancel the token once this many calls have been made
    cancel_after: Option<(usize, CancellationToken)>,
    /// Classification returned by `classify_document`
    context: Option<DocumentContext>,
    /// Recorded batch calls
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            cancel_after: None,
            context: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Cancel `token` during the `calls`-th batch call
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    /// Classification to return
    pub fn with_context(mut self, context: DocumentContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Number of batch calls made
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of recorded batch calls
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn translate(texts: &[String]) -> Vec<String> {
        texts.iter().map(|text| format!("[TRANSLATED] {}", text)).collect()
    }
}

#[async_trait]
impl TranslationBackend for MockProvider {
    async fn translate_batch(
        &self,
        texts: &[String],
        document_context: &str,
        section_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            texts: texts.to_vec(),
            document_context: document_context.to_string(),
            section_context: section_context.map(str::to_string),
        });
        if let Some((after, token)) = &self.cancel_after {
            if count + 1 >= *after {
                token.cancel();
            }
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::translate(texts)),

            MockBehavior::Echo => Ok(texts.to_vec()),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::FailOnCall { call } => {
                if count == call {
                    Err(ProviderError::ConnectionError(format!("Simulated failure on call #{}", call)))
                } else {
                    Ok(Self::translate(texts))
                }
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::translate(texts))
                }
            }

            MockBehavior::WrongLength { delta } => {
                let mut translations = Self::translate(texts);
                if delta < 0 {
                    translations.truncate(texts.len().saturating_sub(delta.unsigned_abs()));
                } else {
                    translations.extend((0..delta).map(|i| format!("[EXTRA] {}", i)));
                }
                Ok(translations)
            }

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Simulated invalid key".to_string())),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Self::translate(texts))
            }
        }
    }
}

#[async_trait]
impl ContextClassifier for MockProvider {
    async fn classify_document(&self, _sample: &str) -> Result<DocumentContext, ProviderError> {
        match self.behavior {
            MockBehavior::Failing | MockBehavior::Unauthorized => {
                Err(ProviderError::ParseError("Simulated classification failure".to_string()))
            }
            _ => Ok(self.context.clone().unwrap_or_else(|| DocumentContext {
                document_type: "mock agreement".to_string(),
                ..DocumentContext::generic()
            })),
        }
    }
}
