use crate::domain::model::{GenerationParams, GenerationRequest};
use crate::domain::ports::GenerativeModel;
use crate::domain::schema::PDF_MIME_TYPE;
use crate::utils::error::{EtlError, Result};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay unit; the k-th retry waits `backoff * k`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_seconds: f64) -> Self {
        Self {
            max_retries,
            backoff: Duration::try_from_secs_f64(backoff_seconds).unwrap_or(Duration::ZERO),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, 1.0)
    }
}

/// Sends one document plus the instructions to the model, retrying empty or failed replies.
pub struct ExtractionRequester<M: GenerativeModel> {
    model: M,
    instruction: String,
    params: GenerationParams,
    retry: RetryPolicy,
}

impl<M: GenerativeModel> ExtractionRequester<M> {
    pub fn new(
        model: M,
        instruction: impl Into<String>,
        params: GenerationParams,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            instruction: instruction.into(),
            params,
            retry,
        }
    }

    pub async fn request(&self, document: &str, payload: &[u8]) -> Result<String> {
        let max_attempts = self.retry.max_attempts();
        let request = GenerationRequest {
            instruction: &self.instruction,
            payload,
            mime_type: PDF_MIME_TYPE,
            params: self.params,
        };

        for attempt in 1..=max_attempts {
            match self.model.generate(&request).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::debug!(
                        "Model replied for {} on attempt {}/{} ({} chars)",
                        document,
                        attempt,
                        max_attempts,
                        text.len()
                    );
                    return Ok(text);
                }
                Ok(_) => tracing::warn!(
                    "Model returned empty response for {} (attempt {}/{})",
                    document,
                    attempt,
                    max_attempts
                ),
                Err(e) => tracing::warn!(
                    "Error during model generation for {} (attempt {}/{}): {}",
                    document,
                    attempt,
                    max_attempts,
                    e
                ),
            }

            if attempt < max_attempts {
                let delay = self.retry.delay_for(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(EtlError::RetriesExhausted {
            document: document.to_string(),
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays scripted replies in order; `None` stands for a failed call.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Option<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Option<&str>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let model = Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
                calls: calls.clone(),
            };
            (model, calls)
        }
    }

    #[async_trait::async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.mime_type, "application/pdf");
            let reply = self.replies.lock().unwrap().pop_front().flatten();
            reply.ok_or_else(|| EtlError::ModelError {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    fn requester(model: ScriptedModel, max_retries: u32) -> ExtractionRequester<ScriptedModel> {
        ExtractionRequester::new(
            model,
            "extract",
            GenerationParams::default(),
            RetryPolicy::new(max_retries, 0.0),
        )
    }

    #[tokio::test]
    async fn test_first_reply_is_returned() {
        let (model, calls) = ScriptedModel::new(vec![Some("{}")]);
        let text = requester(model, 2).request("a.pdf", b"%PDF").await.unwrap();
        assert_eq!(text, "{}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_and_failed_replies_are_retried() {
        let (model, calls) = ScriptedModel::new(vec![None, Some("  \n"), Some("[{}]")]);
        let text = requester(model, 2).request("a.pdf", b"%PDF").await.unwrap();
        assert_eq!(text, "[{}]");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_always_failing_model_is_called_max_retries_plus_one() {
        let (model, calls) = ScriptedModel::new(vec![]);
        let err = requester(model, 2).request("a.pdf", b"%PDF").await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            EtlError::RetriesExhausted { ref document, attempts: 3 } if document == "a.pdf"
        ));
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let (model, calls) = ScriptedModel::new(vec![Some("")]);
        assert!(requester(model, 0).request("a.pdf", b"%PDF").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Always fails and records when each call arrived.
    struct TimedFailingModel {
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait::async_trait]
    impl GenerativeModel for TimedFailingModel {
        async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            Err(EtlError::ModelError {
                status: 500,
                message: "internal".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_wait_backoff_times_retry_number() {
        let requester = ExtractionRequester::new(
            TimedFailingModel {
                calls: Mutex::new(Vec::new()),
            },
            "extract",
            GenerationParams::default(),
            RetryPolicy::new(2, 1.0),
        );

        let start = tokio::time::Instant::now();
        assert!(requester.request("a.pdf", b"%PDF").await.is_err());

        let calls = requester.model.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0] - start, Duration::ZERO);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
        // 最後一次失敗後不再等待
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let policy = RetryPolicy::new(3, 1.5);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_backoff_falls_back_to_zero() {
        assert_eq!(RetryPolicy::new(1, -1.0).backoff, Duration::ZERO);
        assert_eq!(RetryPolicy::new(1, f64::NAN).backoff, Duration::ZERO);
    }
}
