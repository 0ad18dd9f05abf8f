use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::retry::with_retry;
use crate::config::AzureOpenAiConfig;

/// Embedding dimension of text-embedding-ada-002.
pub const ADA_002_DIM: usize = 1536;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("cannot reach embedding service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("embedding service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("embedding count mismatch: sent {sent}, received {received}")]
    CountMismatch { sent: usize, received: usize },
}

/// Embedding model abstraction.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    /// Order-preserving: one vector per input string.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    fn dimension(&self) -> usize;
}

/// Allow shared references to be used wherever an owned embedder is
/// expected, e.g. a test that inspects the embedder after the run.
impl<T: Embedder + ?Sized> Embedder for &T {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Applies a bounded retry-with-backoff policy to every call of the
/// wrapped embedder, single queries and batches alike. A transient
/// failure on any embedding call gets one more chance before surfacing.
pub struct RetryingEmbedder<E> {
    inner: E,
    attempts: usize,
    backoff: Duration,
}

impl<E: Embedder> RetryingEmbedder<E> {
    pub fn new(inner: E, attempts: usize, backoff: Duration) -> Self {
        Self {
            inner,
            attempts,
            backoff,
        }
    }
}

impl<E: Embedder> Embedder for RetryingEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        with_retry(self.attempts, self.backoff, || self.inner.embed(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        with_retry(self.attempts, self.backoff, || self.inner.embed_batch(texts))
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

/// Azure OpenAI embeddings client.
///
/// All passages of a document go through one wide `embed_batch` call; the
/// request carries a hard timeout so a hung collaborator fails instead of
/// stalling the pipeline.
pub struct AzureEmbedder {
    config: AzureOpenAiConfig,
    client: reqwest::blocking::Client,
}

impl AzureEmbedder {
    pub fn new(config: AzureOpenAiConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedder for AzureEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::ResponseParsing("empty response for single input".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.operation_url("embeddings");
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&EmbeddingsRequest { input: texts })
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingError::Connection(self.config.endpoint.clone())
                } else if e.is_timeout() {
                    EmbeddingError::HttpClient(format!(
                        "request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    EmbeddingError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .map_err(|e| EmbeddingError::ResponseParsing(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                sent: texts.len(),
                received: parsed.data.len(),
            });
        }

        // The index field is authoritative for input order.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        ADA_002_DIM
    }
}

/// Deterministic embedder for tests. Produces a stable unit vector per
/// input text with no network involved.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| deterministic_vector(t, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Hash the text bytes into a stable L2-normalized vector.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let bytes = text.as_bytes();
    let mut vec = vec![0.0f32; dim];

    for (i, slot) in vec.iter_mut().enumerate() {
        let byte_idx = i % bytes.len().max(1);
        *slot = (bytes.get(byte_idx).copied().unwrap_or(0) as f32 + i as f32) / 255.0;
    }

    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut vec {
            *val /= norm;
        }
    }

    vec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_embed_returns_requested_dimension() {
        let embedder = MockEmbedder::new(16);
        let vec = embedder.embed("informed consent").unwrap();
        assert_eq!(vec.len(), 16);
        assert_eq!(embedder.dimension(), 16);
    }

    #[test]
    fn mock_embed_batch_is_order_preserving() {
        let embedder = MockEmbedder::default();
        let texts = ["purpose text", "risk text", "benefit text"];
        let vecs = embedder.embed_batch(&texts).unwrap();

        assert_eq!(vecs.len(), 3);
        assert_eq!(vecs[0], embedder.embed("purpose text").unwrap());
        assert_eq!(vecs[2], embedder.embed("benefit text").unwrap());
    }

    #[test]
    fn mock_embed_is_deterministic() {
        let embedder = MockEmbedder::default();
        assert_eq!(
            embedder.embed("same text").unwrap(),
            embedder.embed("same text").unwrap()
        );
    }

    #[test]
    fn mock_embed_different_texts_differ() {
        let embedder = MockEmbedder::default();
        assert_ne!(
            embedder.embed("text A").unwrap(),
            embedder.embed("text B").unwrap()
        );
    }

    #[test]
    fn mock_embed_is_l2_normalized() {
        let embedder = MockEmbedder::default();
        let vec = embedder.embed("normalization check").unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "expected unit norm, got {norm}");
    }

    /// Fails the first call with a rate limit, succeeds afterwards.
    struct FlakyEmbedder {
        calls: std::cell::Cell<usize>,
    }

    impl Embedder for FlakyEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 1 {
                Err(EmbeddingError::Api {
                    status: 429,
                    body: "rate limited".into(),
                })
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 1 {
                Err(EmbeddingError::Api {
                    status: 429,
                    body: "rate limited".into(),
                })
            } else {
                Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
            }
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn retrying_embedder_recovers_single_query_from_transient_failure() {
        let flaky = FlakyEmbedder {
            calls: std::cell::Cell::new(0),
        };
        let embedder = RetryingEmbedder::new(&flaky, 2, Duration::ZERO);

        assert!(embedder.embed("Clinical Study Risks").is_ok());
        assert_eq!(flaky.calls.get(), 2, "expected exactly one retry");
    }

    #[test]
    fn retrying_embedder_gives_up_after_bounded_attempts() {
        struct AlwaysThrottled {
            calls: std::cell::Cell<usize>,
        }

        impl Embedder for AlwaysThrottled {
            fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                self.calls.set(self.calls.get() + 1);
                Err(EmbeddingError::Api {
                    status: 429,
                    body: "rate limited".into(),
                })
            }

            fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                self.calls.set(self.calls.get() + 1);
                Err(EmbeddingError::Api {
                    status: 429,
                    body: "rate limited".into(),
                })
            }

            fn dimension(&self) -> usize {
                2
            }
        }

        let throttled = AlwaysThrottled {
            calls: std::cell::Cell::new(0),
        };
        let embedder = RetryingEmbedder::new(&throttled, 2, Duration::ZERO);

        assert!(matches!(
            embedder.embed_batch(&["text"]),
            Err(EmbeddingError::Api { status: 429, .. })
        ));
        assert_eq!(throttled.calls.get(), 2);
    }

    #[test]
    fn empty_batch_returns_empty_without_network() {
        let embedder = AzureEmbedder::new(AzureOpenAiConfig::new(
            "key",
            "https://example.invalid",
            "ada",
            "v",
        ));
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
