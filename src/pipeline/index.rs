use thiserror::Error;

use super::chunker::Passage;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("cannot build an index over an empty corpus")]
    EmptyCorpus,

    #[error("passage {0} has no embedding")]
    MissingEmbedding(usize),
}

/// A retrieved passage paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Read-only top-k search over an immutable passage set.
pub trait PassageSearch {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredPassage>;
}

/// In-memory cosine-similarity index over one document's passages.
///
/// Built exactly once per request and immutable afterwards; queries are
/// read-only and need no synchronization.
pub struct VectorIndex {
    passages: Vec<Passage>,
}

impl VectorIndex {
    /// Consume an embedded passage set. Every passage must carry its
    /// embedding already; the index never computes one.
    pub fn build(passages: Vec<Passage>) -> Result<Self, IndexError> {
        if passages.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }
        for (i, passage) in passages.iter().enumerate() {
            if passage.embedding.is_none() {
                return Err(IndexError::MissingEmbedding(i));
            }
        }
        Ok(Self { passages })
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl PassageSearch for VectorIndex {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredPassage> {
        let mut scored: Vec<ScoredPassage> = self
            .passages
            .iter()
            .map(|p| ScoredPassage {
                score: cosine_similarity(query_embedding, p.embedding.as_deref().unwrap_or(&[])),
                passage: p.clone(),
            })
            .collect();

        // sort_by is stable, so equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
