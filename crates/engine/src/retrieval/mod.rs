//! Knowledge retrieval
//!
//! Chunks the reference corpus, embeds it once, and serves cosine-ranked
//! snippet queries. The index is built lazily on first use and is read-only
//! afterwards, so it is safe for unlimited concurrent readers; per-request
//! state never touches it.

mod corpus;

pub use corpus::DEMO_CORPUS;

use async_trait::async_trait;
use metrics::counter;
use std::cmp::Ordering;
use std::sync::Arc;
use text_splitter::{ChunkConfig, TextSplitter};
use tokio::sync::OnceCell;
use tracing::debug;
use triagecore_common::config::RetrievalConfig;
use triagecore_common::embeddings::Embedder;
use triagecore_common::errors::{EngineError, Result};
use triagecore_common::metrics::knowledge_searches_total;
use triagecore_common::model::KnowledgeSnippet;

use crate::providers::KnowledgeIndex;

/// One embedded chunk of the corpus
struct IndexedChunk {
    content: String,
    /// Position in original document order; the ranking tie-breaker
    index: usize,
    embedding: Vec<f32>,
}

/// Semantic snippet store over a chunked, embedded corpus
pub struct KnowledgeStore {
    documents: Vec<String>,
    config: RetrievalConfig,
    embedder: Arc<dyn Embedder>,
    index: OnceCell<Vec<IndexedChunk>>,
}

impl KnowledgeStore {
    /// Create a store over the given documents. Nothing is embedded until the
    /// first search.
    pub fn new(
        documents: impl IntoIterator<Item = String>,
        config: RetrievalConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            documents: documents.into_iter().collect(),
            config,
            embedder,
            index: OnceCell::new(),
        }
    }

    /// Store over the built-in support knowledge base
    pub fn with_demo_corpus(config: RetrievalConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            DEMO_CORPUS.iter().map(|s| s.to_string()),
            config,
            embedder,
        )
    }

    /// Chunk and embed the corpus. Runs at most once per store.
    async fn build_index(&self) -> Result<Vec<IndexedChunk>> {
        let chunk_config = ChunkConfig::new(self.config.chunk_size)
            .with_overlap(self.config.chunk_overlap)
            .map_err(|e| EngineError::Configuration {
                message: format!("invalid chunking config: {}", e),
            })?;
        let splitter = TextSplitter::new(chunk_config);

        let mut contents: Vec<String> = Vec::new();
        for document in &self.documents {
            for chunk in splitter.chunks(document) {
                if chunk.len() < self.config.min_chunk_size {
                    continue;
                }
                contents.push(chunk.to_string());
            }
        }

        if contents.is_empty() {
            debug!("Knowledge corpus is empty, index has no chunks");
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(&contents).await?;

        let index: Vec<IndexedChunk> = contents
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| IndexedChunk {
                content,
                index,
                embedding,
            })
            .collect();

        debug!(
            chunk_count = index.len(),
            model = self.embedder.model_name(),
            "Knowledge index built"
        );
        Ok(index)
    }

    async fn index(&self) -> Result<&Vec<IndexedChunk>> {
        self.index.get_or_try_init(|| self.build_index()).await
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl KnowledgeIndex for KnowledgeStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeSnippet>> {
        counter!(knowledge_searches_total()).increment(1);

        let index = self.index().await?;
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(&IndexedChunk, f32)> = index
            .iter()
            .map(|chunk| (chunk, cosine_similarity(&query_embedding, &chunk.embedding)))
            .collect();

        // Stable ranking: score descending, document order breaks ties
        scored.sort_by(|(a, score_a), (b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });

        let snippets = scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (chunk, score))| KnowledgeSnippet {
                content: chunk.content.clone(),
                rank,
                score,
            })
            .collect();

        Ok(snippets)
    }
}
