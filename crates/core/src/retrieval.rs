//! Retrieval traits — query encoding and document search.
//!
//! The agent only sees a [`Retriever`]: free text in, ranked raw document
//! text out. The wiki index implementation lives in `delver-retrieval`;
//! tests substitute stubs that return fixed documents.

use async_trait::async_trait;

use crate::error::RetrievalError;

/// Encodes text into a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode one query string.
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Output dimension, when known up front.
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Returns the raw text of the documents nearest to a query, best first.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// At most `top_k` snippets; fewer when the index holds fewer documents.
    async fn search(&self, query: &str) -> Result<Vec<String>, RetrievalError>;
}
