//! Retrieval over a pre-built NetHack wiki index.
//!
//! Two persisted artifacts are loaded once and kept read-only:
//! - a [`FlatIndex`] of document embeddings (row `i` = `i`-th store record)
//! - a [`DocumentStore`] mapping document keys to `{title, raw_text}`
//!
//! [`WikiSearch`] ties them to an [`Embedder`](delver_core::Embedder) and
//! implements [`Retriever`](delver_core::Retriever).

pub mod embedder;
pub mod index;
pub mod search;
pub mod store;
pub mod vector;

pub use embedder::ProviderEmbedder;
pub use index::{FlatIndex, Metric, Neighbor};
pub use search::{SearchHit, WikiSearch};
pub use store::{DocumentRecord, DocumentStore, GLOBAL_COUNTS_KEY};
pub use vector::{inner_product, l2_distance_squared};
