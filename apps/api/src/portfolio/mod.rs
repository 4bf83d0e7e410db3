// Stage 2a: portfolio corpus, embeddings and the searchable index.

pub mod embedder;
pub mod handlers;
pub mod index;
pub mod source;
pub mod store;

pub use embedder::build_embedder;
pub use index::{IndexStatus, LoadOutcome, MatchedLink, PortfolioIndex};
pub use store::SnapshotStore;
