// Stage 1: structured job extraction from scraped page text.
// All backend calls go through llm_client.

pub mod extractor;
pub mod handlers;
pub mod job;
pub mod prompts;

pub use extractor::JobExtractor;
pub use job::JobRecord;
