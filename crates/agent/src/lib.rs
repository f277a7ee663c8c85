//! AI collaborator and recommendation strategies.
//!
//! The language model is only ever asked to pick or draft catalog entries.
//! Every path that consults it degrades to a deterministic answer when the
//! collaborator is missing, slow, or returns something unusable:
//!
//! - `llm` - the `LlmClient` seam and its HTTP implementation
//! - `concierge` - keyword and AI `Recommender` strategies plus the selector
//! - `generator` - drafts new service ideas from free text

pub mod concierge;
pub mod generator;
pub mod llm;

pub use concierge::{
    AiRecommender, Concierge, FallbackReason, KeywordRecommender, Recommendation,
    RecommendationSource, Recommender, ShuffleMode,
};
pub use generator::ServiceGenerator;
pub use llm::{HttpLlmClient, LlmClient};
