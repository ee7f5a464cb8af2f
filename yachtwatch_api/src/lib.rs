//! Thin HTTP clients for the external sources the enrichment pipeline reads:
//! the Wikipedia action API, a text-rendering proxy for tracker detail pages,
//! and an optional generative-model fallback.
//!
//! Every client degrades cleanly: transport failures, timeouts, and non-2xx
//! responses surface as [`Error`] values the caller can treat as "no data".

mod errors;
mod llm;
mod render;
mod user_agent;
mod wiki;

pub use self::errors::Error;
pub use self::llm::LlmClient;
pub use self::render::RenderClient;
pub use self::wiki::{WikiClient, WikiSearchHit};
