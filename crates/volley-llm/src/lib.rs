//! # volley-llm
//!
//! The black-box completion collaborator: a provider-agnostic trait for
//! "prompt + text → structured JSON string", its error taxonomy, an async
//! retry wrapper, and one concrete implementation speaking the
//! OpenAI-compatible chat-completions wire shape.
//!
//! The parser deliberately performs a **single attempt** per call; retry
//! policy is assembled by the caller from [`with_completion_retry`] because
//! repeated completion calls are costly and not guaranteed idempotent.

#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod retry;
pub mod service;

pub use error::ProviderError;
pub use http::{HttpCompletionService, HttpProviderConfig};
pub use retry::with_completion_retry;
pub use service::{CompletionOptions, CompletionService};
