//! # volley-parser
//!
//! Turns one lob of free-form text into classified tasks and extracted
//! entities. The model output is treated as untrusted external input:
//! everything passes through a strict validation/repair boundary before it
//! becomes a typed [`ValidatedBatch`] — the same discipline as parsing
//! untrusted wire data.
//!
//! ## Failure semantics
//!
//! - Empty input fails fast with [`ParseError::InvalidInput`].
//! - A completely unparseable completion (after one repair attempt) is
//!   fatal for the call: [`ParseError::MalformedOutput`].
//! - Individual tasks or entities failing validation are dropped with a
//!   logged warning and counted on the batch — never fatal, never silent.
//!
//! Retries are not performed here; see `volley_llm::with_completion_retry`.

#![deny(unsafe_code)]

pub mod error;
pub mod parser;
pub mod prompt;
pub mod schema;

pub use error::ParseError;
pub use parser::{LobParser, ParserConfig};
pub use prompt::{CompanyContext, TeamMember};
pub use schema::{validate_output, ValidatedBatch};
