//! INI Core - parse, canonicalize and re-emit INI text
//!
//! # Architecture
//!
//! ```text
//! INI Text → Parser → Raw Container → Normalizer → Canonical Container
//!                                                        ↓
//!                                                   Serializer → INI Text
//! ```
//!
//! The parser keeps everything it reads (duplicates, empties, original
//! case). The normalizer applies the configured policies and always returns
//! a new container. The serializer only reads.
//!
//! # Guarantees
//!
//! - **Deterministic**: same input and options always produce identical output
//! - **Idempotent**: normalizing a canonical container changes nothing
//! - **Stable round trip**: canonical text parses back to the same canonical form

pub mod config;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod serializer;

pub use config::{NormalizationOptions, ParseOptions, SerializationOptions, SortOrder};
pub use error::{Error, Result};
pub use model::{Container, Property, Section};
pub use normalizer::{normalize, Normalize, Normalizer};
pub use parser::{parse, Parser};
pub use serializer::{to_string, Serializer};

/// Version of this library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse, normalize and serialize with default options
///
/// # Errors
/// Any parse or normalization error.
pub fn canonicalize(input: &str) -> Result<String> {
    let container = parse(input)?;
    to_string(&container)
}

/// SHA-256 hex digest of the canonical rendering of `container`
pub fn canonical_hash(container: &Container, options: &SerializationOptions) -> Result<String> {
    Serializer::with_options(options.clone()).hash(container)
}
