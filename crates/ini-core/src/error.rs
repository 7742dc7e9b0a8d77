//! Error types for INI processing
//!
//! All fallible operations return `Result<T, Error>`.
//! Error types carry enough context to point at the offending input.

use thiserror::Error;

use crate::model::Property;

/// INI processing error types
#[derive(Debug, Error)]
pub enum Error {
    /// A line that is neither blank, comment, section header nor property
    #[error("the line at position {line} could not be parsed into a comment, section or property: {value:?}")]
    InvalidLineFormat { line: usize, value: String },

    /// A property name holds a character that cannot be written back
    #[error("invalid character {character:?} in the property with name '{}'", property.name())]
    InvalidPropertyName { character: char, property: Property },

    /// Two properties share an identity within one scope (`None` = global)
    #[error("{}", duplicated_property_message(section.as_deref(), name))]
    DuplicatedProperty {
        section: Option<String>,
        name: String,
    },

    /// Two sections share an identity and merging is disabled
    #[error("the section [{name}] was found multiple times")]
    DuplicatedSection { name: String },

    /// Precondition violation on a programmatic entry point
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure reading from a source or writing to a sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn duplicated_property_message(section: Option<&str>, name: &str) -> String {
    match section {
        Some(section) => format!("the property [{section}].'{name}' was found multiple times"),
        None => format!("the global property '{name}' was found multiple times"),
    }
}

/// Result type alias for INI operations
pub type Result<T> = std::result::Result<T, Error>;
