//! Options for parsing, normalization and serialization
//!
//! Each options value is plain data: build it once (from `Default`, struct
//! update syntax or a JSON document) and hand it to the component that uses
//! it. Components never mutate their options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_COMMENT_INDICATOR: char = ';';
pub const DEFAULT_PROPERTY_DELIMITER: char = '=';

/// Final ordering applied to properties and sections, by canonical name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep first-seen order
    #[default]
    None,
    Ascending,
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortOrder::None => write!(f, "none"),
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(SortOrder::None),
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// How text lines are turned into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    pub comment_indicator: char,
    pub property_delimiter: char,
    /// Fail on a line that is not a comment, section or property; skip it otherwise
    pub fail_on_invalid_lines: bool,
    /// Run the normalizer on the parsed container before returning it
    pub normalize_after_parse: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            comment_indicator: DEFAULT_COMMENT_INDICATOR,
            property_delimiter: DEFAULT_PROPERTY_DELIMITER,
            fail_on_invalid_lines: true,
            normalize_after_parse: true,
        }
    }
}

/// Semantic policies enforced by the normalizer.
///
/// Every flag is independent. `throw_exceptions = false` does not behave like
/// `replace_on_duplicate_properties = true`: suppressed duplicates keep the
/// *first* value seen, not the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizationOptions {
    pub include_empty_comments: bool,
    pub include_empty_sections: bool,
    pub include_empty_properties: bool,
    /// When false, names are upper-cased for identity and for output
    pub case_sensitive: bool,
    pub replace_on_duplicate_properties: bool,
    pub merge_on_duplicate_sections: bool,
    pub throw_exceptions: bool,
    pub sort_order: SortOrder,
    /// Character a property name may not contain
    pub property_delimiter: char,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        NormalizationOptions {
            include_empty_comments: false,
            include_empty_sections: false,
            include_empty_properties: false,
            case_sensitive: false,
            replace_on_duplicate_properties: false,
            merge_on_duplicate_sections: false,
            throw_exceptions: true,
            sort_order: SortOrder::None,
            property_delimiter: DEFAULT_PROPERTY_DELIMITER,
        }
    }
}

/// How a container is rendered back to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializationOptions {
    pub comment_indicator: char,
    pub property_delimiter: char,
    pub include_empty_properties: bool,
    pub include_empty_sections: bool,
    pub empty_line_before_section: bool,
    pub normalize_before_serialization: bool,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        SerializationOptions {
            comment_indicator: DEFAULT_COMMENT_INDICATOR,
            property_delimiter: DEFAULT_PROPERTY_DELIMITER,
            include_empty_properties: false,
            include_empty_sections: false,
            empty_line_before_section: false,
            normalize_before_serialization: true,
        }
    }
}
