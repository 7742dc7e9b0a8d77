//! Line classifier - turns one physical line into a typed `Line`
//!
//! Handles: blank lines, comments, `[section]` headers, `name=value`
//! properties. Anything else is `Line::Invalid`.
//!
//! Guarantees:
//! - Pure: classification depends only on the line and the two marker characters
//! - No escaping: delimiters and indicators inside values are taken verbatim

/// A classified line, borrowing from the trimmed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Blank, or too short to carry anything
    Ignored,
    Comment(&'a str),
    Section(&'a str),
    Property { name: &'a str, value: &'a str },
    Invalid(&'a str),
}

/// Classifier for one configuration of comment indicator and delimiter
#[derive(Debug, Clone, Copy)]
pub struct LineClassifier {
    comment_indicator: char,
    property_delimiter: char,
}

impl LineClassifier {
    pub fn new(comment_indicator: char, property_delimiter: char) -> Self {
        LineClassifier {
            comment_indicator,
            property_delimiter,
        }
    }

    /// Classify a raw line. Surrounding whitespace is trimmed first.
    pub fn classify<'a>(&self, raw: &'a str) -> Line<'a> {
        let line = raw.trim();

        let mut chars = line.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return Line::Ignored,
        };
        if chars.next().is_none() {
            return Line::Ignored;
        }

        if first == self.comment_indicator {
            return Line::Comment(&line[first.len_utf8()..]);
        }

        if line.len() > 2 && line.starts_with('[') && line.ends_with(']') {
            let name = &line[1..line.len() - 1];
            if name.trim().is_empty() {
                return Line::Invalid(line);
            }
            return Line::Section(name);
        }

        if let Some(idx) = line.find(self.property_delimiter) {
            let name = &line[..idx];
            if name.is_empty() {
                return Line::Invalid(line);
            }
            let value = &line[idx + self.property_delimiter.len_utf8()..];
            return Line::Property { name, value };
        }

        Line::Invalid(line)
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        LineClassifier::new(
            crate::config::DEFAULT_COMMENT_INDICATOR,
            crate::config::DEFAULT_PROPERTY_DELIMITER,
        )
    }
}
