//! INI Parser - line classifier and scope tracking
//!
//! Converts text lines into a raw `Container`: document order is kept,
//! duplicates and empty entries are kept, and names are left untouched.
//! Identity folding and uniqueness are the normalizer's job.
//!
//! Every input form (string, line iterator, blocking reader, async reader)
//! feeds the same per-line state machine, so they produce identical results
//! for identical lines.

pub mod line;

use std::io::BufRead;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::config::{NormalizationOptions, ParseOptions};
use crate::model::{Container, Property, Section};
use crate::normalizer::Normalizer;
use crate::{Error, Result};

use self::line::{Line, LineClassifier};

/// Parse INI text with default options (normalizing afterwards)
///
/// # Errors
/// Returns `InvalidLineFormat` for lines that fit no known shape, or any
/// normalization error.
pub fn parse(input: &str) -> Result<Container> {
    Parser::default().parse_str(input)
}

/// Parses INI lines into a container
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
    normalizer: Normalizer,
}

impl Parser {
    pub fn new(options: ParseOptions, normalizer: Normalizer) -> Self {
        Parser {
            options,
            normalizer,
        }
    }

    /// Parser with the given options and a default-policy normalizer that
    /// validates names against the same delimiter
    pub fn with_options(options: ParseOptions) -> Self {
        let normalizer = Normalizer::new(NormalizationOptions {
            property_delimiter: options.property_delimiter,
            ..NormalizationOptions::default()
        });
        Parser::new(options, normalizer)
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Parse a whole string. Blank input yields an empty container.
    pub fn parse_str(&self, text: &str) -> Result<Container> {
        self.parse_lines(text.lines())
    }

    /// Parse an already materialized sequence of lines
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<Container>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = ParseState::new(&self.options);
        for line in lines {
            state.feed(line.as_ref())?;
        }
        self.finish(state)
    }

    /// Parse lines pulled one at a time from a blocking reader
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Container> {
        let mut state = ParseState::new(&self.options);
        for line in reader.lines() {
            state.feed(&line?)?;
        }
        self.finish(state)
    }

    /// Parse lines pulled one at a time from an async reader.
    ///
    /// Dropping the future only abandons the wait for the next line; a line
    /// already read is always processed to completion.
    pub async fn parse_async<R>(&self, reader: R) -> Result<Container>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut state = ParseState::new(&self.options);
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            state.feed(&line)?;
        }
        self.finish(state)
    }

    fn finish(&self, state: ParseState) -> Result<Container> {
        let container = state.container;
        trace!(
            comments = container.global_comments.len(),
            properties = container.global_properties.len(),
            sections = container.sections.len(),
            "parsed raw container"
        );
        if self.options.normalize_after_parse {
            self.normalizer.normalize(&container)
        } else {
            Ok(container)
        }
    }
}

/// Where new comments and properties go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    /// Index of the most recently opened section
    Section(usize),
}

struct ParseState {
    classifier: LineClassifier,
    fail_on_invalid_lines: bool,
    container: Container,
    scope: Scope,
    position: usize,
}

impl ParseState {
    fn new(options: &ParseOptions) -> Self {
        ParseState {
            classifier: LineClassifier::new(options.comment_indicator, options.property_delimiter),
            fail_on_invalid_lines: options.fail_on_invalid_lines,
            container: Container::new(),
            scope: Scope::Global,
            position: 0,
        }
    }

    /// `position` counts non-ignored lines only
    fn feed(&mut self, raw: &str) -> Result<()> {
        let line = self.classifier.classify(raw);
        if line == Line::Ignored {
            return Ok(());
        }
        let position = self.position;
        self.position += 1;

        match line {
            Line::Ignored => {}
            Line::Comment(comment) => {
                let comment = comment.to_string();
                match self.scope {
                    Scope::Global => self.container.global_comments.push(comment),
                    Scope::Section(idx) => self.container.sections[idx].comments.push(comment),
                }
            }
            Line::Section(name) => {
                self.container.sections.push(Section::new(name)?);
                self.scope = Scope::Section(self.container.sections.len() - 1);
            }
            Line::Property { name, value } => {
                let property = Property::with_value(name, value)?;
                match self.scope {
                    Scope::Global => self.container.global_properties.push(property),
                    Scope::Section(idx) => self.container.sections[idx].properties.push(property),
                }
            }
            Line::Invalid(line) => {
                if self.fail_on_invalid_lines {
                    return Err(Error::InvalidLineFormat {
                        line: position,
                        value: line.to_string(),
                    });
                }
                debug!(line = position, value = line, "skipping invalid line");
            }
        }
        Ok(())
    }
}
