//! INI serializer - renders a container back to text
//!
//! Produces line-oriented output:
//! - global comments, then global properties
//! - one `[name]` header per section, followed by its comments and properties
//! - every line terminated by `\n`
//!
//! Nothing is escaped. A name, value or comment holding the delimiter, the
//! comment indicator or a newline is written as is and may not read back the
//! same way.

use std::io::Write;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::config::{NormalizationOptions, SerializationOptions};
use crate::model::{Container, Property};
use crate::normalizer::Normalizer;
use crate::Result;

/// Render a container with default options (normalizing first)
pub fn to_string(container: &Container) -> Result<String> {
    Serializer::default().serialize(container)
}

/// Renders containers as INI text
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    options: SerializationOptions,
    normalizer: Normalizer,
}

impl Serializer {
    pub fn new(options: SerializationOptions, normalizer: Normalizer) -> Self {
        Serializer {
            options,
            normalizer,
        }
    }

    /// Serializer with the given options and a default-policy normalizer that
    /// validates names against the same delimiter and keeps the same empties
    pub fn with_options(options: SerializationOptions) -> Self {
        let normalizer = Normalizer::new(NormalizationOptions {
            property_delimiter: options.property_delimiter,
            include_empty_properties: options.include_empty_properties,
            include_empty_sections: options.include_empty_sections,
            ..NormalizationOptions::default()
        });
        Serializer::new(options, normalizer)
    }

    pub fn options(&self) -> &SerializationOptions {
        &self.options
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Render `container` as a string
    ///
    /// # Errors
    /// Only normalization errors, when `normalize_before_serialization` is set.
    pub fn serialize(&self, container: &Container) -> Result<String> {
        if container.is_empty() {
            return Ok(String::new());
        }

        let normalized;
        let container = if self.options.normalize_before_serialization {
            normalized = self.normalizer.normalize(container)?;
            &normalized
        } else {
            container
        };

        let mut out = String::new();
        self.write_block(&mut out, &container.global_comments, &container.global_properties);

        for section in &container.sections {
            if !self.options.include_empty_sections && !self.has_content(&section.comments, &section.properties) {
                continue;
            }
            if self.options.empty_line_before_section {
                out.push('\n');
            }
            out.push('[');
            out.push_str(section.name());
            out.push_str("]\n");
            self.write_block(&mut out, &section.comments, &section.properties);
        }

        trace!(bytes = out.len(), "serialized container");
        Ok(out)
    }

    /// Render `container` into a blocking writer, then flush it
    pub fn serialize_to<W: Write>(&self, container: &Container, mut writer: W) -> Result<()> {
        let text = self.serialize(container)?;
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Render `container` into an async writer, then flush it
    pub async fn serialize_to_async<W>(&self, container: &Container, mut writer: W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let text = self.serialize(container)?;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// SHA-256 of the rendered text, as lowercase hex.
    /// Containers with the same canonical form share a hash.
    pub fn hash(&self, container: &Container) -> Result<String> {
        let canonical = self.serialize(container)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    // ── Helpers ────────────────────────────────────────────

    fn has_content(&self, comments: &[String], properties: &[Property]) -> bool {
        !comments.is_empty() || properties.iter().any(|p| self.keeps(p))
    }

    fn keeps(&self, property: &Property) -> bool {
        self.options.include_empty_properties || !property.is_empty()
    }

    fn write_block(&self, out: &mut String, comments: &[String], properties: &[Property]) {
        for comment in comments {
            out.push(self.options.comment_indicator);
            out.push_str(comment);
            out.push('\n');
        }
        for property in properties.iter().filter(|p| self.keeps(p)) {
            out.push_str(property.name());
            out.push(self.options.property_delimiter);
            out.push_str(property.value().unwrap_or(""));
            out.push('\n');
        }
    }
}
