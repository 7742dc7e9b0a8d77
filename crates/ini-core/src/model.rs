//! INI model - properties, sections and the container holding them
//!
//! These types carry no policy. A freshly parsed container may hold
//! duplicates, empty entries and names in any case; the normalizer is the
//! only place those are resolved.

use serde::Serialize;

use crate::{Error, Result};

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{kind} name cannot be empty or whitespace"
        )));
    }
    Ok(())
}

/// A `name=value` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    name: String,
    pub value: Option<String>,
}

impl Property {
    /// Create a property, rejecting blank names
    pub fn new(name: impl Into<String>, value: Option<String>) -> Result<Self> {
        let name = name.into();
        validate_name("property", &name)?;
        Ok(Property { name, value })
    }

    /// Shorthand for a property with a value
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Self::new(name, Some(value.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True when the value is absent or whitespace only
    pub fn is_empty(&self) -> bool {
        self.value.as_deref().map_or(true, |v| v.trim().is_empty())
    }

    /// Same value, different name. The name has already been validated.
    pub(crate) fn renamed(&self, name: String) -> Self {
        Property {
            name,
            value: self.value.clone(),
        }
    }
}

/// A named `[section]` with its own comments and properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    name: String,
    pub comments: Vec<String>,
    pub properties: Vec<Property>,
}

impl Section {
    /// Create an empty section, rejecting blank names
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name("section", &name)?;
        Ok(Section {
            name,
            comments: Vec::new(),
            properties: Vec::new(),
        })
    }

    pub(crate) fn from_parts(name: String, comments: Vec<String>, properties: Vec<Property>) -> Self {
        Section {
            name,
            comments,
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A section is empty when it holds neither comments nor properties
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.properties.is_empty()
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comments.push(comment.into());
        self
    }

    pub fn add_property(&mut self, property: Property) -> &mut Self {
        self.properties.push(property);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// First property whose name matches exactly
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Global comments, global properties and sections, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Container {
    pub global_comments: Vec<String>,
    pub global_properties: Vec<Property>,
    pub sections: Vec<Section>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there is nothing at all to serialize
    pub fn is_empty(&self) -> bool {
        self.global_comments.is_empty()
            && self.global_properties.is_empty()
            && self.sections.is_empty()
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.global_comments.push(comment.into());
        self
    }

    pub fn add_property(&mut self, property: Property) -> &mut Self {
        self.global_properties.push(property);
        self
    }

    pub fn add_section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.global_comments.push(comment.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.global_properties.push(property);
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// First global property whose name matches exactly
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.global_properties.iter().find(|p| p.name == name)
    }

    /// First section whose name matches exactly
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Every section whose name matches exactly, in document order
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.name == name)
    }

    /// The first section named `name`, appending a new empty one if none exists
    pub fn section_or_insert(&mut self, name: &str) -> Result<&mut Section> {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => Ok(&mut self.sections[idx]),
            None => {
                self.sections.push(Section::new(name)?);
                let last = self.sections.len() - 1;
                Ok(&mut self.sections[last])
            }
        }
    }

    /// Remove the first section named `name`. Returns whether one was removed.
    pub fn remove_section(&mut self, name: &str) -> bool {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => {
                self.sections.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every section named `name`. Returns whether any was removed.
    pub fn remove_sections(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        self.sections.len() != before
    }
}
