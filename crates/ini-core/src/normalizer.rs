//! Canonical normalizer - turns a raw container into its canonical form
//!
//! The normalizer resolves everything the parser leaves open: identity
//! folding, empty entries, duplicate properties, duplicate sections and
//! ordering. Each concern is driven by one flag of `NormalizationOptions`.
//!
//! # Pipeline
//!
//! Container: global comments → global properties → sections.
//!
//! Properties (per scope): drop empties → validate name → fold name →
//! insert into an insertion-ordered map keyed by folded name → sort.
//!
//! Sections: normalize each member → drop empties → group by folded name in
//! first-seen order → merge or reject groups of more than one → sort.
//!
//! # Guarantees
//!
//! - **Pure**: output is freshly allocated; the input is never touched
//! - **Idempotent**: `normalize(normalize(x)) == normalize(x)`
//! - **All or nothing**: the `try_*` and `*_into` forms never commit a
//!   partial result to the destination

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::config::{NormalizationOptions, SortOrder};
use crate::model::{Container, Property, Section};
use crate::{Error, Result};

// ── Public API ─────────────────────────────────────────────

/// Normalize a container with default options
///
/// # Errors
/// Returns `InvalidPropertyName`, `DuplicatedProperty` or
/// `DuplicatedSection` when the container breaks the default policies.
pub fn normalize(container: &Container) -> Result<Container> {
    Normalizer::default().normalize(container)
}

/// Anything the normalizer knows how to canonicalize
pub trait Normalize {
    type Output;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Self::Output>;
}

/// Applies one set of `NormalizationOptions`
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizationOptions,
}

impl Normalizer {
    pub fn new(options: NormalizationOptions) -> Self {
        Normalizer { options }
    }

    pub fn options(&self) -> &NormalizationOptions {
        &self.options
    }

    /// Normalize a container, section, property, or a slice of either
    pub fn normalize<T: Normalize + ?Sized>(&self, source: &T) -> Result<T::Output> {
        source.normalize_with(self)
    }

    /// Same as [`Normalizer::normalize`], reporting failure as `None`
    pub fn try_normalize<T: Normalize + ?Sized>(&self, source: &T) -> Option<T::Output> {
        match source.normalize_with(self) {
            Ok(output) => Some(output),
            Err(err) => {
                debug!(error = %err, "normalization failed");
                None
            }
        }
    }

    /// Normalize `source` and append the result to `destination`.
    /// On failure `destination` is left as it was.
    pub fn normalize_into<T>(&self, source: &[T], destination: &mut Vec<T>) -> Result<()>
    where
        [T]: Normalize<Output = Vec<T>>,
    {
        let normalized = source.normalize_with(self)?;
        destination.extend(normalized);
        Ok(())
    }

    /// Same as [`Normalizer::normalize_into`], reporting failure as `false`
    pub fn try_normalize_into<T>(&self, source: &[T], destination: &mut Vec<T>) -> bool
    where
        [T]: Normalize<Output = Vec<T>>,
    {
        match self.normalize_into(source, destination) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "normalization failed");
                false
            }
        }
    }

    /// Normalize `source` and append its comments, properties and sections
    /// to `destination`. On failure `destination` is left as it was.
    pub fn normalize_container_into(
        &self,
        source: &Container,
        destination: &mut Container,
    ) -> Result<()> {
        let normalized = self.normalize_container(source)?;
        destination.global_comments.extend(normalized.global_comments);
        destination.global_properties.extend(normalized.global_properties);
        destination.sections.extend(normalized.sections);
        Ok(())
    }

    /// Same as [`Normalizer::normalize_container_into`], reporting failure as `false`
    pub fn try_normalize_container_into(&self, source: &Container, destination: &mut Container) -> bool {
        match self.normalize_container_into(source, destination) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "normalization failed");
                false
            }
        }
    }

    // ── Stages ─────────────────────────────────────────────

    fn normalize_container(&self, source: &Container) -> Result<Container> {
        let container = Container {
            global_comments: self.normalize_comments(&source.global_comments),
            global_properties: self.normalize_properties(&source.global_properties, None)?,
            sections: self.normalize_sections(&source.sections)?,
        };
        trace!(
            comments = container.global_comments.len(),
            properties = container.global_properties.len(),
            sections = container.sections.len(),
            "normalized container"
        );
        Ok(container)
    }

    fn normalize_comments(&self, comments: &[String]) -> Vec<String> {
        comments
            .iter()
            .filter(|c| self.options.include_empty_comments || !c.trim().is_empty())
            .cloned()
            .collect()
    }

    fn normalize_property(&self, property: &Property) -> Result<Property> {
        let invalid = property
            .name()
            .chars()
            .find(|&c| c.is_whitespace() || c == self.options.property_delimiter);
        if let Some(character) = invalid {
            return Err(Error::InvalidPropertyName {
                character,
                property: property.clone(),
            });
        }
        Ok(property.renamed(self.fold(property.name())))
    }

    /// `scope` is the folded owning section name, `None` for globals
    fn normalize_properties(&self, properties: &[Property], scope: Option<&str>) -> Result<Vec<Property>> {
        let mut unique: IndexMap<String, Property> = IndexMap::with_capacity(properties.len());

        for property in properties {
            if !self.options.include_empty_properties && property.is_empty() {
                continue;
            }
            let property = self.normalize_property(property)?;

            match unique.entry(property.name().to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(property);
                }
                Entry::Occupied(mut entry) => {
                    if self.options.replace_on_duplicate_properties {
                        entry.insert(property);
                    } else if self.options.throw_exceptions {
                        return Err(Error::DuplicatedProperty {
                            section: scope.map(str::to_string),
                            name: entry.key().clone(),
                        });
                    } else {
                        debug!(
                            section = scope.unwrap_or(""),
                            name = entry.key().as_str(),
                            "keeping first of duplicated property"
                        );
                    }
                }
            }
        }

        let mut properties: Vec<Property> = unique.into_values().collect();
        self.sort_by_name(&mut properties, Property::name);
        Ok(properties)
    }

    fn normalize_section(&self, section: &Section) -> Result<Section> {
        let name = self.fold(section.name());
        let comments = self.normalize_comments(&section.comments);
        let properties = self.normalize_properties(&section.properties, Some(&name))?;
        Ok(Section::from_parts(name, comments, properties))
    }

    fn normalize_sections(&self, sections: &[Section]) -> Result<Vec<Section>> {
        let mut groups: IndexMap<String, Vec<Section>> = IndexMap::with_capacity(sections.len());

        for section in sections {
            let section = self.normalize_section(section)?;
            if !self.options.include_empty_sections && section.is_empty() {
                continue;
            }
            groups
                .entry(section.name().to_string())
                .or_default()
                .push(section);
        }

        let mut result = Vec::with_capacity(groups.len());
        for (name, mut members) in groups {
            if members.len() == 1 {
                result.extend(members);
            } else if self.options.merge_on_duplicate_sections {
                result.push(self.merge_sections(name, members)?);
            } else if self.options.throw_exceptions {
                return Err(Error::DuplicatedSection { name });
            } else {
                debug!(
                    section = name.as_str(),
                    dropped = members.len() - 1,
                    "keeping first of duplicated section"
                );
                members.truncate(1);
                result.extend(members);
            }
        }

        self.sort_by_name(&mut result, Section::name);
        Ok(result)
    }

    /// Union of already normalized members, in encounter order. Properties
    /// are normalized again so collisions across members follow the
    /// duplicate-property policy.
    fn merge_sections(&self, name: String, members: Vec<Section>) -> Result<Section> {
        trace!(section = name.as_str(), members = members.len(), "merging sections");
        let mut comments = Vec::new();
        let mut properties = Vec::new();
        for member in members {
            comments.extend(member.comments);
            properties.extend(member.properties);
        }
        let properties = self.normalize_properties(&properties, Some(&name))?;
        Ok(Section::from_parts(name, comments, properties))
    }

    // ── Helpers ────────────────────────────────────────────

    fn fold(&self, name: &str) -> String {
        if self.options.case_sensitive {
            name.to_string()
        } else {
            name.to_uppercase()
        }
    }

    fn sort_by_name<T>(&self, items: &mut [T], name: fn(&T) -> &str) {
        match self.options.sort_order {
            SortOrder::None => {}
            SortOrder::Ascending => items.sort_by(|a, b| name(a).cmp(name(b))),
            SortOrder::Descending => items.sort_by(|a, b| name(b).cmp(name(a))),
        }
    }
}

// ── Normalize impls ────────────────────────────────────────

impl Normalize for Container {
    type Output = Container;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Container> {
        normalizer.normalize_container(self)
    }
}

impl Normalize for Section {
    type Output = Section;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Section> {
        normalizer.normalize_section(self)
    }
}

impl Normalize for Property {
    type Output = Property;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Property> {
        normalizer.normalize_property(self)
    }
}

impl Normalize for [Section] {
    type Output = Vec<Section>;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Vec<Section>> {
        normalizer.normalize_sections(self)
    }
}

impl Normalize for [Property] {
    type Output = Vec<Property>;

    fn normalize_with(&self, normalizer: &Normalizer) -> Result<Vec<Property>> {
        normalizer.normalize_properties(self, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, value: &str) -> Property {
        Property::with_value(name, value).unwrap()
    }

    fn section(name: &str) -> Section {
        Section::new(name).unwrap()
    }

    fn with(options: NormalizationOptions) -> Normalizer {
        Normalizer::new(options)
    }

    fn names<T>(items: &[T], name: fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|i| name(i).to_string()).collect()
    }

    fn duplicated_sections() -> Vec<Section> {
        vec![
            section("s01")
                .with_comment("s01c01")
                .with_property(prop("p01", "value")),
            section("S01")
                .with_comment("S01c01")
                .with_property(prop("p02", "value")),
        ]
    }

    fn duplicated_properties() -> Vec<Property> {
        vec![prop("p01", "v1"), prop("P01", "v2")]
    }

    // ── Single property ────────────────────────────────

    #[test]
    fn test_property_name_folded_by_default() {
        let result = Normalizer::default().normalize(&prop("p01", "value")).unwrap();
        assert_eq!(result.name(), "P01");
        assert_eq!(result.value(), Some("value"));
    }

    #[test]
    fn test_property_name_kept_when_case_sensitive() {
        let normalizer = with(NormalizationOptions {
            case_sensitive: true,
            ..Default::default()
        });
        let result = normalizer.normalize(&prop("p01", "value")).unwrap();
        assert_eq!(result.name(), "p01");
    }

    #[test]
    fn test_property_name_with_space_rejected() {
        let err = Normalizer::default().normalize(&prop("key ", "value")).unwrap_err();
        match err {
            Error::InvalidPropertyName { character, property } => {
                assert_eq!(character, ' ');
                assert_eq!(property.name(), "key ");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_property_name_with_delimiter_rejected() {
        let err = Normalizer::default().normalize(&prop("a=b", "value")).unwrap_err();
        assert!(matches!(err, Error::InvalidPropertyName { character: '=', .. }));

        let colon = with(NormalizationOptions {
            property_delimiter: ':',
            ..Default::default()
        });
        assert!(colon.normalize(&prop("a=b", "value")).is_ok());
        assert!(colon.normalize(&prop("a:b", "value")).is_err());
    }

    #[test]
    fn test_try_normalize_property() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.try_normalize(&prop("p01", "v")).unwrap().name(), "P01");
        assert!(normalizer.try_normalize(&prop("p 01", "v")).is_none());
    }

    // ── Property collections ───────────────────────────

    #[test]
    fn test_empty_properties_removed_by_default() {
        let source = vec![
            prop("p01", "value"),
            prop("p02", "    "),
            prop("p03", ""),
            Property::new("p04", None).unwrap(),
        ];
        let result = Normalizer::default().normalize(source.as_slice()).unwrap();
        assert_eq!(names(&result, Property::name), vec!["P01"]);
    }

    #[test]
    fn test_empty_properties_kept_when_included() {
        let source = vec![prop("p01", "value"), Property::new("p02", None).unwrap()];
        let normalizer = with(NormalizationOptions {
            include_empty_properties: true,
            ..Default::default()
        });
        let result = normalizer.normalize(source.as_slice()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[1].is_empty());
    }

    #[test]
    fn test_empty_property_skipped_before_name_validation() {
        let source = vec![prop("bad name", ""), prop("good", "v")];
        let result = Normalizer::default().normalize(source.as_slice()).unwrap();
        assert_eq!(names(&result, Property::name), vec!["GOOD"]);
    }

    #[test]
    fn test_duplicated_property_fails_by_default() {
        let err = Normalizer::default()
            .normalize(duplicated_properties().as_slice())
            .unwrap_err();
        match err {
            Error::DuplicatedProperty { section, name } => {
                assert_eq!(section, None);
                assert_eq!(name, "P01");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicated_property_replaced_last_wins() {
        let normalizer = with(NormalizationOptions {
            replace_on_duplicate_properties: true,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_properties().as_slice()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "P01");
        assert_eq!(result[0].value(), Some("v2"));
    }

    #[test]
    fn test_duplicated_property_ignored_first_wins() {
        let normalizer = with(NormalizationOptions {
            throw_exceptions: false,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_properties().as_slice()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].value(), Some("v1"));
    }

    #[test]
    fn test_duplicated_property_distinct_when_case_sensitive() {
        let normalizer = with(NormalizationOptions {
            case_sensitive: true,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_properties().as_slice()).unwrap();
        assert_eq!(names(&result, Property::name), vec!["p01", "P01"]);
    }

    #[test]
    fn test_replace_keeps_first_position() {
        let source = vec![prop("a", "1"), prop("b", "2"), prop("A", "3")];
        let normalizer = with(NormalizationOptions {
            replace_on_duplicate_properties: true,
            ..Default::default()
        });
        let result = normalizer.normalize(source.as_slice()).unwrap();
        assert_eq!(names(&result, Property::name), vec!["A", "B"]);
        assert_eq!(result[0].value(), Some("3"));
    }

    #[test]
    fn test_properties_sorted() {
        let source = vec![prop("b", "1"), prop("c", "2"), prop("a", "3")];
        let ascending = with(NormalizationOptions {
            sort_order: SortOrder::Ascending,
            ..Default::default()
        });
        let descending = with(NormalizationOptions {
            sort_order: SortOrder::Descending,
            ..Default::default()
        });
        let none = Normalizer::default();

        let asc = ascending.normalize(source.as_slice()).unwrap();
        let desc = descending.normalize(source.as_slice()).unwrap();
        let kept = none.normalize(source.as_slice()).unwrap();
        assert_eq!(names(&asc, Property::name), vec!["A", "B", "C"]);
        assert_eq!(names(&desc, Property::name), vec!["C", "B", "A"]);
        assert_eq!(names(&kept, Property::name), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_normalize_into_appends_on_success() {
        let normalizer = Normalizer::default();
        let mut destination = vec![prop("EXISTING", "x")];
        normalizer
            .normalize_into(&[prop("p01", "v")], &mut destination)
            .unwrap();
        assert_eq!(names(&destination, Property::name), vec!["EXISTING", "P01"]);
    }

    #[test]
    fn test_try_normalize_into_commits_nothing_on_failure() {
        let normalizer = Normalizer::default();
        let source = vec![prop("ok", "v"), prop("p01", "v1"), prop("P01", "v2")];
        let mut destination = Vec::new();
        assert!(!normalizer.try_normalize_into(&source, &mut destination));
        assert!(destination.is_empty());

        let mut destination = Vec::new();
        assert!(normalizer.try_normalize_into(&source[..2], &mut destination));
        assert_eq!(destination.len(), 2);
    }

    // ── Single section ─────────────────────────────────

    #[test]
    fn test_section_name_folded() {
        let result = Normalizer::default().normalize(&section("s01")).unwrap();
        assert_eq!(result.name(), "S01");

        let sensitive = with(NormalizationOptions {
            case_sensitive: true,
            ..Default::default()
        });
        assert_eq!(sensitive.normalize(&section("s01")).unwrap().name(), "s01");
    }

    #[test]
    fn test_section_empty_comments() {
        let source = section("s01")
            .with_comment("comment")
            .with_comment("")
            .with_comment("comment")
            .with_comment("   ");

        let removed = Normalizer::default().normalize(&source).unwrap();
        assert_eq!(removed.comments, vec!["comment", "comment"]);

        let kept = with(NormalizationOptions {
            include_empty_comments: true,
            ..Default::default()
        })
        .normalize(&source)
        .unwrap();
        assert_eq!(kept.comments.len(), 4);
    }

    #[test]
    fn test_duplicated_property_in_section_names_scope() {
        let source = section("s01")
            .with_property(prop("p01", "v1"))
            .with_property(prop("P01", "v2"));
        let err = Normalizer::default().normalize(&source).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicatedProperty { section: Some(ref s), ref name } if s == "S01" && name == "P01"
        ));
    }

    // ── Section collections ────────────────────────────

    #[test]
    fn test_empty_sections_removed_by_default() {
        let source = vec![
            section("s01").with_comment("comment").with_comment("Comment"),
            section("s02").with_property(prop("p01", "value")),
            section("s03"),
        ];
        let result = Normalizer::default().normalize(source.as_slice()).unwrap();
        assert_eq!(names(&result, Section::name), vec!["S01", "S02"]);
    }

    #[test]
    fn test_empty_sections_kept_when_included() {
        let source = vec![section("s01").with_comment("c"), section("s02")];
        let normalizer = with(NormalizationOptions {
            include_empty_sections: true,
            ..Default::default()
        });
        let result = normalizer.normalize(source.as_slice()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[1].is_empty());
    }

    #[test]
    fn test_section_emptied_by_filtering_is_removed() {
        let source = vec![section("s01")
            .with_comment("  ")
            .with_property(prop("p01", ""))];
        let result = Normalizer::default().normalize(source.as_slice()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_duplicated_section_fails_by_default() {
        let err = Normalizer::default()
            .normalize(duplicated_sections().as_slice())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatedSection { ref name } if name == "S01"));
    }

    #[test]
    fn test_duplicated_section_distinct_when_case_sensitive() {
        let normalizer = with(NormalizationOptions {
            case_sensitive: true,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_sections().as_slice()).unwrap();
        assert_eq!(names(&result, Section::name), vec!["s01", "S01"]);
    }

    #[test]
    fn test_duplicated_section_merged() {
        let normalizer = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_sections().as_slice()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "S01");
        assert_eq!(result[0].comments, vec!["s01c01", "S01c01"]);
        assert_eq!(names(&result[0].properties, Property::name), vec!["P01", "P02"]);
    }

    #[test]
    fn test_duplicated_section_ignored_keeps_first() {
        let normalizer = with(NormalizationOptions {
            throw_exceptions: false,
            ..Default::default()
        });
        let result = normalizer.normalize(duplicated_sections().as_slice()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].comments, vec!["s01c01"]);
    }

    #[test]
    fn test_merge_collision_follows_property_policy() {
        let source = vec![
            section("s").with_property(prop("k", "first")),
            section("S").with_property(prop("K", "second")),
        ];

        let strict = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            ..Default::default()
        });
        let err = strict.normalize(source.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicatedProperty { section: Some(ref s), ref name } if s == "S" && name == "K"
        ));

        let replacing = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            replace_on_duplicate_properties: true,
            ..Default::default()
        });
        let merged = replacing.normalize(source.as_slice()).unwrap();
        assert_eq!(merged[0].properties.len(), 1);
        assert_eq!(merged[0].properties[0].value(), Some("second"));
    }

    #[test]
    fn test_empty_duplicate_does_not_collide() {
        let source = vec![section("s01").with_comment("c"), section("S01")];
        let result = Normalizer::default().normalize(source.as_slice()).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_sections_sorted_after_grouping() {
        let source = vec![
            section("b").with_comment("1"),
            section("a").with_comment("2"),
            section("B").with_comment("3"),
        ];
        let normalizer = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            sort_order: SortOrder::Ascending,
            ..Default::default()
        });
        let result = normalizer.normalize(source.as_slice()).unwrap();
        assert_eq!(names(&result, Section::name), vec!["A", "B"]);
        assert_eq!(result[1].comments, vec!["1", "3"]);
    }

    #[test]
    fn test_try_normalize_sections_into() {
        let normalizer = Normalizer::default();
        let mut destination = Vec::new();
        assert!(!normalizer.try_normalize_into(&duplicated_sections(), &mut destination));
        assert!(destination.is_empty());

        let merging = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            ..Default::default()
        });
        assert!(merging.try_normalize_into(&duplicated_sections(), &mut destination));
        assert_eq!(destination.len(), 1);
    }

    // ── Container ──────────────────────────────────────

    fn sample_container() -> Container {
        Container::new()
            .with_comment("gc 01")
            .with_comment("     ")
            .with_comment("")
            .with_property(prop("gp01", "value"))
            .with_property(prop("gp02", "    "))
            .with_section(
                section("s01")
                    .with_comment("s01 c01")
                    .with_property(prop("s01p01", "v")),
            )
            .with_section(section("s02"))
    }

    #[test]
    fn test_container_defaults() {
        let result = Normalizer::default().normalize(&sample_container()).unwrap();
        assert_eq!(result.global_comments, vec!["gc 01"]);
        assert_eq!(names(&result.global_properties, Property::name), vec!["GP01"]);
        assert_eq!(names(&result.sections, Section::name), vec!["S01"]);
        assert_eq!(result.sections[0].properties[0].name(), "S01P01");
    }

    #[test]
    fn test_container_includes_everything_when_asked() {
        let normalizer = with(NormalizationOptions {
            include_empty_comments: true,
            include_empty_properties: true,
            include_empty_sections: true,
            ..Default::default()
        });
        let source = sample_container();
        let result = normalizer.normalize(&source).unwrap();
        assert_eq!(result.global_comments.len(), 3);
        assert_eq!(result.global_properties.len(), 2);
        assert_eq!(result.sections.len(), 2);
    }

    #[test]
    fn test_container_input_untouched() {
        let source = sample_container();
        let snapshot = source.clone();
        let _ = normalize(&source).unwrap();
        assert_eq!(source, snapshot);
    }

    #[test]
    fn test_container_into_all_or_nothing() {
        let normalizer = Normalizer::default();
        let mut destination = Container::new().with_comment("kept");

        let bad = sample_container().with_property(prop("GP01", "again"));
        assert!(!normalizer.try_normalize_container_into(&bad, &mut destination));
        assert_eq!(destination, Container::new().with_comment("kept"));

        assert!(normalizer.try_normalize_container_into(&sample_container(), &mut destination));
        assert_eq!(destination.global_comments, vec!["kept", "gc 01"]);
        assert_eq!(destination.sections.len(), 1);
    }

    // ── Idempotence & determinism ──────────────────────

    #[test]
    fn test_idempotence_all_policies() {
        let source = Container::new()
            .with_comment("c")
            .with_property(prop("b", "1"))
            .with_property(prop("a", "2"))
            .with_property(prop("B", "3"))
            .with_section(section("x").with_property(prop("k", "1")))
            .with_section(section("y").with_comment(" "))
            .with_section(section("X").with_property(prop("K", "2")));

        let sorts = [SortOrder::None, SortOrder::Ascending, SortOrder::Descending];
        for sort_order in sorts {
            for case_sensitive in [false, true] {
                for include_empty in [false, true] {
                    let normalizer = with(NormalizationOptions {
                        case_sensitive,
                        include_empty_comments: include_empty,
                        include_empty_sections: include_empty,
                        include_empty_properties: include_empty,
                        replace_on_duplicate_properties: true,
                        merge_on_duplicate_sections: true,
                        sort_order,
                        ..Default::default()
                    });
                    let once = normalizer.normalize(&source).unwrap();
                    let twice = normalizer.normalize(&once).unwrap();
                    assert_eq!(once, twice, "not idempotent for {:?}", normalizer.options());
                }
            }
        }
    }

    #[test]
    fn test_determinism_100_iterations() {
        let source = sample_container();
        let first = normalize(&source).unwrap();
        for i in 0..100 {
            let result = normalize(&source).unwrap();
            assert_eq!(first, result, "Non-determinism at iteration {}", i);
        }
    }

    // ── Strict and try forms agree ─────────────────────

    #[test]
    fn test_strict_and_try_forms_share_one_behavior_table() {
        let table: Vec<(NormalizationOptions, bool)> = vec![
            (NormalizationOptions::default(), false),
            (
                NormalizationOptions {
                    case_sensitive: true,
                    ..Default::default()
                },
                true,
            ),
            (
                NormalizationOptions {
                    throw_exceptions: false,
                    ..Default::default()
                },
                true,
            ),
            (
                NormalizationOptions {
                    merge_on_duplicate_sections: true,
                    replace_on_duplicate_properties: true,
                    ..Default::default()
                },
                true,
            ),
            (
                NormalizationOptions {
                    merge_on_duplicate_sections: true,
                    replace_on_duplicate_properties: true,
                    throw_exceptions: false,
                    ..Default::default()
                },
                true,
            ),
            (
                NormalizationOptions {
                    merge_on_duplicate_sections: true,
                    ..Default::default()
                },
                false,
            ),
        ];

        let source = Container::new()
            .with_property(prop("p01", "v1"))
            .with_section(section("s01").with_property(prop("k", "1")))
            .with_section(section("S01").with_property(prop("K", "2")));

        for (options, succeeds) in table {
            let normalizer = with(options);
            let strict = normalizer.normalize(&source);
            let tried = normalizer.try_normalize(&source);
            let mut destination = Container::new();
            let into = normalizer.try_normalize_container_into(&source, &mut destination);

            assert_eq!(strict.is_ok(), succeeds, "{:?}", normalizer.options());
            assert_eq!(tried.is_some(), succeeds);
            assert_eq!(into, succeeds);
            match strict {
                Ok(expected) => {
                    assert_eq!(tried.as_ref(), Some(&expected));
                    assert_eq!(destination, expected);
                }
                Err(_) => assert!(destination.is_empty()),
            }
        }
    }

    #[test]
    fn test_replace_wins_over_keep_first_without_throwing() {
        let source = vec![prop("p01", "v1"), prop("P01", "v2")];

        let replacing = with(NormalizationOptions {
            replace_on_duplicate_properties: true,
            throw_exceptions: false,
            ..Default::default()
        });
        let result = replacing.normalize(source.as_slice()).unwrap();
        assert_eq!(result, vec![prop("P01", "v2")]);
        assert_eq!(replacing.try_normalize(source.as_slice()), Some(result));

        let keeping = with(NormalizationOptions {
            throw_exceptions: false,
            ..Default::default()
        });
        assert_eq!(
            keeping.normalize(source.as_slice()).unwrap(),
            vec![prop("P01", "v1")]
        );

        let sections = Container::new()
            .with_section(section("s01").with_property(prop("k", "1")))
            .with_section(section("S01").with_property(prop("K", "2")));
        let merged = with(NormalizationOptions {
            merge_on_duplicate_sections: true,
            replace_on_duplicate_properties: true,
            throw_exceptions: false,
            ..Default::default()
        })
        .normalize(&sections)
        .unwrap();
        assert_eq!(merged.sections.len(), 1);
        assert_eq!(merged.sections[0].properties, vec![prop("K", "2")]);
    }
}
