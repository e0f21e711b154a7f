//! Static visibility tables.
//!
//! # Responsibilities
//! - Declare, per record type, which fields appear in which groups
//! - Declare the link relations of a record type and their groups
//! - Answer "is X visible in group G" by plain lookup
//!
//! # Design Decisions
//! - Tables are `'static` slices so declaration order is the output order
//! - Group names are compared case-sensitively

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Named projection selecting which fields and links of a record are exposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisibilityGroup(Cow<'static, str>);

impl VisibilityGroup {
    /// Group backed by a string constant.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisibilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field exposure rule: `name → groups`.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub groups: &'static [&'static str],
}

/// Link relation rule: `rel → (href template, groups)`.
///
/// The template contains a single `{id}` placeholder.
#[derive(Debug, Clone, Copy)]
pub struct RelationRule {
    pub rel: &'static str,
    pub href: &'static str,
    pub groups: &'static [&'static str],
}

impl RelationRule {
    /// Substitute the record identifier into the href template.
    pub fn href_for(&self, id: u64) -> String {
        self.href.replace("{id}", &id.to_string())
    }
}

/// Visibility table for one record type.
#[derive(Debug)]
pub struct Schema {
    /// Record kind, used in logs and metrics labels.
    pub kind: &'static str,
    pub fields: &'static [FieldRule],
    pub relations: &'static [RelationRule],
}

/// Errors raised while resolving visibility. None of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HypermediaError {
    #[error("visibility group '{group}' is not declared for {kind}")]
    UnknownVisibilityGroup { kind: &'static str, group: String },
}

impl Schema {
    /// Fields visible in `group`, in declaration order.
    pub fn visible_fields<'a>(
        &'a self,
        group: &'a VisibilityGroup,
    ) -> impl Iterator<Item = &'a FieldRule> + 'a {
        self.fields
            .iter()
            .filter(move |rule| in_group(rule.groups, group))
    }

    /// Relations visible in `group`, in declaration order.
    pub fn visible_relations<'a>(
        &'a self,
        group: &'a VisibilityGroup,
    ) -> impl Iterator<Item = &'a RelationRule> + 'a {
        self.relations
            .iter()
            .filter(move |rule| in_group(rule.groups, group))
    }

    /// Whether any field or relation mentions `group`.
    pub fn knows_group(&self, group: &VisibilityGroup) -> bool {
        self.fields.iter().any(|f| in_group(f.groups, group))
            || self.relations.iter().any(|r| in_group(r.groups, group))
    }

    pub fn check_group(&self, group: &VisibilityGroup) -> Result<(), HypermediaError> {
        if self.knows_group(group) {
            Ok(())
        } else {
            Err(HypermediaError::UnknownVisibilityGroup {
                kind: self.kind,
                group: group.to_string(),
            })
        }
    }
}

fn in_group(groups: &[&str], group: &VisibilityGroup) -> bool {
    groups.iter().any(|g| *g == group.as_str())
}

/// A domain value the hypermedia layer can project.
///
/// Field values are read from the record's serde representation, so every
/// field named in the schema must serialize under that name.
pub trait Record: Serialize {
    /// Stable identifier substituted into link templates.
    fn id(&self) -> u64;

    /// The static visibility table of this record type.
    fn schema() -> &'static Schema
    where
        Self: Sized;
}
