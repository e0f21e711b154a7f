//! Hypermedia envelope building.
//!
//! # Responsibilities
//! - Project a record's fields through its visibility table
//! - Generate self / modify / delete links for the requested group
//! - Wrap a page of records with `_embedded` items and page metadata
//!
//! # Wire Shape
//! ```text
//! { "<field>": <value>, ...,
//!   "_links": [ {"rel": "self", "href": "..."}, ... ],
//!   "_embedded": [ <envelope>, ... ],          // lists only
//!   "page": 1, "pageSize": 10, "total": 25 }   // lists only
//! ```

use axum::body::Bytes;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::hateoas::paginator::Page;
use crate::hateoas::visibility::{Record, VisibilityGroup};
use crate::observability::metrics;

/// A navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// Pagination metadata attached to list envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

/// The exposed projection of one record or a page of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    fields: Vec<(String, Value)>,
    links: Vec<Link>,
    embedded: Option<Vec<Envelope>>,
    page: Option<PageMeta>,
}

impl Envelope {
    /// Envelope with neither fields nor links.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Project `record` for `group`.
    pub fn from_record<R: Record>(record: &R, group: &VisibilityGroup) -> Self {
        let schema = R::schema();
        if let Err(e) = schema.check_group(group) {
            tracing::debug!(error = %e, "Exposing nothing for unknown visibility group");
            metrics::record_unknown_group(schema.kind);
            return Self::empty();
        }

        let source = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(
                    kind = schema.kind,
                    id = record.id(),
                    "Record did not serialize to an object"
                );
                serde_json::Map::new()
            }
        };

        let fields = schema
            .visible_fields(group)
            .filter_map(|rule| {
                source
                    .get(rule.name)
                    .map(|value| (rule.name.to_string(), value.clone()))
            })
            .collect();

        let links = schema
            .visible_relations(group)
            .map(|rule| Link {
                rel: rule.rel.to_string(),
                href: rule.href_for(record.id()),
            })
            .collect();

        Self {
            fields,
            links,
            embedded: None,
            page: None,
        }
    }

    /// Wrap a page: one envelope per item under `_embedded`, plus page metadata.
    pub fn from_page<R: Record>(page: &Page<R>, group: &VisibilityGroup) -> Self {
        let embedded = page
            .items
            .iter()
            .map(|item| Self::from_record(item, group))
            .collect();

        Self {
            fields: Vec::new(),
            links: Vec::new(),
            embedded: Some(embedded),
            page: Some(PageMeta {
                page: page.page_number,
                page_size: page.page_size,
                total: page.total_items,
            }),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    pub fn embedded(&self) -> Option<&[Envelope]> {
        self.embedded.as_deref()
    }

    pub fn page_meta(&self) -> Option<PageMeta> {
        self.page
    }

    /// Serialize to the JSON body the annotator hashes.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        if !self.links.is_empty() {
            map.serialize_entry("_links", &self.links)?;
        }
        if let Some(embedded) = &self.embedded {
            map.serialize_entry("_embedded", embedded)?;
        }
        if let Some(meta) = &self.page {
            map.serialize_entry("page", &meta.page)?;
            map.serialize_entry("pageSize", &meta.page_size)?;
            map.serialize_entry("total", &meta.total)?;
        }
        map.end()
    }
}

/// Anything that can be projected into an [`Envelope`].
pub trait Hypermedia {
    fn to_envelope(&self, group: &VisibilityGroup) -> Envelope;
}

impl<R: Record> Hypermedia for R {
    fn to_envelope(&self, group: &VisibilityGroup) -> Envelope {
        Envelope::from_record(self, group)
    }
}

impl<R: Record> Hypermedia for Page<R> {
    fn to_envelope(&self, group: &VisibilityGroup) -> Envelope {
        Envelope::from_page(self, group)
    }
}

/// Build the envelope of a record or a page for `group`.
pub fn build<H: Hypermedia + ?Sized>(input: &H, group: &VisibilityGroup) -> Envelope {
    input.to_envelope(group)
}
