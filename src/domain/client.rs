//! Client records.
//!
//! A client belongs to the user who created it. The owner id is only
//! exposed in the `ClientShow` projection; the `UserShow` projection (a
//! user's own client list) exposes the contact fields and a self link.

use serde::{Deserialize, Serialize};

use crate::hateoas::{FieldRule, Record, RelationRule, Schema, VisibilityGroup};

pub const CLIENT_SHOW: VisibilityGroup = VisibilityGroup::from_static("ClientShow");

static CLIENT_SCHEMA: Schema = Schema {
    kind: "client",
    fields: &[
        FieldRule {
            name: "id",
            groups: &["ClientShow", "UserShow"],
        },
        FieldRule {
            name: "name",
            groups: &["ClientShow", "UserShow"],
        },
        FieldRule {
            name: "email",
            groups: &["ClientShow", "UserShow"],
        },
        FieldRule {
            name: "user",
            groups: &["ClientShow"],
        },
    ],
    relations: &[
        RelationRule {
            rel: "self",
            href: "/api/clients/{id}/show",
            groups: &["ClientShow", "UserShow"],
        },
        RelationRule {
            rel: "modify",
            href: "/api/clients/{id}/put",
            groups: &["ClientShow"],
        },
        RelationRule {
            rel: "delete",
            href: "/api/clients/{id}/delete",
            groups: &["ClientShow"],
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// Owning user.
    pub user: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
}

impl ClientInput {
    pub fn blank_field(&self) -> Option<&'static str> {
        [("name", &self.name), ("email", &self.email)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

impl Record for Client {
    fn id(&self) -> u64 {
        self.id
    }

    fn schema() -> &'static Schema {
        &CLIENT_SCHEMA
    }
}
