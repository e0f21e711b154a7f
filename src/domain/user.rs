//! User records.

use serde::{Deserialize, Serialize};

use crate::hateoas::{FieldRule, Record, RelationRule, Schema, VisibilityGroup};

pub const USER_SHOW: VisibilityGroup = VisibilityGroup::from_static("UserShow");

static USER_SCHEMA: Schema = Schema {
    kind: "user",
    fields: &[
        FieldRule {
            name: "id",
            groups: &["UserShow"],
        },
        FieldRule {
            name: "email",
            groups: &["UserShow"],
        },
        FieldRule {
            name: "username",
            groups: &["UserShow"],
        },
        // Never exposed.
        FieldRule {
            name: "roles",
            groups: &[],
        },
    ],
    relations: &[
        RelationRule {
            rel: "self",
            href: "/api/users/{id}/show",
            groups: &["UserShow"],
        },
        RelationRule {
            rel: "modify",
            href: "/api/users/{id}/put",
            groups: &["UserShow"],
        },
        RelationRule {
            rel: "delete",
            href: "/api/users/{id}/delete",
            groups: &["UserShow"],
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub email: String,
    pub username: String,
}

impl UserInput {
    pub fn blank_field(&self) -> Option<&'static str> {
        [("email", &self.email), ("username", &self.username)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

impl Record for User {
    fn id(&self) -> u64 {
        self.id
    }

    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }
}
