//! Product records.

use serde::{Deserialize, Serialize};

use crate::hateoas::{FieldRule, Record, RelationRule, Schema, VisibilityGroup};

/// Group used by every product endpoint.
pub const PRODUCT_DEFAULT: VisibilityGroup = VisibilityGroup::from_static("default");

static PRODUCT_SCHEMA: Schema = Schema {
    kind: "product",
    fields: &[
        FieldRule {
            name: "id",
            groups: &["default"],
        },
        FieldRule {
            name: "model",
            groups: &["default"],
        },
        FieldRule {
            name: "price",
            groups: &["default"],
        },
        FieldRule {
            name: "brand",
            groups: &["default"],
        },
    ],
    relations: &[
        RelationRule {
            rel: "self",
            href: "/api/products/{id}/show",
            groups: &["default"],
        },
        RelationRule {
            rel: "modify",
            href: "/api/products/{id}/put",
            groups: &["default"],
        },
        RelationRule {
            rel: "delete",
            href: "/api/products/{id}/delete",
            groups: &["default"],
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: u64,
    pub model: String,
    pub price: String,
    pub brand: String,
}

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub model: String,
    pub price: String,
    pub brand: String,
}

impl ProductInput {
    /// Name of the first blank required field, if any.
    pub fn blank_field(&self) -> Option<&'static str> {
        [("model", &self.model), ("price", &self.price), ("brand", &self.brand)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }

    pub fn into_product(self, id: u64) -> Product {
        Product {
            id,
            model: self.model,
            price: self.price,
            brand: self.brand,
        }
    }
}

impl Record for Product {
    fn id(&self) -> u64 {
        self.id
    }

    fn schema() -> &'static Schema {
        &PRODUCT_SCHEMA
    }
}
