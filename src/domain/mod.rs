//! Domain records and their storage.
//!
//! # Data Flow
//! ```text
//! api handlers
//!     → repository.rs (ordered in-memory records)
//!     → Product / Client / User values
//!     → hateoas (projection through each type's visibility table)
//! ```
//!
//! # Design Decisions
//! - Records are plain values; the hypermedia layer never mutates them
//! - Visibility tables live next to the record they describe

pub mod client;
pub mod product;
pub mod repository;
pub mod user;

pub use client::{Client, ClientInput, CLIENT_SHOW};
pub use product::{Product, ProductInput, PRODUCT_DEFAULT};
pub use repository::Repository;
pub use user::{User, UserInput, USER_SHOW};

/// All repositories of the service.
#[derive(Default)]
pub struct Catalog {
    pub products: Repository<Product>,
    pub clients: Repository<Client>,
    pub users: Repository<User>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hateoas::{build, Record, VisibilityGroup};

    /// Every field a schema names must exist in the record's serialized form.
    fn assert_schema_matches<R: Record>(record: &R) {
        let value = serde_json::to_value(record).unwrap();
        for rule in R::schema().fields {
            assert!(
                value.get(rule.name).is_some(),
                "{} has no field '{}'",
                R::schema().kind,
                rule.name
            );
        }
    }

    fn product() -> Product {
        Product { id: 42, model: "X1".into(), price: "999".into(), brand: "Acme".into() }
    }

    fn client() -> Client {
        Client { id: 7, name: "Shop".into(), email: "shop@example.com".into(), user: 3 }
    }

    fn user() -> User {
        User {
            id: 3,
            email: "u@example.com".into(),
            username: "u".into(),
            roles: vec!["ROLE_USER".into()],
        }
    }

    #[test]
    fn test_schemas_match_records() {
        assert_schema_matches(&product());
        assert_schema_matches(&client());
        assert_schema_matches(&user());
    }

    #[test]
    fn test_product_links() {
        let e = build(&product(), &PRODUCT_DEFAULT);
        assert_eq!(e.link("self").unwrap().href, "/api/products/42/show");
        assert_eq!(e.link("modify").unwrap().href, "/api/products/42/put");
        assert_eq!(e.link("delete").unwrap().href, "/api/products/42/delete");
    }

    #[test]
    fn test_client_projection_depends_on_group() {
        let admin = build(&client(), &CLIENT_SHOW);
        assert!(admin.field("user").is_some());
        assert!(admin.link("modify").is_some());

        let own = build(&client(), &USER_SHOW);
        assert!(own.field("user").is_none());
        assert!(own.link("modify").is_none());
        assert_eq!(own.link("self").unwrap().href, "/api/clients/7/show");
    }

    #[test]
    fn test_user_roles_never_exposed() {
        let e = build(&user(), &USER_SHOW);
        assert!(e.field("roles").is_none());
        assert_eq!(e.field_names().collect::<Vec<_>>(), vec!["id", "email", "username"]);
    }

    #[test]
    fn test_product_in_user_group_exposes_nothing() {
        let e = build(&product(), &VisibilityGroup::from_static("UserShow"));
        assert_eq!(e, crate::hateoas::Envelope::empty());
    }
}
