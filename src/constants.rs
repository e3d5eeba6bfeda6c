//! Well-known names and defaults

/// Name of the protected super-user role (always holds `all.all = true`)
pub const WEBMASTER_ROLE: &str = "Webmaster";

/// Description stored on a recreated Webmaster role
pub const WEBMASTER_DESCRIPTION: &str = "Full access to every component";

// Collection names for hierarchical documents
pub const ROLES: &str = "roles";
pub const CATEGORIES: &str = "categories";
pub const TAGS: &str = "tags";

// Document field names used by filters and sorts
pub const FIELD_ID: &str = "id";
pub const FIELD_PARENT: &str = "parent";
pub const FIELD_ORDER: &str = "order";
pub const FIELD_NAME: &str = "name";

/// Default permission definitions: component -> actions it accepts.
/// Every component accepts `all`.
pub const DEFAULT_DEFINITIONS: &[(&str, &[&str])] = &[
    ("all", &["all"]),
    ("article", &["all", "create", "read", "edit", "delete", "publish", "reorder"]),
    ("category", &["all", "create", "read", "edit", "delete", "reorder"]),
    ("tag", &["all", "create", "read", "edit", "delete", "reorder"]),
    ("user", &["all", "create", "read", "edit", "delete"]),
    ("role", &["all", "create", "read", "edit", "delete", "reorder"]),
    ("config", &["all", "read", "edit"]),
];
