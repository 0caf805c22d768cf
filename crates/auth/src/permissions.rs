use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. "procurement.requisitions.approve").
///
/// `"*"` is the wildcard a policy grants to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const PROJECTS_READ: Permission = Permission(Cow::Borrowed("procurement.projects.read"));
    pub const PROJECTS_WRITE: Permission = Permission(Cow::Borrowed("procurement.projects.write"));
    pub const CATALOG_WRITE: Permission = Permission(Cow::Borrowed("procurement.catalog.write"));
    pub const REQUISITIONS_READ: Permission =
        Permission(Cow::Borrowed("procurement.requisitions.read"));
    pub const REQUISITIONS_WRITE: Permission =
        Permission(Cow::Borrowed("procurement.requisitions.write"));
    pub const REQUISITIONS_APPROVE: Permission =
        Permission(Cow::Borrowed("procurement.requisitions.approve"));
    pub const REQUISITIONS_REJECT: Permission =
        Permission(Cow::Borrowed("procurement.requisitions.reject"));
    pub const REQUISITIONS_COMMENT: Permission =
        Permission(Cow::Borrowed("procurement.requisitions.comment"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
