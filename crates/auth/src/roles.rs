use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role carried in the token (e.g. "MANAGER").
///
/// Roles are opaque at this layer; the API's policy maps them to permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMINISTRATOR: Role = Role(Cow::Borrowed("ADMINISTRATOR"));
    pub const MANAGER: Role = Role(Cow::Borrowed("MANAGER"));
    pub const SUPERVISOR: Role = Role(Cow::Borrowed("SUPERVISOR"));
    pub const MEMBER: Role = Role(Cow::Borrowed("MEMBER"));
    pub const VIEWER: Role = Role(Cow::Borrowed("VIEWER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
