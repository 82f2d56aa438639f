use std::fmt;

use serde::{Deserialize, Serialize};

/// Roles an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a role from a string, ignoring case.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ADMIN_AND_USER: &[Role] = &[Role::Admin, Role::User];

/// Every RPC method exposed by the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Login,
    CreateRecord,
    SearchRecords,
    UploadAttachment,
    RateRecord,
}

impl Method {
    /// Roles entitled to call this method, or `None` when the method is open.
    pub const fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Self::Login | Self::SearchRecords => None,
            Self::CreateRecord | Self::UploadAttachment => Some(ADMIN_ONLY),
            Self::RateRecord => Some(ADMIN_AND_USER),
        }
    }

    /// Whether calls to this method must carry an access token.
    pub const fn requires_token(self) -> bool {
        self.allowed_roles().is_some()
    }

    /// Whether `role` may call this method. Open methods admit every role.
    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles()
            .is_none_or(|allowed| allowed.contains(&role))
    }

    /// Fully qualified method name, used in logs and spans.
    pub const fn full_name(self) -> &'static str {
        match self {
            Self::Login => "/vitrine.AuthService/Login",
            Self::CreateRecord => "/vitrine.CatalogService/CreateRecord",
            Self::SearchRecords => "/vitrine.CatalogService/SearchRecords",
            Self::UploadAttachment => "/vitrine.CatalogService/UploadAttachment",
            Self::RateRecord => "/vitrine.CatalogService/RateRecord",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}
