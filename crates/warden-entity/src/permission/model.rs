//! Permission entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use warden_core::types::PermissionId;

/// A named action that can be granted to users or groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: PermissionId,
    /// Unique permission name, e.g. `"publish"`.
    pub name: String,
    /// Optional human description.
    pub definition: Option<String>,
}

/// A permission referenced either by id or by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionRef {
    /// Numeric identifier.
    Id(PermissionId),
    /// Unique name.
    Name(String),
}

impl From<PermissionId> for PermissionRef {
    fn from(id: PermissionId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PermissionRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl FromStr for PermissionRef {
    type Err = Infallible;

    /// All-digit input is read as an id, anything else as a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if s.bytes().all(|b| b.is_ascii_digit()) => Ok(Self::Id(PermissionId(id))),
            _ => Ok(Self::Name(s.to_string())),
        }
    }
}

impl fmt::Display for PermissionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}
