//! Group entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use warden_core::types::GroupId;

/// A named set of users sharing permission grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Group {
    /// Unique group identifier.
    pub id: GroupId,
    /// Unique group name.
    pub name: String,
    /// Optional human description.
    pub definition: Option<String>,
}

/// A group referenced either by id or by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupRef {
    /// Numeric identifier.
    Id(GroupId),
    /// Unique name.
    Name(String),
}

impl From<GroupId> for GroupRef {
    fn from(id: GroupId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for GroupRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for GroupRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl FromStr for GroupRef {
    type Err = Infallible;

    /// All-digit input is read as an id, anything else as a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if s.bytes().all(|b| b.is_ascii_digit()) => Ok(Self::Id(GroupId(id))),
            _ => Ok(Self::Name(s.to_string())),
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}
