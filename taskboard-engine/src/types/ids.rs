//! Identifier types.
//!
//! Server-issued identifiers are opaque string newtypes. Entities created on
//! the client before the backend has confirmed them carry a [`LocalId`]
//! instead, and [`Identity`] tags which of the two an entity currently has.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier issued by the backend
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for Identity<$name> {
            fn from(id: &str) -> Self {
                Identity::Remote($name::from(id))
            }
        }
    };
}

define_id!(
    /// Server-issued task identifier
    TaskId
);
define_id!(
    /// Server-issued column identifier
    ColumnId
);
define_id!(
    /// Server-issued board identifier
    BoardId
);

/// Client-minted placeholder for an entity the backend has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(Ulid);

impl LocalId {
    /// Mint a fresh local identity
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an entity that may not exist on the backend yet.
///
/// A `Local` identity must be replaced (not annotated) by the `Remote` one once
/// the backend confirms the create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity<R> {
    Local(LocalId),
    Remote(R),
}

impl<R> Identity<R> {
    /// A fresh local identity
    pub fn local() -> Self {
        Self::Local(LocalId::new())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The local placeholder, if the backend has not confirmed this entity yet
    pub fn as_local(&self) -> Option<LocalId> {
        match self {
            Self::Local(id) => Some(*id),
            Self::Remote(_) => None,
        }
    }

    /// The server identifier, if one has been issued
    pub fn as_remote(&self) -> Option<&R> {
        match self {
            Self::Local(_) => None,
            Self::Remote(id) => Some(id),
        }
    }
}

impl<R> From<R> for Identity<R> {
    fn from(id: R) -> Self {
        Self::Remote(id)
    }
}

impl<R: fmt::Display> fmt::Display for Identity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local:{}", id),
            Self::Remote(id) => write!(f, "{}", id),
        }
    }
}

/// Identity of a task on the board
pub type TaskKey = Identity<TaskId>;

/// Identity of a column on the board
pub type ColumnKey = Identity<ColumnId>;
