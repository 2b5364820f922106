//! Command sources for grammar-built dispatchers.

use serde::{Deserialize, Serialize};

/// A source that carries a permission level for `permission` checks.
pub trait PermissionHolder {
    fn permission_level(&self) -> u32;
}

impl PermissionHolder for u8 {
    fn permission_level(&self) -> u32 {
        u32::from(*self)
    }
}

impl PermissionHolder for u32 {
    fn permission_level(&self) -> u32 {
        *self
    }
}

/// A named caller with a permission level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSource {
    pub name: String,
    #[serde(default)]
    pub permission: u32,
}

impl CommandSource {
    pub fn new(name: impl Into<String>, permission: u32) -> Self {
        Self {
            name: name.into(),
            permission,
        }
    }

    /// The server console, allowed everything.
    pub fn console() -> Self {
        Self::new("Server", 4)
    }
}

impl PermissionHolder for CommandSource {
    fn permission_level(&self) -> u32 {
        self.permission
    }
}
