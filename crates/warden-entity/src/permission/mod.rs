//! Permission and grant domain entities.

pub mod grant;
pub mod model;

pub use grant::{GroupPermissionGrant, Membership, UserPermissionGrant};
pub use model::{Permission, PermissionRef};
