//! Group/permission resolution and the access gate.

pub mod gate;
pub mod resolver;

pub use gate::{AccessGate, Decision};
pub use resolver::PermissionResolver;
