//! Group domain entities.

pub mod model;

pub use model::{Group, GroupRef};
