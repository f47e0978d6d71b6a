//! Session domain entities.

pub mod model;
pub mod token;

pub use model::{Session, SessionOrigin};
pub use token::{IssuedRememberToken, RememberCredential, RememberToken};
