//! User domain entities.

pub mod attempts;
pub mod model;
pub mod status;
pub mod variable;

pub use attempts::LoginAttemptState;
pub use model::{CreateUser, User};
pub use status::AccountStatus;
pub use variable::UserVariable;
