//! Collaborator traits defined in `warden-core` and implemented by other
//! crates or by the embedding application.

pub mod clock;
pub mod notifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::Notifier;
