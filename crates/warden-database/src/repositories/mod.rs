//! PostgreSQL implementations of the store traits.

pub mod access;
pub mod user;

pub use access::PgAccessRepository;
pub use user::PgUserRepository;
