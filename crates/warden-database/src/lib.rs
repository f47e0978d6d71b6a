//! # warden-database
//!
//! Persistence for Warden. The authentication engine only sees the
//! [`UserStore`] and [`AccessStore`] traits; this crate ships a PostgreSQL
//! implementation of each plus a [`MemoryStore`] implementing both.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AccessStore, UserStore};
