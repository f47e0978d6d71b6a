//! In-process store backed by `dashmap`.

pub mod store;

pub use store::MemoryStore;
