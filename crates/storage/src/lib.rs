#![forbid(unsafe_code)]

pub mod codec;
pub mod repository;
pub mod sqlite;

pub use repository::{
    AttemptRepository, InMemoryRepository, SnapshotRepository, Storage, StorageError,
};
