//! String-keyed key-value storage boundary.
//!
//! Values are opaque strings; callers own serialization. `set` always
//! overwrites the full value for a key (no partial updates).

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryKeyValueStore;
pub use r#trait::{KeyValueStore, StorageError};
pub use sqlite::{SqliteKeyValueStore, database_path_in, default_database_path};
