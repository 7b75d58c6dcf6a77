mod api;
mod error;
mod file_store;
mod memory_store;
mod paths;

pub use api::*;
pub use error::*;
pub use file_store::FileKeyValueStore;
pub use memory_store::InMemoryKeyValueStore;
pub use paths::default_data_dir;
