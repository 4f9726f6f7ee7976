pub mod catalog_client;
pub mod local_file;
pub mod memory_store;
pub mod redis;

pub use catalog_client::CatalogClient;
pub use local_file::LocalFileStore;
pub use memory_store::MemoryStore;
pub use redis::RedisStore;
