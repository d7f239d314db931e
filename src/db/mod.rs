//! Node record persistence

pub mod mongo;
pub mod schemas;
pub mod store;

pub use mongo::MongoClient;
pub use store::{MemoryNodeStore, MongoNodeStore, NodeFilter, NodePatch, NodeRecord, NodeStore};
