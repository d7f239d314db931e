//! MongoDB document schemas

mod node;

pub use node::{NodeDoc, NodeMetadata, DELETED_FIELD, NODE_COLLECTION, UPDATED_AT_FIELD};
