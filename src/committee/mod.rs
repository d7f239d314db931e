//! Committee lookup engine
//!
//! `precedence` holds the pure search over a snapshot; `lookup` binds it to
//! the beacon cache.

pub mod lookup;
pub mod precedence;

pub use lookup::{CommitteeLookup, ValidatorOverview};
pub use precedence::{
    classify_role, find_public_key, search, FlatPool, Hit, RoleStatus, SearchStep, ShardPool,
    PUBLIC_KEY_PRECEDENCE, ROLE_PRECEDENCE,
};
