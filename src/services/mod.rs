//! Service layer modules for external integrations.
//!
//! Contains the Redis cache client and the intent-classification oracle.

pub mod cache;
pub mod oracle;

pub use cache::RedisCache;
pub use oracle::{IntentOracle, KeywordOracle, LlmOracle};
