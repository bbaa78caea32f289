//! Domain types and DTOs
//!
//! These types define the data structures for Scopeline entities: estimate
//! sessions, clarifying questions, production standards, completed jobs, and
//! the generated scope document.

pub mod classify;
pub mod jobs;
pub mod questions;
pub mod scope;
pub mod sessions;
pub mod standards;

// Re-export commonly used types
pub use jobs::*;
pub use questions::*;
pub use sessions::*;
pub use standards::*;

// Classification and scope types are accessed via their modules to avoid
// namespace pollution
