//! crownvote/crates/cv-core/src/lib.rs
//!
//! The central domain logic and interface definitions for crownvote.

pub mod error;
pub mod identity;
pub mod models;
pub mod tally;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use identity::*;
pub use models::*;
pub use tally::*;
pub use traits::*;
