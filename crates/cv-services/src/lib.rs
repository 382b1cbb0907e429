//! crownvote/crates/cv-services/src/lib.rs
//!
//! Application services. Each one borrows ports from `cv-core` and holds
//! no state of its own between calls.

pub mod admin;
pub mod ballot;
pub mod candidates;
pub mod gate;
pub mod results;

pub use admin::{AdminService, LoginOutcome};
pub use ballot::BallotService;
pub use candidates::{CandidateService, PhotoUpload};
pub use gate::SettingsGate;
pub use results::{Audience, ResultsService};
