//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! The store is the only authority: no port caches rows between calls.

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::IdentityKey;
use crate::models::{
    Admin, AdminClaims, AdminId, Ballot, Candidate, CandidateId, CandidatePatch, NewAdmin,
    NewBallot, NewCandidate,
};

#[cfg(feature = "testing")]
use mockall::automock;

/// Persistence for candidates. Tallies are read here but only written by
/// `BallotRepo::record_ballot`.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait CandidateRepo: Send + Sync {
    /// All candidates ordered by id.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;
    async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>>;
    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;
    /// Returns `None` when the row does not exist.
    async fn update_candidate(
        &self,
        id: CandidateId,
        patch: CandidatePatch,
    ) -> Result<Option<Candidate>>;
    /// Returns `false` when the row does not exist. Fails with `Conflict`
    /// when ballots reference the candidate.
    async fn delete_candidate(&self, id: CandidateId) -> Result<bool>;
    /// Whether any candidate still points at `photo_url`. Stored photos
    /// are content-addressed, so one file may back several candidates.
    async fn photo_in_use(&self, photo_url: &str) -> Result<bool>;
}

/// Persistence for ballots.
///
/// Implementations must back every `IdentityKey` variant with a unique
/// constraint in the store itself.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait BallotRepo: Send + Sync {
    /// Exact match on one identity key.
    async fn find_ballot(&self, key: &IdentityKey) -> Result<Option<Ballot>>;

    /// Inserts the ballot and adds 1 to both referenced tallies as one
    /// atomic unit.
    ///
    /// Fails with `AlreadyVoted` on a uniqueness violation and with
    /// `InvalidCandidate` when a reference is missing or in the wrong
    /// category. On any failure nothing is written.
    async fn record_ballot(&self, ballot: NewBallot) -> Result<Ballot>;

    /// Number of ballot rows.
    async fn count_ballots(&self) -> Result<i64>;
}

/// Flat key/value settings with upsert semantics.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Persistence for staff accounts.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait AdminRepo: Send + Sync {
    /// `email` must already be lowercase.
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>>;
    async fn get_admin(&self, id: AdminId) -> Result<Option<Admin>>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin>;
    async fn update_password(&self, id: AdminId, password_hash: &str) -> Result<()>;
}

/// Media storage contract for candidate photos.
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns the public path for `Candidate::photo_url`.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String>;
    /// Removes a previously saved file. Unknown paths are ignored.
    async fn remove(&self, photo_url: &str) -> Result<()>;
}

/// Staff credentials and bearer tokens.
#[cfg_attr(feature = "testing", automock)]
pub trait AuthProvider: Send + Sync {
    /// Produces a self-describing password hash.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies if a provided password matches a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a signed, expiring token for the admin.
    fn issue_token(&self, admin_id: AdminId) -> Result<String>;

    /// Returns the claims of a valid, unexpired token.
    fn verify_token(&self, token: &str) -> Option<AdminClaims>;
}
