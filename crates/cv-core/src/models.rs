//! # Domain Models
//!
//! These structs represent the core entities of crownvote.
//! Candidates, ballots and admins use store-assigned integer ids.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub type CandidateId = i64;
pub type AdminId = i64;

/// The two contests a ballot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    King,
    Queen,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::King => "king",
            Category::Queen => "queen",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "king" => Ok(Category::King),
            "queen" => Ok(Category::Queen),
            other => Err(AppError::ValidationError(format!(
                "category must be either \"king\" or \"queen\", got \"{other}\""
            ))),
        }
    }
}

/// A contestant and its running tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub category: Category,
    /// Public path of the photo handled by MediaStore
    pub photo_url: Option<String>,
    /// Only ever advanced by the ballot commit, one at a time.
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What voters see before results are announced: no tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCandidate {
    pub id: CandidateId,
    pub name: String,
    pub category: Category,
    pub photo_url: Option<String>,
}

impl From<&Candidate> for PublicCandidate {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            category: c.category,
            photo_url: c.photo_url.clone(),
        }
    }
}

/// Candidates split by contest, each list ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateGroups<T> {
    pub kings: Vec<T>,
    pub queens: Vec<T>,
}

impl CandidateGroups<PublicCandidate> {
    pub fn from_candidates(candidates: &[Candidate]) -> Self {
        let pick = |category: Category| -> Vec<PublicCandidate> {
            candidates
                .iter()
                .filter(|c| c.category == category)
                .map(PublicCandidate::from)
                .collect()
        };
        Self {
            kings: pick(Category::King),
            queens: pick(Category::Queen),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidate {
    pub name: String,
    pub category: Category,
    pub photo_url: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub photo_url: Option<Option<String>>,
}

/// One immutable ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub id: i64,
    pub ip_address: String,
    pub cookie_token: String,
    pub fingerprint: Option<String>,
    pub king_id: CandidateId,
    pub queen_id: CandidateId,
    pub voted_at: DateTime<Utc>,
}

/// A ballot ready to be committed by `BallotRepo::record_ballot`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBallot {
    pub ip_address: String,
    pub cookie_token: String,
    pub fingerprint: Option<String>,
    pub king_id: CandidateId,
    pub queen_id: CandidateId,
    pub voted_at: DateTime<Utc>,
}

/// The voter's choice as submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotChoice {
    pub king_id: CandidateId,
    pub queen_id: CandidateId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRef {
    pub id: CandidateId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VotedFor {
    pub king: Option<CandidateRef>,
    pub queen: Option<CandidateRef>,
}

/// Answer to "has this identity already voted?".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voted_for: Option<VotedFor>,
}

impl VoteStatus {
    pub fn not_voted() -> Self {
        Self {
            has_voted: false,
            voted_at: None,
            voted_for: None,
        }
    }
}

/// Whether a ballot must carry a device fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintPolicy {
    /// Ballots without a fingerprint are rejected.
    #[default]
    Required,
    /// Ballots fall back to the (ip, cookie) pair alone.
    Optional,
}

/// The two process-wide flags, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingFlags {
    pub voting_open: bool,
    pub results_announced: bool,
}

/// Staff account. The hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: AdminId,
    /// Always stored lowercase.
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdmin {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: AdminId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminProfile {
    fn from(a: Admin) -> Self {
        Self {
            id: a.id,
            email: a.email,
            name: a.name,
            created_at: a.created_at,
        }
    }
}

/// Claims carried by an admin bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin id
    pub sub: AdminId,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}
