//! # Ballot service
//!
//! Duplicate detection and the single write path for ballots.
//!
//! The pre-check here only spares the store a doomed transaction. The
//! unique constraints behind `BallotRepo::record_ballot` are what actually
//! stop two racing submissions from the same identity.

use std::sync::Arc;

use chrono::Utc;
use cv_core::{
    AppError, Ballot, BallotChoice, BallotRepo, CandidateId, CandidateRef, CandidateRepo,
    Category, FingerprintPolicy, NewBallot, Result, VoteStatus, VotedFor, VoterIdentity,
};

use crate::gate::SettingsGate;

#[derive(Clone)]
pub struct BallotService {
    candidates: Arc<dyn CandidateRepo>,
    ballots: Arc<dyn BallotRepo>,
    gate: SettingsGate,
    policy: FingerprintPolicy,
}

impl BallotService {
    pub fn new(
        candidates: Arc<dyn CandidateRepo>,
        ballots: Arc<dyn BallotRepo>,
        gate: SettingsGate,
        policy: FingerprintPolicy,
    ) -> Self {
        Self {
            candidates,
            ballots,
            gate,
            policy,
        }
    }

    /// Probes every identity key in priority order and returns the first
    /// ballot found. Lookup failures propagate; they never read as "not voted".
    pub async fn find_prior_ballot(&self, identity: &VoterIdentity) -> Result<Option<Ballot>> {
        for key in identity.lookup_keys() {
            if let Some(ballot) = self.ballots.find_ballot(&key).await? {
                tracing::debug!(key = key.kind(), ballot_id = ballot.id, "prior ballot found");
                return Ok(Some(ballot));
            }
        }
        Ok(None)
    }

    /// Read-only status for the voting page, with the earlier choice when
    /// there is one.
    pub async fn check_status(&self, identity: &VoterIdentity) -> Result<VoteStatus> {
        let Some(ballot) = self.find_prior_ballot(identity).await? else {
            return Ok(VoteStatus::not_voted());
        };

        let king = self.candidate_ref(ballot.king_id).await?;
        let queen = self.candidate_ref(ballot.queen_id).await?;

        Ok(VoteStatus {
            has_voted: true,
            voted_at: Some(ballot.voted_at),
            voted_for: Some(VotedFor { king, queen }),
        })
    }

    /// Records one ballot for `identity`.
    ///
    /// Order: gate, fingerprint policy, duplicate pre-check, candidate
    /// validation, atomic commit. Every rejection leaves the store untouched.
    pub async fn submit(&self, identity: &VoterIdentity, choice: BallotChoice) -> Result<Ballot> {
        self.gate.require_voting_open().await?;

        if self.policy == FingerprintPolicy::Required && identity.fingerprint.is_none() {
            return Err(AppError::ValidationError(
                "Device fingerprint is required".to_string(),
            ));
        }

        if let Some(prior) = self.find_prior_ballot(identity).await? {
            tracing::info!(ballot_id = prior.id, "repeat ballot rejected by pre-check");
            return Err(AppError::AlreadyVoted);
        }

        self.require_candidate(choice.king_id, Category::King).await?;
        self.require_candidate(choice.queen_id, Category::Queen).await?;

        let ballot = NewBallot {
            ip_address: identity.ip_address.clone(),
            cookie_token: identity.cookie_token.clone(),
            fingerprint: identity.fingerprint.clone(),
            king_id: choice.king_id,
            queen_id: choice.queen_id,
            voted_at: Utc::now(),
        };

        match self.ballots.record_ballot(ballot).await {
            Ok(ballot) => {
                tracing::info!(
                    ballot_id = ballot.id,
                    king_id = ballot.king_id,
                    queen_id = ballot.queen_id,
                    "ballot recorded"
                );
                Ok(ballot)
            }
            Err(AppError::AlreadyVoted) => {
                tracing::info!("repeat ballot rejected by store constraint");
                Err(AppError::AlreadyVoted)
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(error = %e, "ballot commit failed");
                }
                Err(e)
            }
        }
    }

    async fn require_candidate(&self, id: CandidateId, category: Category) -> Result<()> {
        match self.candidates.get_candidate(id).await? {
            Some(c) if c.category == category => Ok(()),
            _ => {
                tracing::debug!(candidate_id = id, %category, "ballot names an invalid candidate");
                Err(AppError::InvalidCandidate(format!("Invalid {category} candidate")))
            }
        }
    }

    async fn candidate_ref(&self, id: CandidateId) -> Result<Option<CandidateRef>> {
        Ok(self
            .candidates
            .get_candidate(id)
            .await?
            .map(|c| CandidateRef { id: c.id, name: c.name }))
    }
}
