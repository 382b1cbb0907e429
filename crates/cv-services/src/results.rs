//! Results read path. No coordination: tallies are whatever the last
//! committed ballot left behind.

use std::sync::Arc;

use chrono::Utc;
use cv_core::{rank, AppError, BallotRepo, CandidateRepo, Result, ResultsBoard, ResultsSummary};

use crate::gate::SettingsGate;

/// Who is asking for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Admin,
}

#[derive(Clone)]
pub struct ResultsService {
    candidates: Arc<dyn CandidateRepo>,
    ballots: Arc<dyn BallotRepo>,
    gate: SettingsGate,
}

impl ResultsService {
    pub fn new(
        candidates: Arc<dyn CandidateRepo>,
        ballots: Arc<dyn BallotRepo>,
        gate: SettingsGate,
    ) -> Self {
        Self {
            candidates,
            ballots,
            gate,
        }
    }

    /// Ranked board. The public only sees it once results are announced.
    pub async fn board(&self, audience: Audience) -> Result<ResultsBoard> {
        if audience == Audience::Public && !self.gate.results_announced().await? {
            return Err(AppError::ResultsHidden);
        }

        let candidates = self.candidates.list_candidates().await?;
        let total = self.ballots.count_ballots().await?;
        Ok(rank(&candidates, total, Utc::now()))
    }

    pub async fn summary(&self, audience: Audience) -> Result<ResultsSummary> {
        Ok(self.board(audience).await?.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::{Candidate, Category, MockBallotRepo, MockCandidateRepo, MockSettingsRepo};

    fn gate(announced: bool) -> SettingsGate {
        let mut settings = MockSettingsRepo::new();
        settings
            .expect_get_setting()
            .returning(move |_| Ok(Some(announced.to_string())));
        SettingsGate::new(Arc::new(settings))
    }

    fn candidate(id: i64, name: &str, category: Category, votes: i64) -> Candidate {
        Candidate {
            id,
            name: name.to_string(),
            category,
            photo_url: None,
            vote_count: votes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn roster() -> MockCandidateRepo {
        let mut repo = MockCandidateRepo::new();
        repo.expect_list_candidates().returning(|| {
            Ok(vec![
                candidate(1, "Alice", Category::King, 1),
                candidate(2, "Bob", Category::King, 0),
                candidate(3, "Cara", Category::Queen, 1),
            ])
        });
        repo
    }

    #[tokio::test]
    async fn hidden_from_public_until_announced() {
        let mut ballots = MockBallotRepo::new();
        ballots.expect_count_ballots().returning(|| Ok(1));
        let svc = ResultsService::new(Arc::new(roster()), Arc::new(ballots), gate(false));

        assert_eq!(svc.board(Audience::Public).await, Err(AppError::ResultsHidden));
        assert!(svc.board(Audience::Admin).await.is_ok());
    }

    #[tokio::test]
    async fn total_counts_ballots_not_tallies() {
        let mut ballots = MockBallotRepo::new();
        ballots.expect_count_ballots().returning(|| Ok(1));
        let svc = ResultsService::new(Arc::new(roster()), Arc::new(ballots), gate(true));

        let board = svc.board(Audience::Public).await.unwrap();
        assert_eq!(board.total_votes, 1);
        assert_eq!(board.kings[0].name, "Alice");
        assert_eq!(board.kings[0].percentage, 100.0);
        assert_eq!(board.kings[1].percentage, 0.0);
        assert_eq!(board.queens[0].percentage, 100.0);

        let summary = svc.summary(Audience::Public).await.unwrap();
        assert_eq!(summary.king.unwrap().name, "Alice");
    }
}
