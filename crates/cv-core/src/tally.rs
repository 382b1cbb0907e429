//! # Tally
//!
//! Read-only ranking over candidate rows. Pure; the caller supplies the
//! ballot total counted from the ballot table, not summed from tallies,
//! since every ballot bumps one king and one queen.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Candidate, CandidateId, Category};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub id: CandidateId,
    pub name: String,
    pub category: Category,
    pub photo_url: Option<String>,
    pub vote_count: i64,
    /// Share of all ballots, one decimal place.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsBoard {
    pub kings: Vec<RankedCandidate>,
    pub queens: Vec<RankedCandidate>,
    pub total_votes: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub king: Option<RankedCandidate>,
    pub queen: Option<RankedCandidate>,
    pub total_votes: i64,
}

impl ResultsBoard {
    /// Current leaders; ties go to the lower id.
    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary {
            king: self.kings.first().cloned(),
            queen: self.queens.first().cloned(),
            total_votes: self.total_votes,
        }
    }
}

/// `votes / total * 100` rounded to one decimal; 0 when nobody voted.
pub fn percentage(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (votes as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Groups by category and sorts each group by votes descending.
/// Input order is kept for ties, so pass candidates ordered by id.
pub fn rank(candidates: &[Candidate], total_votes: i64, timestamp: DateTime<Utc>) -> ResultsBoard {
    let group = |category: Category| {
        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .filter(|c| c.category == category)
            .map(|c| RankedCandidate {
                id: c.id,
                name: c.name.clone(),
                category: c.category,
                photo_url: c.photo_url.clone(),
                vote_count: c.vote_count,
                percentage: percentage(c.vote_count, total_votes),
            })
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
        ranked
    };

    ResultsBoard {
        kings: group(Category::King),
        queens: group(Category::Queen),
        total_votes,
        timestamp,
    }
}
