//! # Settings gate
//!
//! The two process-wide booleans, read fresh from the settings store on
//! every call. Absence means default.

use std::sync::Arc;

use cv_core::{AppError, Result, SettingsRepo, VotingFlags};

pub const VOTING_OPEN: &str = "voting_open";
pub const RESULTS_ANNOUNCED: &str = "results_announced";

#[derive(Clone)]
pub struct SettingsGate {
    repo: Arc<dyn SettingsRepo>,
}

impl SettingsGate {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self { repo }
    }

    /// Defaults to open.
    pub async fn voting_open(&self) -> Result<bool> {
        self.flag(VOTING_OPEN, true).await
    }

    /// Defaults to hidden.
    pub async fn results_announced(&self) -> Result<bool> {
        self.flag(RESULTS_ANNOUNCED, false).await
    }

    pub async fn flags(&self) -> Result<VotingFlags> {
        Ok(VotingFlags {
            voting_open: self.voting_open().await?,
            results_announced: self.results_announced().await?,
        })
    }

    pub async fn set_voting_open(&self, open: bool) -> Result<()> {
        self.repo.put_setting(VOTING_OPEN, bool_text(open)).await?;
        tracing::info!(open, "voting gate updated");
        Ok(())
    }

    pub async fn set_results_announced(&self, announced: bool) -> Result<()> {
        self.repo
            .put_setting(RESULTS_ANNOUNCED, bool_text(announced))
            .await?;
        tracing::info!(announced, "results gate updated");
        Ok(())
    }

    /// Fails with `VotingClosed` unless the gate is open right now.
    pub async fn require_voting_open(&self) -> Result<()> {
        if self.voting_open().await? {
            Ok(())
        } else {
            Err(AppError::VotingClosed)
        }
    }

    async fn flag(&self, key: &str, default: bool) -> Result<bool> {
        Ok(match self.repo.get_setting(key).await? {
            Some(value) => value == "true",
            None => default,
        })
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
