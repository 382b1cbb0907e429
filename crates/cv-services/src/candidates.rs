//! Candidate management and photo attachment.

use std::sync::Arc;

use cv_core::{
    AppError, Candidate, CandidateGroups, CandidateId, CandidatePatch, CandidateRepo, MediaStore,
    NewCandidate, PublicCandidate, Result,
};

/// Where an uploaded photo ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub photo_url: String,
    pub candidate_id: Option<CandidateId>,
}

#[derive(Clone)]
pub struct CandidateService {
    repo: Arc<dyn CandidateRepo>,
    media: Arc<dyn MediaStore>,
}

impl CandidateService {
    pub fn new(repo: Arc<dyn CandidateRepo>, media: Arc<dyn MediaStore>) -> Self {
        Self { repo, media }
    }

    pub async fn list_public(&self) -> Result<CandidateGroups<PublicCandidate>> {
        let all = self.repo.list_candidates().await?;
        Ok(CandidateGroups::from_candidates(&all))
    }

    pub async fn get_public(&self, id: CandidateId) -> Result<PublicCandidate> {
        self.get(id).await.map(|c| PublicCandidate::from(&c))
    }

    pub async fn get(&self, id: CandidateId) -> Result<Candidate> {
        self.repo
            .get_candidate(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, mut candidate: NewCandidate) -> Result<Candidate> {
        candidate.name = required_name(&candidate.name)?;
        let created = self.repo.create_candidate(candidate).await?;
        tracing::info!(candidate_id = created.id, category = %created.category, "candidate created");
        Ok(created)
    }

    pub async fn update(&self, id: CandidateId, mut patch: CandidatePatch) -> Result<Candidate> {
        if let Some(name) = &patch.name {
            patch.name = Some(required_name(name)?);
        }
        let updated = self
            .repo
            .update_candidate(id, patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(candidate_id = id, "candidate updated");
        Ok(updated)
    }

    /// Deletes the row, then its photo. Candidates with ballots are kept.
    pub async fn delete(&self, id: CandidateId) -> Result<()> {
        let existing = self.get(id).await?;
        if !self.repo.delete_candidate(id).await? {
            return Err(not_found(id));
        }
        if let Some(photo) = existing.photo_url {
            self.release_photo(&photo).await;
        }
        tracing::info!(candidate_id = id, "candidate deleted");
        Ok(())
    }

    /// Stores the photo and, when `candidate_id` is given, swaps it in for
    /// the candidate's previous one. A missing candidate discards the upload.
    pub async fn attach_photo(
        &self,
        data: Vec<u8>,
        content_type: &str,
        candidate_id: Option<CandidateId>,
    ) -> Result<PhotoUpload> {
        let photo_url = self.media.save_upload(data, content_type).await?;

        let Some(id) = candidate_id else {
            return Ok(PhotoUpload {
                photo_url,
                candidate_id: None,
            });
        };

        let existing = match self.repo.get_candidate(id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                self.release_photo(&photo_url).await;
                return Err(not_found(id));
            }
            Err(e) => {
                self.release_photo(&photo_url).await;
                return Err(e);
            }
        };

        let patch = CandidatePatch {
            photo_url: Some(Some(photo_url.clone())),
            ..Default::default()
        };
        let outcome = match self.repo.update_candidate(id, patch).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(not_found(id)),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            self.release_photo(&photo_url).await;
            return Err(e);
        }

        // Content-addressed: re-uploading the same bytes yields the same path.
        if let Some(old) = existing.photo_url.filter(|old| *old != photo_url) {
            self.release_photo(&old).await;
        }

        Ok(PhotoUpload {
            photo_url,
            candidate_id: Some(id),
        })
    }

    /// Removes a stored photo once no candidate points at it. Failures
    /// only leave an orphaned file behind, so they are logged, not returned.
    async fn release_photo(&self, photo_url: &str) {
        match self.repo.photo_in_use(photo_url).await {
            Ok(true) => {
                tracing::debug!(photo_url, "photo still referenced, keeping file");
            }
            Ok(false) => {
                if let Err(e) = self.media.remove(photo_url).await {
                    tracing::warn!(photo_url, error = %e, "could not remove photo");
                }
            }
            Err(e) => {
                tracing::warn!(photo_url, error = %e, "photo reference check failed, keeping file");
            }
        }
    }
}

fn not_found(id: CandidateId) -> AppError {
    AppError::NotFound("Candidate".to_string(), id.to_string())
}

fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cv_core::{Category, MockCandidateRepo, MockMediaStore};
    use mockall::predicate::eq;

    fn candidate(id: CandidateId, photo: Option<&str>) -> Candidate {
        Candidate {
            id,
            name: "Alice".to_string(),
            category: Category::King,
            photo_url: photo.map(str::to_string),
            vote_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_create_candidate().never();
        let svc = CandidateService::new(Arc::new(repo), Arc::new(MockMediaStore::new()));

        let err = svc
            .create(NewCandidate {
                name: "   ".into(),
                category: Category::Queen,
                photo_url: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn upload_for_missing_candidate_is_discarded() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate().returning(|_| Ok(None));
        repo.expect_update_candidate().never();
        repo.expect_photo_in_use().returning(|_| Ok(false));

        let mut media = MockMediaStore::new();
        media
            .expect_save_upload()
            .returning(|_, _| Ok("/uploads/candidates/new.png".to_string()));
        media
            .expect_remove()
            .with(eq("/uploads/candidates/new.png"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = CandidateService::new(Arc::new(repo), Arc::new(media));
        let err = svc
            .attach_photo(vec![1, 2, 3], "image/png", Some(42))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn replacing_photo_removes_old_file() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate()
            .returning(|id| Ok(Some(candidate(id, Some("/uploads/candidates/old.jpg")))));
        repo.expect_update_candidate()
            .withf(|id, patch| {
                *id == 1 && patch.photo_url == Some(Some("/uploads/candidates/new.png".into()))
            })
            .times(1)
            .returning(|id, _| Ok(Some(candidate(id, Some("/uploads/candidates/new.png")))));
        repo.expect_photo_in_use()
            .with(eq("/uploads/candidates/old.jpg"))
            .returning(|_| Ok(false));

        let mut media = MockMediaStore::new();
        media
            .expect_save_upload()
            .returning(|_, _| Ok("/uploads/candidates/new.png".to_string()));
        media
            .expect_remove()
            .with(eq("/uploads/candidates/old.jpg"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = CandidateService::new(Arc::new(repo), Arc::new(media));
        let upload = svc
            .attach_photo(vec![1, 2, 3], "image/png", Some(1))
            .await
            .unwrap();
        assert_eq!(upload.candidate_id, Some(1));
        assert_eq!(upload.photo_url, "/uploads/candidates/new.png");
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate().returning(|_| Ok(None));
        repo.expect_delete_candidate().never();
        let svc = CandidateService::new(Arc::new(repo), Arc::new(MockMediaStore::new()));

        assert!(matches!(
            svc.delete(5).await,
            Err(AppError::NotFound(_, _))
        ));
    }

    #[tokio::test]
    async fn shared_photo_survives_delete() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate()
            .returning(|id| Ok(Some(candidate(id, Some("/uploads/candidates/same.png")))));
        repo.expect_delete_candidate().returning(|_| Ok(true));
        repo.expect_photo_in_use()
            .with(eq("/uploads/candidates/same.png"))
            .returning(|_| Ok(true));

        let mut media = MockMediaStore::new();
        media.expect_remove().never();

        let svc = CandidateService::new(Arc::new(repo), Arc::new(media));
        svc.delete(1).await.unwrap();
    }

    #[tokio::test]
    async fn failed_update_discards_new_upload() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate()
            .returning(|id| Ok(Some(candidate(id, None))));
        repo.expect_update_candidate()
            .returning(|_, _| Err(AppError::Internal("database is locked".into())));
        repo.expect_photo_in_use().returning(|_| Ok(false));

        let mut media = MockMediaStore::new();
        media
            .expect_save_upload()
            .returning(|_, _| Ok("/uploads/candidates/new.png".to_string()));
        media
            .expect_remove()
            .with(eq("/uploads/candidates/new.png"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = CandidateService::new(Arc::new(repo), Arc::new(media));
        let err = svc
            .attach_photo(vec![1, 2, 3], "image/png", Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn missing_candidate_wins_over_cleanup_failure() {
        let mut repo = MockCandidateRepo::new();
        repo.expect_get_candidate().returning(|_| Ok(None));
        repo.expect_photo_in_use().returning(|_| Ok(false));

        let mut media = MockMediaStore::new();
        media
            .expect_save_upload()
            .returning(|_, _| Ok("/uploads/candidates/new.png".to_string()));
        media
            .expect_remove()
            .returning(|_| Err(AppError::Internal("permission denied".into())));

        let svc = CandidateService::new(Arc::new(repo), Arc::new(media));
        let err = svc
            .attach_photo(vec![1, 2, 3], "image/png", Some(7))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Candidate".into(), "7".into()));
    }
}
