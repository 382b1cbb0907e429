use std::sync::Arc;

use cv_core::{
    AdminRepo, AuthProvider, BallotRepo, CandidateRepo, FingerprintPolicy, MediaStore, SettingsRepo,
};
use cv_services::{AdminService, BallotService, CandidateService, ResultsService, SettingsGate};

use crate::identity::IdentityPolicy;

/// Per-deployment knobs that reach the HTTP layer.
#[derive(Debug, Clone, Copy)]
pub struct ApiOptions {
    pub fingerprint: FingerprintPolicy,
    pub identity: IdentityPolicy,
    pub max_upload_bytes: usize,
}

/// State shared across all actix-web workers.
#[derive(Clone)]
pub struct AppState {
    pub ballots: BallotService,
    pub candidates: CandidateService,
    pub results: ResultsService,
    pub gate: SettingsGate,
    pub admins: AdminService,
    pub identity: IdentityPolicy,
    /// Upper bound for a multipart photo, checked while streaming.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wires every service over one store implementing all repositories.
    pub fn build<S>(
        store: Arc<S>,
        media: Arc<dyn MediaStore>,
        auth: Arc<dyn AuthProvider>,
        options: ApiOptions,
    ) -> Self
    where
        S: CandidateRepo + BallotRepo + SettingsRepo + AdminRepo + 'static,
    {
        let candidate_repo: Arc<dyn CandidateRepo> = store.clone();
        let ballot_repo: Arc<dyn BallotRepo> = store.clone();
        let settings_repo: Arc<dyn SettingsRepo> = store.clone();
        let admin_repo: Arc<dyn AdminRepo> = store;

        let gate = SettingsGate::new(settings_repo);
        Self {
            ballots: BallotService::new(
                candidate_repo.clone(),
                ballot_repo.clone(),
                gate.clone(),
                options.fingerprint,
            ),
            candidates: CandidateService::new(candidate_repo.clone(), media),
            results: ResultsService::new(candidate_repo, ballot_repo, gate.clone()),
            gate,
            admins: AdminService::new(admin_repo, auth),
            identity: options.identity,
            max_upload_bytes: options.max_upload_bytes,
        }
    }
}
