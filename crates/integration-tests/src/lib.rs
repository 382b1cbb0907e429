//! Shared fixtures for the end-to-end tests in `tests/`.

use std::path::PathBuf;
use std::sync::Arc;

use cv_api::{ApiOptions, AppState, IdentityPolicy};
use cv_auth_simple::SimpleAuthProvider;
use cv_core::{Candidate, CandidateRepo, Category, FingerprintPolicy, NewCandidate};
use cv_db_sqlite::SqliteStore;
use cv_storage_local::LocalMediaStore;

pub const ADMIN_EMAIL: &str = "admin@crownvote.test";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const UPLOAD_PREFIX: &str = "/uploads/candidates";

/// One isolated deployment: its own in-memory database and upload dir.
pub struct TestContext {
    pub store: Arc<SqliteStore>,
    pub state: AppState,
    pub upload_dir: PathBuf,
}

impl TestContext {
    pub async fn new(fingerprint: FingerprintPolicy) -> Self {
        Self::with_upload_limit(fingerprint, 8 * 1024 * 1024).await
    }

    pub async fn with_upload_limit(fingerprint: FingerprintPolicy, max_upload_bytes: usize) -> Self {
        let store = Arc::new(
            SqliteStore::new("sqlite::memory:", 1)
                .await
                .expect("in-memory store"),
        );
        let upload_dir =
            std::env::temp_dir().join(format!("crownvote-it-{}", uuid::Uuid::new_v4()));
        let media = Arc::new(LocalMediaStore::new(
            upload_dir.clone(),
            UPLOAD_PREFIX,
            max_upload_bytes,
        ));
        let auth = Arc::new(SimpleAuthProvider::new(b"integration-secret", 24));

        let state = AppState::build(
            store.clone(),
            media,
            auth,
            ApiOptions {
                fingerprint,
                identity: IdentityPolicy {
                    secure_cookie: false,
                    trust_forwarded_for: true,
                },
                max_upload_bytes,
            },
        );

        state
            .admins
            .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD, "Test Admin")
            .await
            .expect("seed admin");

        Self {
            store,
            state,
            upload_dir,
        }
    }

    pub async fn candidate(&self, name: &str, category: Category) -> Candidate {
        self.store
            .create_candidate(NewCandidate {
                name: name.to_string(),
                category,
                photo_url: None,
            })
            .await
            .expect("create candidate")
    }

    /// Alice and Bob for king, Cara for queen.
    pub async fn royal_field(&self) -> (Candidate, Candidate, Candidate) {
        (
            self.candidate("Alice", Category::King).await,
            self.candidate("Bob", Category::King).await,
            self.candidate("Cara", Category::Queen).await,
        )
    }

    pub async fn admin_token(&self) -> String {
        self.state
            .admins
            .login(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("admin login")
            .token
    }
}

/// Builds the app under test with the real router.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .configure(cv_api::configure_routes),
        )
        .await
    };
}
