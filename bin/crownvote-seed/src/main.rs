//! # crownvote-seed
//!
//! Wipes ballots and candidates, makes sure the default admin exists and
//! loads a demo field of three kings and three queens.

use std::sync::Arc;

use anyhow::Context;
use cv_auth_simple::SimpleAuthProvider;
use cv_config::AppConfig;
use cv_core::{CandidateRepo, Category, NewCandidate};
use cv_db_sqlite::SqliteStore;
use cv_services::AdminService;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

const DEMO_CANDIDATES: &[(&str, Category, &str)] = &[
    ("Arthur Pendleton", Category::King, "/uploads/candidates/king-1.jpg"),
    ("Marcus Hale", Category::King, "/uploads/candidates/king-2.jpg"),
    ("Julian Reyes", Category::King, "/uploads/candidates/king-3.jpg"),
    ("Sophia Laurent", Category::Queen, "/uploads/candidates/queen-1.jpg"),
    ("Isabella Chen", Category::Queen, "/uploads/candidates/queen-2.jpg"),
    ("Amara Okafor", Category::Queen, "/uploads/candidates/queen-3.jpg"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .init();

    let store = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections)
            .await
            .context("opening the database")?,
    );

    store
        .reset_ballots_and_candidates()
        .await
        .context("clearing ballots and candidates")?;
    tracing::info!("ballots and candidates cleared");

    let auth = Arc::new(SimpleAuthProvider::new(
        config.auth.jwt_secret.expose_secret().as_bytes(),
        config.auth.token_ttl_hours,
    ));
    let admins = AdminService::new(store.clone(), auth);
    let created = admins
        .ensure_admin(
            &config.seed.admin_email,
            config.seed.admin_password.expose_secret(),
            "Administrator",
        )
        .await
        .context("creating the default admin")?;
    if created {
        tracing::warn!(email = %config.seed.admin_email, "default admin created, change its password");
    } else {
        tracing::info!(email = %config.seed.admin_email, "default admin already present");
    }

    for (name, category, photo) in DEMO_CANDIDATES {
        let candidate = store
            .create_candidate(NewCandidate {
                name: name.to_string(),
                category: *category,
                photo_url: Some(photo.to_string()),
            })
            .await
            .with_context(|| format!("creating candidate {name}"))?;
        tracing::info!(id = candidate.id, name, %category, "candidate seeded");
    }

    tracing::info!(candidates = DEMO_CANDIDATES.len(), "seeding complete");
    Ok(())
}
