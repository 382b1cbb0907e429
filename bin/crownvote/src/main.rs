//! # crownvote
//!
//! The server binary. Plugins are chosen at compile time through features;
//! everything else comes from `cv_config::AppConfig`.

use std::sync::Arc;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use cv_api::{middleware, ApiOptions, AppState, IdentityPolicy};
use cv_config::{AppConfig, LogConfig, LogFormat};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use cv_db_sqlite::SqliteStore;

#[cfg(feature = "storage-local")]
use cv_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use cv_auth_simple::SimpleAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!("crownvote needs a database, a media store and an auth plugin enabled");

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => fmt.json().init(),
        LogFormat::Pretty => fmt.init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    for key in config.insecure_defaults() {
        tracing::warn!(key, "built-in default in use, override it outside development");
    }

    // 1. Database
    let store = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections)
            .await
            .context("opening the database")?,
    );

    // 2. Photo storage
    tokio::fs::create_dir_all(&config.media.upload_dir)
        .await
        .with_context(|| format!("creating {}", config.media.upload_dir.display()))?;
    let media = Arc::new(LocalMediaStore::new(
        config.media.upload_dir.clone(),
        config.media.url_prefix.clone(),
        config.media.max_upload_bytes,
    ));

    // 3. Auth
    let auth = Arc::new(SimpleAuthProvider::new(
        config.auth.jwt_secret.expose_secret().as_bytes(),
        config.auth.token_ttl_hours,
    ));

    let state = web::Data::new(AppState::build(
        store,
        media,
        auth,
        ApiOptions {
            fingerprint: config.voting.fingerprint,
            identity: IdentityPolicy {
                secure_cookie: config.environment.is_production(),
                trust_forwarded_for: config.voting.trust_forwarded_for,
            },
            max_upload_bytes: config.media.max_upload_bytes,
        },
    ));

    let (host, port) = config.bind_addr();
    tracing::info!(
        %host,
        port,
        fingerprint = ?config.voting.fingerprint,
        environment = ?config.environment,
        "crownvote starting"
    );

    let origins = config.cors.allowed_origins.clone();
    let media_prefix = config.media.url_prefix.clone();
    let media_dir = config.media.upload_dir.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy(&origins))
            .wrap(middleware::standard_middleware())
            .configure(cv_api::configure_routes)
            .service(Files::new(&media_prefix, &media_dir))
    })
    .bind((host, port))
    .context("binding the listener")?
    .run()
    .await
    .context("server terminated")?;

    tracing::info!("crownvote stopped");
    Ok(())
}
