//! # cv-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cv-core` domain models, and owns the schema whose unique
//! constraints enforce one ballot per identity.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cv_core::error::{AppError, Result};
use cv_core::identity::IdentityKey;
use cv_core::models::{
    Admin, AdminId, Ballot, Candidate, CandidateId, CandidatePatch, Category, NewAdmin, NewBallot,
    NewCandidate,
};
use cv_core::traits::{AdminRepo, BallotRepo, CandidateRepo, SettingsRepo};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;

const CANDIDATE_COLUMNS: &str =
    "id, name, category, photo_url, vote_count, created_at, updated_at";
const BALLOT_COLUMNS: &str =
    "id, ip_address, cookie_id, fingerprint, king_id, queen_id, voted_at";
const ADMIN_COLUMNS: &str = "id, email, password_hash, name, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects, creating the database file if needed, and applies
    /// pending migrations.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut opts = SqliteConnectOptions::from_str(url)
            .map_err(store_err)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }

        // Each connection to an in-memory URL opens a separate database,
        // so those pools hold exactly one connection for their whole life.
        let pool_opts = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_opts.connect_with(opts).await.map_err(store_err)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))?;

        tracing::info!(url, in_memory, "sqlite store ready");
        Ok(Self { pool })
    }

    /// Bulk administrative reset: every ballot, then every candidate.
    pub async fn reset_ballots_and_candidates(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        sqlx::query("DELETE FROM votes")
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM candidates")
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('votes', 'candidates')")
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        tracing::warn!("all ballots and candidates deleted");
        Ok(())
    }
}

fn store_err(e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, "sqlite operation failed");
    AppError::Internal(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn row_to_candidate(row: &SqliteRow) -> Result<Candidate> {
    let category: String = row.try_get("category").map_err(store_err)?;
    Ok(Candidate {
        id: row.try_get("id").map_err(store_err)?,
        name: row.try_get("name").map_err(store_err)?,
        category: category
            .parse()
            .map_err(|_| AppError::Internal(format!("corrupt category {category:?}")))?,
        photo_url: row.try_get("photo_url").map_err(store_err)?,
        vote_count: row.try_get("vote_count").map_err(store_err)?,
        created_at: row.try_get("created_at").map_err(store_err)?,
        updated_at: row.try_get("updated_at").map_err(store_err)?,
    })
}

fn row_to_ballot(row: &SqliteRow) -> Result<Ballot> {
    Ok(Ballot {
        id: row.try_get("id").map_err(store_err)?,
        ip_address: row.try_get("ip_address").map_err(store_err)?,
        cookie_token: row.try_get("cookie_id").map_err(store_err)?,
        fingerprint: row.try_get("fingerprint").map_err(store_err)?,
        king_id: row.try_get("king_id").map_err(store_err)?,
        queen_id: row.try_get("queen_id").map_err(store_err)?,
        voted_at: row.try_get("voted_at").map_err(store_err)?,
    })
}

fn row_to_admin(row: &SqliteRow) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id").map_err(store_err)?,
        email: row.try_get("email").map_err(store_err)?,
        password_hash: row.try_get("password_hash").map_err(store_err)?,
        name: row.try_get("name").map_err(store_err)?,
        created_at: row.try_get("created_at").map_err(store_err)?,
    })
}

#[async_trait]
impl CandidateRepo for SqliteStore {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(row_to_candidate).collect()
    }

    async fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>> {
        let row = sqlx::query(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(row_to_candidate).transpose()
    }

    async fn create_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO candidates (name, category, photo_url, vote_count, created_at, updated_at) \
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(&candidate.name)
        .bind(candidate.category.as_str())
        .bind(&candidate.photo_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?
        .last_insert_rowid();

        Ok(Candidate {
            id,
            name: candidate.name,
            category: candidate.category,
            photo_url: candidate.photo_url,
            vote_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Never writes `vote_count`; tallies only move through `record_ballot`.
    async fn update_candidate(
        &self,
        id: CandidateId,
        patch: CandidatePatch,
    ) -> Result<Option<Candidate>> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;
        let Some(mut candidate) = row.as_ref().map(row_to_candidate).transpose()? else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(category) = patch.category {
            candidate.category = category;
        }
        if let Some(photo_url) = patch.photo_url {
            candidate.photo_url = photo_url;
        }
        candidate.updated_at = Utc::now();

        sqlx::query(
            "UPDATE candidates SET name = ?, category = ?, photo_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&candidate.name)
        .bind(candidate.category.as_str())
        .bind(&candidate.photo_url)
        .bind(candidate.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(Some(candidate))
    }

    async fn delete_candidate(&self, id: CandidateId) -> Result<bool> {
        match sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(AppError::Conflict(
                "candidate has recorded votes and cannot be deleted".to_string(),
            )),
            Err(e) => Err(store_err(e)),
        }
    }

    async fn photo_in_use(&self, photo_url: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM candidates WHERE photo_url = ?",
        )
        .bind(photo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(count > 0)
    }
}

#[async_trait]
impl BallotRepo for SqliteStore {
    async fn find_ballot(&self, key: &IdentityKey) -> Result<Option<Ballot>> {
        let row = match key {
            IdentityKey::Fingerprint(fingerprint) => {
                sqlx::query(&format!("SELECT {BALLOT_COLUMNS} FROM votes WHERE fingerprint = ?"))
                    .bind(fingerprint)
                    .fetch_optional(&self.pool)
                    .await
            }
            IdentityKey::IpCookie {
                ip_address,
                cookie_token,
            } => {
                sqlx::query(&format!(
                    "SELECT {BALLOT_COLUMNS} FROM votes WHERE ip_address = ? AND cookie_id = ?"
                ))
                .bind(ip_address)
                .bind(cookie_token)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        row.as_ref().map(row_to_ballot).transpose()
    }

    /// Atomic ballot commit.
    ///
    /// The INSERT is where duplicates die: the UNIQUE constraints on
    /// `fingerprint` and `(ip_address, cookie_id)` reject a racing twin even
    /// when both passed the pre-check. Tallies move by relative `+ 1` so
    /// concurrent commits never lose an update. Returning early drops `tx`,
    /// which rolls everything back.
    async fn record_ballot(&self, ballot: NewBallot) -> Result<Ballot> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let inserted = sqlx::query(
            "INSERT INTO votes (ip_address, cookie_id, fingerprint, king_id, queen_id, voted_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&ballot.ip_address)
        .bind(&ballot.cookie_token)
        .bind(&ballot.fingerprint)
        .bind(ballot.king_id)
        .bind(ballot.queen_id)
        .bind(ballot.voted_at)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => return Err(AppError::AlreadyVoted),
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(AppError::InvalidCandidate(
                    "candidate no longer exists".to_string(),
                ))
            }
            Err(e) => return Err(store_err(e)),
        };

        for (candidate_id, category) in [
            (ballot.king_id, Category::King),
            (ballot.queen_id, Category::Queen),
        ] {
            let bumped = sqlx::query(
                "UPDATE candidates SET vote_count = vote_count + 1 WHERE id = ? AND category = ?",
            )
            .bind(candidate_id)
            .bind(category.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

            if bumped.rows_affected() != 1 {
                return Err(AppError::InvalidCandidate(format!(
                    "Invalid {category} candidate"
                )));
            }
        }

        tx.commit().await.map_err(store_err)?;

        Ok(Ballot {
            id,
            ip_address: ballot.ip_address,
            cookie_token: ballot.cookie_token,
            fingerprint: ballot.fingerprint,
            king_id: ballot.king_id,
            queen_id: ballot.queen_id,
            voted_at: ballot.voted_at,
        })
    }

    async fn count_ballots(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl SettingsRepo for SqliteStore {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl AdminRepo for SqliteStore {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin> {
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO admins (email, password_hash, name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.name)
        .bind(now)
        .execute(&self.pool)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(format!(
                    "admin {} already exists",
                    admin.email
                )))
            }
            Err(e) => return Err(store_err(e)),
        };

        Ok(Admin {
            id,
            email: admin.email,
            password_hash: admin.password_hash,
            name: admin.name,
            created_at: now,
        })
    }

    async fn update_password(&self, id: AdminId, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE admins SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
