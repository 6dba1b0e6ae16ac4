//! # sv-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `sv-core` domain models. Uniqueness of votes and suggestions per
//! (client, post) is owned by the schema, not by callers: the duplicate-guard
//! lookups are advisory and the UNIQUE indexes close the check-then-insert
//! race under concurrent requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use sv_core::error::{AppError, Result};
use sv_core::models::{Client, Post, Suggestion, Vote, VoteCounts};
use sv_core::traits::SnipRepo;
use uuid::Uuid;

pub struct SqliteSnipRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn internal(err: sqlx::Error) -> AppError {
    AppError::Internal(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id           BLOB PRIMARY KEY,
        title        TEXT NOT NULL,
        code         TEXT NOT NULL,
        note         TEXT,
        submitter_id BLOB,
        created_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS clients (
        id         BLOB PRIMARY KEY,
        ip_address BLOB NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS votes (
        id         BLOB PRIMARY KEY,
        client_id  BLOB NOT NULL REFERENCES clients (id),
        post_id    BLOB NOT NULL REFERENCES posts (id),
        is_bad     INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (client_id, post_id)
    )",
    "CREATE TABLE IF NOT EXISTS suggestions (
        id          BLOB PRIMARY KEY,
        client_id   BLOB NOT NULL REFERENCES clients (id),
        post_id     BLOB NOT NULL REFERENCES posts (id),
        code        TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        UNIQUE (client_id, post_id)
    )",
    "CREATE TABLE IF NOT EXISTS approvals (
        id          BLOB PRIMARY KEY,
        post_id     BLOB NOT NULL UNIQUE REFERENCES posts (id),
        approved_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_votes_is_bad ON votes (is_bad)",
];

impl SqliteSnipRepo {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // a connection to :memory: owns its database, so the pool must not
        // open a second one or later acquires see an empty schema
        let mut pool_options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }
        let pool = pool_options.connect_with(options).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        title: row.get("title"),
        code: row.get("code"),
        note: row.get("note"),
        submitter_id: row
            .get::<Option<Vec<u8>>, _>("submitter_id")
            .map(|blob| blob_to_uuid(&blob)),
        created_at: row.get("created_at"),
    }
}

fn row_to_suggestion(row: &sqlx::sqlite::SqliteRow) -> Suggestion {
    Suggestion {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        client_id: blob_to_uuid(row.get::<Vec<u8>, _>("client_id").as_slice()),
        post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
        code: row.get("code"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

impl SqliteSnipRepo {
    async fn post_exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?)")
                .bind(uuid_to_blob(id))
                .fetch_one(&self.pool)
                .await
                .map_err(internal)?;
        Ok(exists)
    }

    async fn require_post(&self, id: Uuid) -> Result<()> {
        if self.post_exists(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Post".into(), id.to_string()))
        }
    }
}

#[async_trait]
impl SnipRepo for SqliteSnipRepo {
    async fn create_post(&self, post: Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, title, code, note, submitter_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(post.title)
        .bind(post.code)
        .bind(post.note)
        .bind(post.submitter_id.map(uuid_to_blob))
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        Ok(row.as_ref().map(row_to_post))
    }

    /// Two parameterized queries over the identical filtered set: a count,
    /// then an offset fetch in primary-key order. The excluded id is always
    /// bound, never interpolated.
    async fn random_post(&self, exclude: Option<Uuid>) -> Result<Option<Post>> {
        let exclude = exclude.map(uuid_to_blob);

        let eligible: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE (?1 IS NULL OR id != ?1)")
                .bind(&exclude)
                .fetch_one(&self.pool)
                .await
                .map_err(internal)?;
        if eligible == 0 {
            return Ok(None);
        }

        let offset = {
            use rand::Rng;
            rand::thread_rng().gen_range(0..eligible)
        };
        let row = sqlx::query(
            "SELECT * FROM posts WHERE (?1 IS NULL OR id != ?1) ORDER BY id ASC LIMIT 1 OFFSET ?2",
        )
        .bind(&exclude)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        Ok(row.as_ref().map(row_to_post))
    }

    /// Looks up the client by exact packed-address match, creating it on
    /// first contact. `INSERT OR IGNORE` plus re-select keeps this safe when
    /// two first requests from one address race.
    async fn find_or_create_client(&self, packed_addr: &[u8]) -> Result<Client> {
        let found = sqlx::query("SELECT * FROM clients WHERE ip_address = ?")
            .bind(packed_addr)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        if let Some(row) = found {
            return Ok(Client {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                ip_address: row.get("ip_address"),
                created_at: row.get("created_at"),
            });
        }

        sqlx::query(
            "INSERT OR IGNORE INTO clients (id, ip_address, created_at) VALUES (?, ?, ?)",
        )
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(packed_addr)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        let row = sqlx::query("SELECT * FROM clients WHERE ip_address = ?")
            .bind(packed_addr)
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;
        Ok(Client {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            ip_address: row.get("ip_address"),
            created_at: row.get("created_at"),
        })
    }

    async fn has_voted(&self, client_id: Uuid, post_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE client_id = ? AND post_id = ?)",
        )
        .bind(uuid_to_blob(client_id))
        .bind(uuid_to_blob(post_id))
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        Ok(exists)
    }

    async fn create_vote(&self, vote: Vote) -> Result<()> {
        self.require_post(vote.post_id).await?;
        sqlx::query(
            "INSERT INTO votes (id, client_id, post_id, is_bad, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(vote.id))
        .bind(uuid_to_blob(vote.client_id))
        .bind(uuid_to_blob(vote.post_id))
        .bind(vote.is_bad)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::DuplicateAction("vote")
            } else {
                internal(err)
            }
        })?;
        Ok(())
    }

    async fn vote_counts(&self, post_id: Uuid) -> Result<VoteCounts> {
        let rows =
            sqlx::query("SELECT is_bad, COUNT(*) AS n FROM votes WHERE post_id = ? GROUP BY is_bad")
                .bind(uuid_to_blob(post_id))
                .fetch_all(&self.pool)
                .await
                .map_err(internal)?;

        let mut counts = VoteCounts::default();
        for row in rows {
            let n: i64 = row.get("n");
            if row.get::<bool, _>("is_bad") {
                counts.bad = n;
            } else {
                counts.not_bad = n;
            }
        }
        Ok(counts)
    }

    async fn has_suggested(&self, client_id: Uuid, post_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM suggestions WHERE client_id = ? AND post_id = ?)",
        )
        .bind(uuid_to_blob(client_id))
        .bind(uuid_to_blob(post_id))
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        Ok(exists)
    }

    async fn create_suggestion(&self, suggestion: Suggestion) -> Result<()> {
        self.require_post(suggestion.post_id).await?;
        sqlx::query(
            "INSERT INTO suggestions (id, client_id, post_id, code, description, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(suggestion.id))
        .bind(uuid_to_blob(suggestion.client_id))
        .bind(uuid_to_blob(suggestion.post_id))
        .bind(suggestion.code)
        .bind(suggestion.description)
        .bind(suggestion.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::DuplicateAction("suggestion")
            } else {
                internal(err)
            }
        })?;
        Ok(())
    }

    async fn list_suggestions(&self, post_id: Uuid) -> Result<Vec<Suggestion>> {
        self.require_post(post_id).await?;
        let rows = sqlx::query(
            "SELECT * FROM suggestions WHERE post_id = ? ORDER BY created_at ASC",
        )
        .bind(uuid_to_blob(post_id))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        Ok(rows.iter().map(row_to_suggestion).collect())
    }

    async fn get_suggestion(&self, post_id: Uuid, suggestion_id: Uuid) -> Result<Option<Suggestion>> {
        let row = sqlx::query("SELECT * FROM suggestions WHERE id = ? AND post_id = ?")
            .bind(uuid_to_blob(suggestion_id))
            .bind(uuid_to_blob(post_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        Ok(row.as_ref().map(row_to_suggestion))
    }

    async fn pending_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.* FROM posts p
             LEFT JOIN approvals a ON a.post_id = p.id
             WHERE a.id IS NULL
             ORDER BY p.id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn approve_post(&self, post_id: Uuid, approved_at: DateTime<Utc>) -> Result<bool> {
        self.require_post(post_id).await?;
        let result = sqlx::query(
            "INSERT INTO approvals (id, post_id, approved_at) VALUES (?, ?, ?)
             ON CONFLICT (post_id) DO NOTHING",
        )
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(uuid_to_blob(post_id))
        .bind(approved_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_note(&self, post_id: Uuid, note: &str) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET note = ? WHERE id = ?")
            .bind(note)
            .bind(uuid_to_blob(post_id))
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post".into(), post_id.to_string()));
        }
        Ok(())
    }

    /// Protect-on-delete: refused while votes or suggestions reference the
    /// post. The approval row, a pure moderation ledger entry, goes with it.
    async fn delete_post(&self, post_id: Uuid) -> Result<()> {
        let blob = uuid_to_blob(post_id);
        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE post_id = ?1)
                 OR EXISTS (SELECT 1 FROM suggestions WHERE post_id = ?1)",
        )
        .bind(&blob)
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        if referenced {
            return Err(AppError::Conflict(
                "post still has votes or suggestions".into(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(internal)?;
        sqlx::query("DELETE FROM approvals WHERE post_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        tx.commit().await.map_err(internal)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post".into(), post_id.to_string()));
        }
        Ok(())
    }
}
