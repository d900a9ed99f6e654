//! SQLite-based persistence store

use crate::core::state::RunStatus;
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Create a new SQLite store
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path))
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("stagehand");
        std::fs::create_dir_all(&db_dir)?;

        let db_path = db_dir.join("runs.db");
        // mode=rwc creates the database file on first use
        Self::new(&format!("{}?mode=rwc", db_path.to_str().unwrap_or("runs.db"))).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                branch TEXT NOT NULL,
                action TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                succeeded INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                skipped INTEGER NOT NULL DEFAULT 0,
                total INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_runs_branch ON runs(branch);
            CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<RunSummary> {
        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            branch: row.get("branch"),
            action: row.get("action"),
            status: match row.get::<String, _>("status").as_str() {
                "Succeeded" => RunStatus::Succeeded,
                "Running" => RunStatus::Running,
                _ => RunStatus::Failed,
            },
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: row
                .get::<Option<NaiveDateTime>, _>("completed_at")
                .map(Self::from_naive),
            succeeded: row.get::<i64, _>("succeeded") as usize,
            failed: row.get::<i64, _>("failed") as usize,
            skipped: row.get::<i64, _>("skipped") as usize,
            total: row.get::<i64, _>("total") as usize,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, branch, action, status, started_at, completed_at, succeeded, failed, skipped, total)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.branch)
        .bind(&run.action)
        .bind(format!("{:?}", run.status))
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(run.succeeded as i64)
        .bind(run.failed as i64)
        .bind(run.skipped as i64)
        .bind(run.total as i64)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, branch, action, status, started_at, completed_at, succeeded, failed, skipped, total
            FROM runs
            WHERE id = ?1
            "#,
        )
        .bind(run_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load run")?;

        row.as_ref().map(Self::row_to_summary).transpose()
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, branch, action, status, started_at, completed_at, succeeded, failed, skipped, total
            FROM runs
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::row_to_summary).collect()
    }
}
