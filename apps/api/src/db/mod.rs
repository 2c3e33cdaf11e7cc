//! Persistence Layer: resumes, job descriptions and analyses in SQLite.
//!
//! The live database is in memory on a single pooled connection. When a
//! snapshot path is configured, the whole image is loaded from that file at
//! startup and rewritten after every mutation (`VACUUM INTO` a sibling temp
//! file, then rename over the image). Cost is O(store size) per write.

mod analyses;
mod job_descriptions;
mod resumes;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Connection;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::errors::AppError;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS resumes (
        seq         INTEGER PRIMARY KEY,
        id          BLOB NOT NULL UNIQUE,
        identifier  TEXT NOT NULL UNIQUE,
        content     BLOB NOT NULL,
        parsed_text TEXT NOT NULL,
        num_pages   INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS job_descriptions (
        seq          INTEGER PRIMARY KEY,
        id           BLOB NOT NULL UNIQUE,
        company_name TEXT NOT NULL,
        jd_text      TEXT NOT NULL,
        created_at   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analyses (
        seq           INTEGER PRIMARY KEY,
        id            BLOB NOT NULL UNIQUE,
        resume_id     BLOB NOT NULL REFERENCES resumes(id),
        jd_id         BLOB NOT NULL REFERENCES job_descriptions(id),
        analysis_json TEXT NOT NULL,
        overall_score INTEGER NOT NULL,
        created_at    TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_analyses_jd ON analyses(jd_id)",
];

/// Tables and columns copied when loading a snapshot image.
const TABLES: [(&str, &str); 3] = [
    (
        "resumes",
        "seq, id, identifier, content, parsed_text, num_pages, created_at",
    ),
    (
        "job_descriptions",
        "seq, id, company_name, jd_text, created_at",
    ),
    (
        "analyses",
        "seq, id, resume_id, jd_id, analysis_json, overall_score, created_at",
    ),
];

/// Owned handle to the store. Cheap to clone; all clones share one database.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    snapshot_path: Option<Arc<PathBuf>>,
    flush_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Opens the store. `None` keeps everything in memory with no snapshot.
    pub async fn open(snapshot_path: Option<&Path>) -> Result<Self, AppError> {
        // A plain `:memory:` filename, not the `sqlite::memory:` URL: the URL form
        // opens with SQLITE_OPEN_MEMORY, which `VACUUM INTO` inherits for its target.
        // Foreign keys stay unenforced: deleting a resume leaves its analyses orphaned.
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(false);

        // An in-memory database lives and dies with its connection, so the pool
        // holds exactly one that never expires.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        let store = Store {
            pool,
            snapshot_path: snapshot_path.map(|p| Arc::new(p.to_path_buf())),
            flush_lock: Arc::new(Mutex::new(())),
        };

        if let Some(path) = snapshot_path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            if tokio::fs::try_exists(path).await? {
                store.load_snapshot(path).await?;
                info!("Loaded database image from {}", path.display());
            } else {
                info!("No database image at {}; starting empty", path.display());
            }
        }

        Ok(store)
    }

    async fn load_snapshot(&self, path: &Path) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(&format!(
            "ATTACH DATABASE {} AS snapshot",
            sql_literal(path)?
        ))
        .execute(&mut *conn)
        .await?;

        let mut tx = conn.begin().await?;
        for (table, columns) in TABLES {
            sqlx::query(&format!(
                "INSERT INTO main.{table} ({columns}) SELECT {columns} FROM snapshot.{table}"
            ))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        sqlx::query("DETACH DATABASE snapshot")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Rewrites the snapshot image from the live database. No-op without a path.
    pub async fn flush(&self) -> Result<(), AppError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().await;

        let tmp = temp_path(path);
        match tokio::fs::remove_file(&tmp).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        sqlx::query(&format!("VACUUM INTO {}", sql_literal(&tmp)?))
            .execute(&self.pool)
            .await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("Flushed database image to {}", path.display());
        Ok(())
    }

    /// Flushes after a committed mutation. If the image cannot be written,
    /// `revert` undoes the mutation so the live store never holds a change the
    /// caller was told failed.
    async fn flush_or_revert<'q>(
        &self,
        revert: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<(), AppError> {
        let Err(e) = self.flush().await else {
            return Ok(());
        };
        if let Err(revert_err) = revert.execute(&self.pool).await {
            error!("Failed to revert unflushed write: {revert_err}");
        }
        Err(e)
    }

    /// Final flush, then closes the pool.
    pub async fn close(&self) -> Result<(), AppError> {
        self.flush().await?;
        self.pool.close().await;
        info!("Store closed");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Quotes a path as an SQL string literal (ATTACH / VACUUM INTO take file names as expressions).
fn sql_literal(path: &Path) -> Result<String, AppError> {
    let s = path.to_str().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("database path is not valid UTF-8: {}", path.display()),
        )
    })?;
    Ok(format!("'{}'", s.replace('\'', "''")))
}
