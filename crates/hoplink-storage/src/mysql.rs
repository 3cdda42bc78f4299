use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::{MySqlPool, Row};
use hoplink_core::error::StorageError;
use hoplink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use hoplink_core::shortcode::ShortCode;

/// MySQL implementation of the repository contract.
///
/// Expected schema:
///
/// ```sql
/// CREATE TABLE short_urls (
///     code       VARCHAR(50)  NOT NULL,
///     long_url   TEXT         NOT NULL,
///     expires_at BIGINT       NULL,
///     created_at TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP,
///     updated_at TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP
///                             ON UPDATE CURRENT_TIMESTAMP,
///     PRIMARY KEY (code)
/// );
/// ```
///
/// The primary key on `code` is the uniqueness arbiter for concurrent
/// writers; `created_at`/`updated_at` are owned by the database. Expired
/// rows are still returned by reads so callers can distinguish "expired"
/// from "never existed". Garbage collection of expired rows is an
/// out-of-band concern (e.g. a periodic `DELETE ... WHERE expires_at < ?`).
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_expires_at(millis: Option<i64>) -> Result<Option<Timestamp>> {
    millis
        .map(|value| {
            Timestamp::from_millisecond(value).map_err(|e| {
                StorageError::InvalidData(format!("invalid expires_at timestamp '{}': {e}", value))
            })
        })
        .transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT long_url, expires_at
            FROM short_urls
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
        let expires_at_raw: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
        let expires_at = parse_expires_at(expires_at_raw)?;

        Ok(Some(UrlRecord {
            long_url,
            expires_at,
        }))
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        let expires_at = record.expires_at.map(|ts| ts.as_millisecond());

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (code, long_url, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(code.as_str())
        .bind(record.long_url)
        .bind(expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(code.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn update(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        let expires_at = record.expires_at.map(|ts| ts.as_millisecond());

        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET long_url = ?, expires_at = ?
            WHERE code = ?
            "#,
        )
        .bind(record.long_url)
        .bind(expires_at)
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Operation(format!(
                "no record to update for code '{}'",
                code
            )));
        }

        Ok(())
    }
}
