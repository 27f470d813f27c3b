use crate::entities::{ProcessingStatus, StatusRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Durable product-code table, keyed by product code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Up to `limit` items currently in `status`, ordered by product code.
    async fn fetch_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<StatusRecord>>;

    /// Move up to `limit` "Not started" items to "Started" and return them.
    /// An item is handed to at most one caller, however many claim at once.
    async fn claim_batch(&self, limit: usize) -> Result<Vec<StatusRecord>>;

    /// Set the status and `update_at`; `create_at` is only set the first time.
    /// `data` is written only when given.
    async fn update_status(
        &self,
        product_code: &str,
        status: ProcessingStatus,
        data: Option<Value>,
    ) -> Result<()>;

    async fn get(&self, product_code: &str) -> Result<Option<StatusRecord>>;

    /// Insert codes as "Not started", leaving existing rows alone. Returns
    /// how many were new.
    async fn seed(&self, product_codes: &[String]) -> Result<u64>;

    /// Put every item that is not "Not started" back to "Not started".
    async fn reset_status(&self) -> Result<u64>;

    /// Clear `create_at`, `data` and `update_at` on every touched item.
    async fn reset_data(&self) -> Result<u64>;

    async fn item_count(&self) -> Result<u64>;
}

#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    product_code: String,
    status: String,
    data: Option<Value>,
    create_at: Option<DateTime<Utc>>,
    update_at: Option<DateTime<Utc>>,
}

impl TryFrom<StatusRow> for StatusRecord {
    type Error = anyhow::Error;

    fn try_from(row: StatusRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .with_context(|| format!("product code {}", row.product_code))?;
        Ok(StatusRecord {
            product_code: row.product_code,
            status,
            data: row.data,
            create_at: row.create_at,
            update_at: row.update_at,
        })
    }
}

/// PostgreSQL-backed product-code table.
#[derive(Clone)]
pub struct PgStatusRepository {
    pool: PgPool,
}

impl PgStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to the status database")?;

        // no-op if up-to-date
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl StatusStore for PgStatusRepository {
    async fn fetch_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<StatusRecord>> {
        let rows: Vec<StatusRow> = sqlx::query_as(
            r#"
            SELECT product_code, status, data, create_at, update_at
            FROM product_codes
            WHERE status = $1
            ORDER BY product_code
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StatusRecord::try_from).collect()
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<StatusRecord>> {
        let rows: Vec<StatusRow> = sqlx::query_as(
            r#"
            UPDATE product_codes
            SET status    = $1,
                update_at = now(),
                create_at = COALESCE(create_at, now())
            WHERE product_code IN (
                SELECT product_code
                FROM product_codes
                WHERE status = $2
                ORDER BY product_code
                FOR UPDATE SKIP LOCKED
                LIMIT $3
            )
            RETURNING product_code, status, data, create_at, update_at
            "#,
        )
        .bind(ProcessingStatus::Started.as_str())
        .bind(ProcessingStatus::NotStarted.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut claimed = rows
            .into_iter()
            .map(StatusRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        claimed.sort_by(|a, b| a.product_code.cmp(&b.product_code));
        Ok(claimed)
    }

    async fn update_status(
        &self,
        product_code: &str,
        status: ProcessingStatus,
        data: Option<Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_codes (product_code, status, data, create_at, update_at)
            VALUES ($1, $2, $3, now(), now())
            ON CONFLICT (product_code) DO UPDATE
              SET status    = EXCLUDED.status,
                  update_at = EXCLUDED.update_at,
                  create_at = COALESCE(product_codes.create_at, EXCLUDED.create_at),
                  data      = COALESCE(EXCLUDED.data, product_codes.data)
            "#,
        )
        .bind(product_code)
        .bind(status.as_str())
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, product_code: &str) -> Result<Option<StatusRecord>> {
        let row: Option<StatusRow> = sqlx::query_as(
            r#"
            SELECT product_code, status, data, create_at, update_at
            FROM product_codes
            WHERE product_code = $1
            "#,
        )
        .bind(product_code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StatusRecord::try_from).transpose()
    }

    async fn seed(&self, product_codes: &[String]) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO product_codes (product_code)
            SELECT UNNEST($1::text[])
            ON CONFLICT (product_code) DO NOTHING
            "#,
        )
        .bind(product_codes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn reset_status(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE product_codes SET status = $1 WHERE status <> $1")
            .bind(ProcessingStatus::NotStarted.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn reset_data(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE product_codes
            SET create_at = NULL, data = NULL, update_at = NULL
            WHERE update_at IS NOT NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn item_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_codes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}
