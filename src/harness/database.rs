//! Relational store access
//!
//! Each pipeline table holds a JSON-blob `data` column plus derived
//! columns; the claimant table additionally exposes the hashed-nino
//! column the pipeline computes on insert. The harness seeds rows with
//! the same duplicate-key upsert the pipeline uses and verifies stored
//! state with plain selects.
//!
//! A `Database` is opened inside the step that needs it and closed before
//! the step returns; nothing is shared across steps.

use super::aws::AwsEmulation;
use super::config::HarnessConfig;
use super::error::{HarnessError, HarnessResult};
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, OptsBuilder, Pool};

pub struct Database {
    pool: Pool,
}

impl Database {
    /// Connect using config credentials, or the credentials secret when
    /// one is configured
    pub async fn connect(config: &HarnessConfig) -> HarnessResult<Self> {
        let db = &config.database;
        let (host, port, username, password) = match &db.credentials_secret {
            Some(secret_id) => {
                let credentials = AwsEmulation::new(&config.aws)
                    .database_credentials(secret_id)
                    .await?;
                (
                    credentials.host,
                    credentials.port,
                    credentials.username,
                    credentials.password,
                )
            }
            None => (
                db.host.clone(),
                db.port,
                db.username.clone(),
                db.password.clone(),
            ),
        };

        let opts = OptsBuilder::default()
            .ip_or_hostname(host)
            .tcp_port(port)
            .db_name(Some(db.schema.clone()))
            .user(Some(username))
            .pass(Some(password));

        Ok(Self {
            pool: Pool::new(Opts::from(opts)),
        })
    }

    /// Duplicate-key upsert of serialized documents into a table's `data`
    /// column. Re-upserting the same documents leaves the row count
    /// unchanged.
    pub async fn upsert_records(&self, table: &str, documents: &[String]) -> HarnessResult<usize> {
        let mut conn = self.pool.get_conn().await.map_err(db_error)?;
        let sql = format!(
            "INSERT INTO {} (data) VALUES (?) ON DUPLICATE KEY UPDATE data = ?",
            table
        );
        conn.exec_batch(
            sql,
            documents.iter().map(|doc| (doc.as_str(), doc.as_str())),
        )
        .await
        .map_err(db_error)?;
        log::info!("Upserted {} record(s) into {}", documents.len(), table);
        Ok(documents.len())
    }

    /// Current row count for a table
    pub async fn row_count(&self, table: &str) -> HarnessResult<i64> {
        let mut conn = self.pool.get_conn().await.map_err(db_error)?;
        let count: Option<i64> = conn
            .query_first(format!("SELECT COUNT(*) FROM {}", table))
            .await
            .map_err(db_error)?;
        Ok(count.unwrap_or(0))
    }

    /// Claimant document stored under a hashed-nino column value
    pub async fn claimant_by_nino_hash(
        &self,
        table: &str,
        hashed_nino: &str,
    ) -> HarnessResult<Option<String>> {
        let mut conn = self.pool.get_conn().await.map_err(db_error)?;
        conn.exec_first(
            format!("SELECT data FROM {} WHERE nino = ?", table),
            (hashed_nino,),
        )
        .await
        .map_err(db_error)
    }

    /// Document whose embedded `_id.<id_field>` matches `identifier`
    pub async fn record_by_identifier(
        &self,
        table: &str,
        id_field: &str,
        identifier: &str,
    ) -> HarnessResult<Option<String>> {
        let mut conn = self.pool.get_conn().await.map_err(db_error)?;
        let sql = format!(
            "SELECT data FROM {} WHERE JSON_UNQUOTE(JSON_EXTRACT(data, '$._id.{}')) = ?",
            table, id_field
        );
        conn.exec_first(sql, (identifier,)).await.map_err(db_error)
    }

    /// Release the pool. Steps call this on every exit path they own; a
    /// dropped pool is also reclaimed by the driver.
    pub async fn close(self) -> HarnessResult<()> {
        self.pool.disconnect().await.map_err(db_error)
    }
}

fn db_error(err: mysql_async::Error) -> HarnessError {
    HarnessError::DatabaseError {
        message: "database operation failed".to_string(),
        source: Some(err.to_string()),
    }
}
