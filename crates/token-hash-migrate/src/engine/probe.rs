//! Hash column detection and column addition.

use serde::Serialize;
use sqlx::{AnyConnection, Column, Executor};
use tracing::{debug, info, warn};

use super::TokenHashEngine;
use crate::dialect::{DialectProfile, ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH};
use crate::error::{MigrateError, Result};

/// Result of running the probe statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Both hash columns resolved.
    Present,
    /// The probe ran but this column is not in its result set.
    Missing { column: &'static str },
    /// The probe statement could not be prepared or run.
    Unavailable { reason: String },
}

impl ProbeOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

impl TokenHashEngine {
    /// Run the dialect's probe statement and report which columns resolved.
    ///
    /// Only the result set's column list is inspected, so an empty token table
    /// probes the same as a populated one. Column names are matched
    /// case-insensitively.
    pub async fn probe_hash_columns(
        &self,
        conn: &mut AnyConnection,
        profile: &DialectProfile,
    ) -> ProbeOutcome {
        let sql = self.sql(conn, self.statements.probe(profile.probe));
        debug!("Probing token table: {}", sql);

        // describe() prepares afresh, so columns added earlier on this
        // connection are visible.
        let described = match (&mut *conn).describe(&sql).await {
            Ok(described) => described,
            Err(e) => {
                warn!("Token table probe could not run ({}): {}", profile.backend, e);
                return ProbeOutcome::Unavailable {
                    reason: e.to_string(),
                };
            }
        };

        for column in [ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH] {
            let found = described
                .columns()
                .iter()
                .any(|c| c.name().eq_ignore_ascii_case(column));
            if !found {
                debug!("Token table has no {} column", column);
                return ProbeOutcome::Missing { column };
            }
        }

        ProbeOutcome::Present
    }

    /// True only when both hash columns exist. Never fails: an unrunnable
    /// probe and a missing column both read as "not present".
    pub async fn hash_columns_present(
        &self,
        conn: &mut AnyConnection,
        profile: &DialectProfile,
    ) -> bool {
        self.probe_hash_columns(conn, profile).await.is_present()
    }

    /// Add the `ACCESS_TOKEN_HASH` column. No retry, no rollback.
    pub async fn add_access_token_hash_column(&self, conn: &mut AnyConnection) -> Result<()> {
        self.add_column(conn, ACCESS_TOKEN_HASH, &self.statements.add_access_token_hash_column)
            .await
    }

    /// Add the `REFRESH_TOKEN_HASH` column. No retry, no rollback.
    pub async fn add_refresh_token_hash_column(&self, conn: &mut AnyConnection) -> Result<()> {
        self.add_column(
            conn,
            REFRESH_TOKEN_HASH,
            &self.statements.add_refresh_token_hash_column,
        )
        .await
    }

    async fn add_column(
        &self,
        conn: &mut AnyConnection,
        column: &'static str,
        ddl: &str,
    ) -> Result<()> {
        let sql = self.sql(conn, ddl);
        sqlx::query(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| MigrateError::schema_change(column, e))?;

        info!("Added {} column to token table", column);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Backend, PageBinding, TokenStatements};
    use crate::engine::test_support::{token_db, TABLE};

    fn sqlite_profile() -> DialectProfile {
        DialectProfile::new(Backend::Sqlite, PageBinding::LimitOffset)
    }

    #[tokio::test]
    async fn test_probe_missing_columns() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(3, false).await;

        let outcome = engine.probe_hash_columns(&mut conn, &sqlite_profile()).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Missing {
                column: ACCESS_TOKEN_HASH
            }
        );
        assert!(!engine.hash_columns_present(&mut conn, &sqlite_profile()).await);
    }

    #[tokio::test]
    async fn test_probe_present_on_empty_table() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(0, true).await;

        assert!(engine.hash_columns_present(&mut conn, &sqlite_profile()).await);
    }

    #[tokio::test]
    async fn test_probe_only_one_column() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(2, false).await;
        engine.add_access_token_hash_column(&mut conn).await.unwrap();

        let outcome = engine.probe_hash_columns(&mut conn, &sqlite_profile()).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Missing {
                column: REFRESH_TOKEN_HASH
            }
        );
    }

    #[tokio::test]
    async fn test_probe_failure_reads_as_absent() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(2, true).await;

        // ROWNUM does not exist in SQLite, so the Oracle probe cannot run
        let oracle = DialectProfile::new(Backend::Oracle, PageBinding::OffsetLimit);
        let outcome = engine.probe_hash_columns(&mut conn, &oracle).await;
        assert!(matches!(outcome, ProbeOutcome::Unavailable { .. }));
        assert!(!engine.hash_columns_present(&mut conn, &oracle).await);
    }

    #[tokio::test]
    async fn test_probe_missing_table_reads_as_absent() {
        let engine = TokenHashEngine::new(TokenStatements::for_table("NO_SUCH_TABLE", "TEXT"));
        let mut conn = token_db(1, true).await;

        assert!(!engine.hash_columns_present(&mut conn, &sqlite_profile()).await);
    }

    #[tokio::test]
    async fn test_probe_matches_case_insensitively() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(1, false).await;
        for ddl in [
            format!("ALTER TABLE {TABLE} ADD access_token_hash VARCHAR(512)"),
            format!("ALTER TABLE {TABLE} ADD Refresh_Token_Hash VARCHAR(512)"),
        ] {
            sqlx::query(&ddl).execute(&mut conn).await.unwrap();
        }

        assert!(engine.hash_columns_present(&mut conn, &sqlite_profile()).await);
    }

    #[tokio::test]
    async fn test_add_columns_then_probe_present() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(5, false).await;
        assert!(!engine.hash_columns_present(&mut conn, &sqlite_profile()).await);

        engine.add_access_token_hash_column(&mut conn).await.unwrap();
        engine.add_refresh_token_hash_column(&mut conn).await.unwrap();

        assert!(engine.hash_columns_present(&mut conn, &sqlite_profile()).await);
    }

    #[tokio::test]
    async fn test_add_existing_column_fails_with_column_name() {
        let engine = TokenHashEngine::default();
        let mut conn = token_db(1, true).await;

        let err = engine
            .add_access_token_hash_column(&mut conn)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::SchemaChange {
                column: ACCESS_TOKEN_HASH,
                ..
            }
        ));
    }
}
