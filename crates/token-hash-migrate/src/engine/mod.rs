//! Token hash engine: schema probe, paged reads and transactional batch writes.
//!
//! The engine is an explicit value built by the caller and passed to each
//! migration step. It holds only statement text; every operation borrows the
//! connection mutably for its duration, so a single worker owns the
//! connection and calls are strictly sequential.
//!
//! - [`probe`]: hash column detection and column addition
//! - [`reader`]: full-table and paged token reads
//! - [`writer`]: all-or-nothing batch updates in two modes
//!
//! # Example
//!
//! ```rust,no_run
//! use token_hash_migrate::config::DatabaseConfig;
//! use token_hash_migrate::engine::{connect, connection_metadata, TokenHashEngine};
//! use token_hash_migrate::resolve_dialect;
//!
//! # async fn example(db: DatabaseConfig) -> token_hash_migrate::Result<()> {
//! let engine = TokenHashEngine::default();
//! let mut conn = connect(&db).await?;
//! let profile = resolve_dialect(&connection_metadata(&conn, &db));
//!
//! if !engine.hash_columns_present(&mut conn, &profile).await {
//!     engine.add_access_token_hash_column(&mut conn).await?;
//!     engine.add_refresh_token_hash_column(&mut conn).await?;
//! }
//!
//! let page = engine.list_tokens_page(&mut conn, &profile, 0, 100).await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod probe;
mod reader;
mod writer;

pub use connection::{connect, connection_metadata};
pub use probe::ProbeOutcome;
pub use writer::WriteMode;

use std::borrow::Cow;

use sqlx::AnyConnection;

use crate::config::TableConfig;
use crate::core::identifier::validate_table_name;
use crate::dialect::{PlaceholderStyle, TokenStatements};
use crate::error::Result;

/// Backfill engine for one token table.
#[derive(Debug, Clone, Default)]
pub struct TokenHashEngine {
    statements: TokenStatements,
}

impl TokenHashEngine {
    /// Create an engine around an explicit statement set.
    pub fn new(statements: TokenStatements) -> Self {
        Self { statements }
    }

    /// Create an engine for the configured table.
    pub fn from_config(table: &TableConfig) -> Result<Self> {
        validate_table_name(&table.name)?;
        Ok(Self::new(TokenStatements::for_table(
            &table.name,
            &table.hash_column_type,
        )))
    }

    pub fn statements(&self) -> &TokenStatements {
        &self.statements
    }

    /// Render statement text for the connected driver's placeholder syntax.
    fn sql<'a>(&self, conn: &AnyConnection, text: &'a str) -> Cow<'a, str> {
        TokenStatements::render(text, PlaceholderStyle::for_backend(conn.backend_name()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory SQLite fixtures shaped like the production token table.

    use sqlx::AnyConnection;

    use crate::config::DatabaseConfig;
    use crate::core::TokenRecord;
    use crate::engine::connect;

    pub(crate) const TABLE: &str = "IDN_OAUTH2_ACCESS_TOKEN";

    pub(crate) fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            driver_name: None,
            product_name: None,
        }
    }

    /// Open a fresh in-memory database with the token table and `rows` tokens.
    pub(crate) async fn token_db(rows: usize, with_hash_columns: bool) -> AnyConnection {
        let mut conn = connect(&memory_config()).await.unwrap();

        let hash_columns = if with_hash_columns {
            ", ACCESS_TOKEN_HASH VARCHAR(512), REFRESH_TOKEN_HASH VARCHAR(512)"
        } else {
            ""
        };
        let ddl = format!(
            "CREATE TABLE {TABLE} (
                TOKEN_ID VARCHAR(255) PRIMARY KEY,
                ACCESS_TOKEN VARCHAR(2048),
                REFRESH_TOKEN VARCHAR(2048),
                TOKEN_STATE VARCHAR(25) DEFAULT 'ACTIVE'{hash_columns}
            )"
        );
        sqlx::query(&ddl).execute(&mut conn).await.unwrap();

        let insert = format!(
            "INSERT INTO {TABLE} (TOKEN_ID, ACCESS_TOKEN, REFRESH_TOKEN) VALUES (?, ?, ?)"
        );
        for i in 1..=rows {
            sqlx::query(&insert)
                .bind(token_id(i))
                .bind(format!("access-{i}"))
                .bind(format!("refresh-{i}"))
                .execute(&mut conn)
                .await
                .unwrap();
        }

        conn
    }

    /// Zero-padded so `ORDER BY TOKEN_ID` matches insertion order.
    pub(crate) fn token_id(i: usize) -> String {
        format!("tok-{i:03}")
    }

    /// Make every update of `token_id` fail.
    pub(crate) async fn fail_updates_of(conn: &mut AnyConnection, token_id: &str) {
        let trigger = format!(
            "CREATE TRIGGER fail_token_update BEFORE UPDATE ON {TABLE}
             WHEN NEW.TOKEN_ID = '{token_id}'
             BEGIN SELECT RAISE(ABORT, 'simulated update failure'); END"
        );
        sqlx::query(&trigger).execute(&mut *conn).await.unwrap();
    }

    /// Read one row straight from the table, bypassing the engine.
    pub(crate) async fn fetch_raw(conn: &mut AnyConnection, token_id: &str) -> TokenRecord {
        let sql = format!(
            "SELECT ACCESS_TOKEN, REFRESH_TOKEN, ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH
             FROM {TABLE} WHERE TOKEN_ID = ?"
        );
        let (access, refresh, access_hash, refresh_hash): (
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        ) = sqlx::query_as(&sql)
            .bind(token_id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        TokenRecord::from_columns(token_id.to_string(), access, refresh, access_hash, refresh_hash)
    }
}
