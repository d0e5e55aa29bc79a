//! Token reads: the whole table at once, or one page per call.

use sqlx::any::{Any, AnyRow};
use sqlx::{AnyConnection, Column, Decode, Row, Type};
use tracing::debug;

use super::TokenHashEngine;
use crate::core::TokenRecord;
use crate::dialect::{DialectProfile, ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH};
use crate::error::Result;

impl TokenHashEngine {
    /// Read every token without hashes. Meant for small tables.
    pub async fn list_all_tokens(&self, conn: &mut AnyConnection) -> Result<Vec<TokenRecord>> {
        let sql = self.sql(conn, &self.statements.select_all_tokens);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let tokens = rows
            .iter()
            .map(|row| {
                Ok(TokenRecord::from_columns(
                    column(row, "TOKEN_ID")?,
                    column(row, "ACCESS_TOKEN")?,
                    column(row, "REFRESH_TOKEN")?,
                    None,
                    None,
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!("Read {} tokens from token table", tokens.len());
        Ok(tokens)
    }

    /// Read one page of tokens with their current hashes, ordered by token id.
    ///
    /// Each call re-runs the page statement with new bounds; the engine keeps
    /// no cursor between calls. `offset` and `limit` are passed through
    /// unchecked.
    pub async fn list_tokens_page(
        &self,
        conn: &mut AnyConnection,
        profile: &DialectProfile,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TokenRecord>> {
        let sql = self.sql(conn, self.statements.select_page(profile.page_binding));
        let [first, second] = profile.page_binding.order(offset, limit);

        let rows = sqlx::query(&sql)
            .bind(first)
            .bind(second)
            .fetch_all(&mut *conn)
            .await?;

        let tokens = rows
            .iter()
            .map(|row| {
                Ok(TokenRecord::from_columns(
                    column(row, "TOKEN_ID")?,
                    column(row, "ACCESS_TOKEN")?,
                    column(row, "REFRESH_TOKEN")?,
                    column(row, ACCESS_TOKEN_HASH)?,
                    column(row, REFRESH_TOKEN_HASH)?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            "Read page offset={} limit={}: {} tokens",
            offset,
            limit,
            tokens.len()
        );
        Ok(tokens)
    }
}

/// Decode a column, resolving its name case-insensitively.
///
/// PostgreSQL folds unquoted names to lowercase while Oracle and DB2 fold to
/// uppercase, so an exact-name lookup would miss on half the backends.
/// Decoding a NULL into a non-`Option` type fails, which is how a NULL
/// `TOKEN_ID` is rejected.
fn column<'r, T>(row: &'r AnyRow, name: &str) -> std::result::Result<T, sqlx::Error>
where
    T: Decode<'r, Any> + Type<Any>,
{
    let index = row
        .columns()
        .iter()
        .position(|c| c.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| sqlx::Error::ColumnNotFound(name.to_string()))?;

    row.try_get::<T, _>(index)
}
