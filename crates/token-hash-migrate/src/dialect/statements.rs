//! SQL text for the token table.
//!
//! Every statement is written once with `?` placeholders. Backends that use
//! numbered parameters get them rewritten by [`TokenStatements::render`] at
//! execution time.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::{PageBinding, ProbeDialect};

/// Default token table.
pub const DEFAULT_TOKEN_TABLE: &str = "IDN_OAUTH2_ACCESS_TOKEN";

/// Default SQL type for the two hash columns.
pub const DEFAULT_HASH_COLUMN_TYPE: &str = "VARCHAR(512)";

/// Column holding the access token digest.
pub const ACCESS_TOKEN_HASH: &str = "ACCESS_TOKEN_HASH";

/// Column holding the refresh token digest.
pub const REFRESH_TOKEN_HASH: &str = "REFRESH_TOKEN_HASH";

/// Parameter marker syntax of the connected driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (MySQL, SQLite)
    QuestionMark,
    /// `$1, $2, ...` (PostgreSQL)
    Numbered,
}

impl PlaceholderStyle {
    /// Placeholder style for a sqlx backend name.
    pub fn for_backend(backend_name: &str) -> Self {
        if backend_name.eq_ignore_ascii_case("postgresql") {
            PlaceholderStyle::Numbered
        } else {
            PlaceholderStyle::QuestionMark
        }
    }
}

/// All statement text the engine runs against one token table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatements {
    pub probe_mysql: String,
    pub probe_db2: String,
    pub probe_mssql: String,
    pub probe_informix: String,
    pub probe_oracle: String,
    pub add_access_token_hash_column: String,
    pub add_refresh_token_hash_column: String,
    pub select_all_tokens: String,
    /// Page statement binding `(limit, offset)`.
    pub select_page_limit_offset: String,
    /// Page statement binding `(offset, limit)`.
    pub select_page_offset_limit: String,
    pub update_encrypted_tokens: String,
    pub update_plain_text_hashes: String,
}

impl Default for TokenStatements {
    fn default() -> Self {
        Self::for_table(DEFAULT_TOKEN_TABLE, DEFAULT_HASH_COLUMN_TYPE)
    }
}

impl TokenStatements {
    /// Build the statement set for `table`. The name must already be validated.
    pub fn for_table(table: &str, hash_column_type: &str) -> Self {
        let page_columns = format!(
            "ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_ID, {ACCESS_TOKEN_HASH}, {REFRESH_TOKEN_HASH}"
        );

        Self {
            probe_mysql: format!("SELECT * FROM {table} LIMIT 1"),
            probe_db2: format!("SELECT * FROM {table} FETCH FIRST 1 ROWS ONLY"),
            probe_mssql: format!("SELECT TOP 1 * FROM {table}"),
            probe_informix: format!("SELECT FIRST 1 * FROM {table}"),
            probe_oracle: format!("SELECT * FROM {table} WHERE ROWNUM < 2"),
            add_access_token_hash_column: format!(
                "ALTER TABLE {table} ADD {ACCESS_TOKEN_HASH} {hash_column_type}"
            ),
            add_refresh_token_hash_column: format!(
                "ALTER TABLE {table} ADD {REFRESH_TOKEN_HASH} {hash_column_type}"
            ),
            select_all_tokens: format!("SELECT ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_ID FROM {table}"),
            select_page_limit_offset: format!(
                "SELECT {page_columns} FROM {table} ORDER BY TOKEN_ID LIMIT ? OFFSET ?"
            ),
            select_page_offset_limit: format!(
                "SELECT {page_columns} FROM {table} ORDER BY TOKEN_ID \
                 OFFSET ? ROWS FETCH NEXT ? ROWS ONLY"
            ),
            update_encrypted_tokens: format!(
                "UPDATE {table} SET ACCESS_TOKEN = ?, REFRESH_TOKEN = ?, \
                 {ACCESS_TOKEN_HASH} = ?, {REFRESH_TOKEN_HASH} = ? WHERE TOKEN_ID = ?"
            ),
            update_plain_text_hashes: format!(
                "UPDATE {table} SET {ACCESS_TOKEN_HASH} = ?, {REFRESH_TOKEN_HASH} = ? \
                 WHERE TOKEN_ID = ?"
            ),
        }
    }

    /// Probe statement for a probe family.
    pub fn probe(&self, dialect: ProbeDialect) -> &str {
        match dialect {
            ProbeDialect::Mysql => &self.probe_mysql,
            ProbeDialect::Db2 => &self.probe_db2,
            ProbeDialect::Mssql => &self.probe_mssql,
            ProbeDialect::Informix => &self.probe_informix,
            ProbeDialect::Oracle => &self.probe_oracle,
        }
    }

    /// Page statement matching a binding order.
    pub fn select_page(&self, binding: PageBinding) -> &str {
        match binding {
            PageBinding::LimitOffset => &self.select_page_limit_offset,
            PageBinding::OffsetLimit => &self.select_page_offset_limit,
        }
    }

    /// Rewrite `?` markers for the driver's placeholder syntax.
    ///
    /// Markers inside single-quoted literals are left alone.
    pub fn render(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
        if style == PlaceholderStyle::QuestionMark || !sql.contains('?') {
            return Cow::Borrowed(sql);
        }

        let mut out = String::with_capacity(sql.len() + 8);
        let mut index = 0;
        let mut in_literal = false;

        for c in sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '?' if !in_literal => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                }
                _ => out.push(c),
            }
        }

        Cow::Owned(out)
    }
}
