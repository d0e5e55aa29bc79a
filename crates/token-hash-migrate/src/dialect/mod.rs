//! Dialect resolution and statement selection.
//!
//! Backends disagree on two things the engine depends on: how to run a cheap
//! "one row" probe against the token table, and how to express offset/limit
//! pagination. This module classifies a connection from its metadata strings
//! and hands out the matching statement text.
//!
//! - [`resolver`]: ordered rule tables and [`resolve_dialect`]
//! - [`statements`]: SQL text for every statement the engine runs
//!
//! # Usage
//!
//! ```rust,ignore
//! let profile = resolve_dialect(&ConnectionMetadata::new("MySQL Connector/J", "MySQL"));
//! let sql = statements.probe(profile.probe);
//! ```

mod resolver;
mod statements;

pub use resolver::{
    resolve_dialect, ConnectionMetadata, DialectRule, MatchField, PAGE_RULES, PROBE_RULES,
};
pub use statements::{
    PlaceholderStyle, TokenStatements, ACCESS_TOKEN_HASH, DEFAULT_HASH_COLUMN_TYPE,
    DEFAULT_TOKEN_TABLE, REFRESH_TOKEN_HASH,
};

use serde::Serialize;
use std::fmt;

/// Backend classification produced by the probe rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mysql,
    H2,
    Db2,
    Mssql,
    Postgres,
    Informix,
    Sqlite,
    /// Catch-all when no rule matches.
    Oracle,
}

impl Backend {
    /// Probe statement family used for this backend.
    ///
    /// PostgreSQL, H2 and SQLite accept the MySQL `LIMIT 1` probe.
    pub fn probe_dialect(self) -> ProbeDialect {
        match self {
            Backend::Mysql | Backend::H2 | Backend::Postgres | Backend::Sqlite => {
                ProbeDialect::Mysql
            }
            Backend::Db2 => ProbeDialect::Db2,
            Backend::Mssql => ProbeDialect::Mssql,
            Backend::Informix => ProbeDialect::Informix,
            Backend::Oracle => ProbeDialect::Oracle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Mysql => "mysql",
            Backend::H2 => "h2",
            Backend::Db2 => "db2",
            Backend::Mssql => "mssql",
            Backend::Postgres => "postgres",
            Backend::Informix => "informix",
            Backend::Sqlite => "sqlite",
            Backend::Oracle => "oracle",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which probe statement text to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeDialect {
    /// `SELECT * ... LIMIT 1`
    Mysql,
    /// `SELECT * ... FETCH FIRST 1 ROWS ONLY`
    Db2,
    /// `SELECT TOP 1 * ...`
    Mssql,
    /// `SELECT FIRST 1 * ...`
    Informix,
    /// `SELECT * ... WHERE ROWNUM < 2`
    Oracle,
}

/// Order in which a page statement expects its two integer parameters.
///
/// Binding in the wrong order does not fail, it silently returns the wrong
/// page, so the order always travels with the statement choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageBinding {
    /// `LIMIT ? OFFSET ?`
    LimitOffset,
    /// `OFFSET ? ROWS FETCH NEXT ? ROWS ONLY`
    OffsetLimit,
}

impl PageBinding {
    /// Parameters in the order the statement binds them.
    pub fn order(self, offset: i64, limit: i64) -> [i64; 2] {
        match self {
            PageBinding::LimitOffset => [limit, offset],
            PageBinding::OffsetLimit => [offset, limit],
        }
    }
}

/// Resolved statement choices for one connection.
///
/// Computed once at the start of a run and held for its duration. The probe
/// and pagination choices come from separate rule tables and are not
/// required to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DialectProfile {
    /// Backend as classified by the probe rule table.
    pub backend: Backend,
    /// Probe statement family.
    pub probe: ProbeDialect,
    /// Page parameter order from the pagination rule table.
    pub page_binding: PageBinding,
}

impl DialectProfile {
    pub fn new(backend: Backend, page_binding: PageBinding) -> Self {
        Self {
            backend,
            probe: backend.probe_dialect(),
            page_binding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_binding_order() {
        assert_eq!(PageBinding::LimitOffset.order(20, 10), [10, 20]);
        assert_eq!(PageBinding::OffsetLimit.order(20, 10), [20, 10]);
    }

    #[test]
    fn test_probe_dialect_groups() {
        assert_eq!(Backend::Mysql.probe_dialect(), ProbeDialect::Mysql);
        assert_eq!(Backend::H2.probe_dialect(), ProbeDialect::Mysql);
        assert_eq!(Backend::Postgres.probe_dialect(), ProbeDialect::Mysql);
        assert_eq!(Backend::Db2.probe_dialect(), ProbeDialect::Db2);
        assert_eq!(Backend::Mssql.probe_dialect(), ProbeDialect::Mssql);
        assert_eq!(Backend::Informix.probe_dialect(), ProbeDialect::Informix);
        assert_eq!(Backend::Oracle.probe_dialect(), ProbeDialect::Oracle);
    }

    #[test]
    fn test_profile_serializes_lowercase() {
        let profile = DialectProfile::new(Backend::Postgres, PageBinding::LimitOffset);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"backend\":\"postgres\""));
        assert!(json.contains("\"probe\":\"mysql\""));
        assert!(json.contains("\"page_binding\":\"limit_offset\""));
    }
}
