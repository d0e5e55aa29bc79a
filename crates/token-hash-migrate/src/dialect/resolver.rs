//! Backend classification from connection metadata strings.
//!
//! Driver and product names overlap between vendors, so classification is a
//! first-match walk over ordered rule tables. The order is the behavior: a
//! driver string mentioning both MySQL and PostgreSQL resolves to MySQL
//! because the MySQL rule comes first.
//!
//! Probe selection and pagination selection use two independent tables. They
//! group backends differently (DB2 pages like MySQL but probes with its own
//! statement) and are kept apart on purpose.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, DialectProfile, PageBinding};

/// Metadata strings reported by (or configured for) a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionMetadata {
    pub driver_name: String,
    pub product_name: String,
}

impl ConnectionMetadata {
    pub fn new(driver_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            product_name: product_name.into(),
        }
    }
}

/// Which metadata string a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    DriverName,
    ProductName,
}

/// One row of a rule table: if `field` contains `needle`, pick `target`.
#[derive(Debug, Clone, Copy)]
pub struct DialectRule<T> {
    pub field: MatchField,
    /// Lowercase substring, compared case-insensitively.
    pub needle: &'static str,
    pub target: T,
}

const fn rule<T>(field: MatchField, needle: &'static str, target: T) -> DialectRule<T> {
    DialectRule {
        field,
        needle,
        target,
    }
}

/// Probe classification, in priority order. No match means [`Backend::Oracle`].
pub const PROBE_RULES: &[DialectRule<Backend>] = &[
    rule(MatchField::DriverName, "mysql", Backend::Mysql),
    rule(MatchField::DriverName, "h2", Backend::H2),
    rule(MatchField::ProductName, "db2", Backend::Db2),
    rule(MatchField::DriverName, "ms sql", Backend::Mssql),
    rule(MatchField::DriverName, "microsoft", Backend::Mssql),
    rule(MatchField::DriverName, "postgresql", Backend::Postgres),
    // "IBM Informix JDBC Driver for IBM Informix Dynamic Server"
    rule(MatchField::DriverName, "informix", Backend::Informix),
    rule(MatchField::DriverName, "sqlite", Backend::Sqlite),
];

/// Pagination classification, in priority order. No match means
/// [`PageBinding::OffsetLimit`].
///
/// DB2 is matched on the product name: its driver name does not identify it.
pub const PAGE_RULES: &[DialectRule<PageBinding>] = &[
    rule(MatchField::DriverName, "mysql", PageBinding::LimitOffset),
    rule(MatchField::ProductName, "db2", PageBinding::LimitOffset),
    rule(MatchField::DriverName, "h2", PageBinding::LimitOffset),
    rule(MatchField::DriverName, "postgresql", PageBinding::LimitOffset),
    rule(MatchField::DriverName, "sqlite", PageBinding::LimitOffset),
];

/// Walk `rules` in order and return the first target whose needle occurs in
/// the inspected field.
pub fn first_match<T: Copy>(rules: &[DialectRule<T>], metadata: &ConnectionMetadata) -> Option<T> {
    let driver = metadata.driver_name.to_lowercase();
    let product = metadata.product_name.to_lowercase();

    rules
        .iter()
        .find(|r| {
            let haystack = match r.field {
                MatchField::DriverName => &driver,
                MatchField::ProductName => &product,
            };
            haystack.contains(r.needle)
        })
        .map(|r| r.target)
}

/// Resolve the statement choices for a connection. Never fails.
pub fn resolve_dialect(metadata: &ConnectionMetadata) -> DialectProfile {
    let backend = first_match(PROBE_RULES, metadata).unwrap_or(Backend::Oracle);
    let page_binding = first_match(PAGE_RULES, metadata).unwrap_or(PageBinding::OffsetLimit);

    debug!(
        "Resolved dialect {} (page binding {:?}) from driver {:?}, product {:?}",
        backend,
        page_binding,
        metadata.driver_name,
        metadata.product_name,
    );

    DialectProfile::new(backend, page_binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ProbeDialect;

    fn resolve(driver: &str, product: &str) -> DialectProfile {
        resolve_dialect(&ConnectionMetadata::new(driver, product))
    }

    #[test]
    fn test_known_drivers() {
        let cases = [
            ("MySQL Connector/J", "MySQL", Backend::Mysql, PageBinding::LimitOffset),
            ("H2 JDBC Driver", "H2", Backend::H2, PageBinding::LimitOffset),
            ("IBM Data Server Driver for JDBC", "DB2/LINUXX8664", Backend::Db2, PageBinding::LimitOffset),
            ("Microsoft JDBC Driver 9.4 for SQL Server", "Microsoft SQL Server", Backend::Mssql, PageBinding::OffsetLimit),
            ("jTDS Type 4 JDBC Driver for MS SQL Server", "Microsoft SQL Server", Backend::Mssql, PageBinding::OffsetLimit),
            ("PostgreSQL JDBC Driver", "PostgreSQL", Backend::Postgres, PageBinding::LimitOffset),
            (
                "IBM Informix JDBC Driver for IBM Informix Dynamic Server",
                "Informix Dynamic Server",
                Backend::Informix,
                PageBinding::OffsetLimit,
            ),
            ("SQLite", "SQLite", Backend::Sqlite, PageBinding::LimitOffset),
            ("Oracle JDBC driver", "Oracle", Backend::Oracle, PageBinding::OffsetLimit),
        ];

        for (driver, product, backend, binding) in cases {
            let profile = resolve(driver, product);
            assert_eq!(profile.backend, backend, "driver {:?}", driver);
            assert_eq!(profile.page_binding, binding, "driver {:?}", driver);
        }
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let profile = resolve("MySQL and PostgreSQL bridge", "");
        assert_eq!(profile.backend, Backend::Mysql);

        // DB2 product beats an MSSQL-looking driver in the probe table
        let profile = resolve("Microsoft bridge", "DB2 for z/OS");
        assert_eq!(profile.backend, Backend::Db2);
        assert_eq!(profile.probe, ProbeDialect::Db2);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(resolve("mysql-native", "").backend, Backend::Mysql);
        assert_eq!(resolve("POSTGRESQL", "").backend, Backend::Postgres);
        assert_eq!(resolve("", "db2").backend, Backend::Db2);
    }

    #[test]
    fn test_unknown_falls_back_to_oracle() {
        let profile = resolve("Some Vendor Driver", "Some Product");
        assert_eq!(profile.backend, Backend::Oracle);
        assert_eq!(profile.probe, ProbeDialect::Oracle);
        assert_eq!(profile.page_binding, PageBinding::OffsetLimit);

        let profile = resolve("", "");
        assert_eq!(profile.backend, Backend::Oracle);
    }

    #[test]
    fn test_db2_only_matches_product_name() {
        // A driver name mentioning DB2 is not enough for either table
        let profile = resolve("DB2 Universal Driver", "Unknown");
        assert_eq!(profile.backend, Backend::Oracle);
        assert_eq!(profile.page_binding, PageBinding::OffsetLimit);
    }

    #[test]
    fn test_probe_and_page_tables_group_differently() {
        // PostgreSQL probes with the MySQL text and pages with LIMIT/OFFSET
        let pg = resolve("PostgreSQL JDBC Driver", "PostgreSQL");
        assert_eq!(pg.probe, ProbeDialect::Mysql);
        assert_eq!(pg.page_binding, PageBinding::LimitOffset);

        // DB2 has its own probe but pages with LIMIT/OFFSET
        let db2 = resolve("IBM Data Server Driver", "DB2/NT");
        assert_eq!(db2.probe, ProbeDialect::Db2);
        assert_eq!(db2.page_binding, PageBinding::LimitOffset);

        // MSSQL has its own probe and pages with OFFSET/FETCH
        let mssql = resolve("Microsoft JDBC Driver", "Microsoft SQL Server");
        assert_eq!(mssql.probe, ProbeDialect::Mssql);
        assert_eq!(mssql.page_binding, PageBinding::OffsetLimit);
    }

    #[test]
    fn test_rule_tables_are_lowercase() {
        for r in PROBE_RULES {
            assert_eq!(r.needle, r.needle.to_lowercase());
        }
        for r in PAGE_RULES {
            assert_eq!(r.needle, r.needle.to_lowercase());
        }
    }

    #[test]
    fn test_first_match_respects_table_order() {
        let rules = [
            rule(MatchField::DriverName, "a", 1),
            rule(MatchField::DriverName, "ab", 2),
        ];
        let metadata = ConnectionMetadata::new("ab", "");
        assert_eq!(first_match(&rules, &metadata), Some(1));
        assert_eq!(first_match(&rules[1..], &metadata), Some(2));
        assert_eq!(first_match(&rules, &ConnectionMetadata::new("z", "")), None);
    }
}
