//! Backfill runner - drives one hash backfill over a single connection.
//!
//! Phases: resolve dialect, probe, add missing hash columns, then page
//! through the token table, transforming each page and writing it back as
//! one transaction. The loop ends on the first short page.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::AnyConnection;
use tracing::{debug, info, warn};

use crate::config::{BackfillConfig, Config};
use crate::core::TokenTransform;
use crate::dialect::{
    resolve_dialect, ConnectionMetadata, DialectProfile, ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH,
};
use crate::engine::{ProbeOutcome, TokenHashEngine, WriteMode};
use crate::error::{MigrateError, Result};

/// Backfill over one token table.
pub struct TokenBackfill {
    engine: TokenHashEngine,
    settings: BackfillConfig,
    config_hash: String,
    mode: WriteMode,
    transform: Box<dyn TokenTransform>,
}

/// What the probe found on a connection.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Resolved statement choices.
    pub dialect: DialectProfile,

    /// Typed probe result.
    pub outcome: ProbeOutcome,

    /// True only when both hash columns exist.
    pub hash_columns_present: bool,
}

/// Result of a backfill run.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status ("completed" or "dry_run").
    pub status: String,

    /// Which update statement the batches used.
    pub mode: WriteMode,

    /// Name of the transform applied to each record.
    pub transform: String,

    /// Resolved statement choices.
    pub dialect: DialectProfile,

    /// SHA256 fingerprint of the configuration.
    pub config_hash: String,

    /// Probe result before any column was added.
    pub initial_probe: ProbeOutcome,

    /// Hash columns added during this run.
    pub columns_added: Vec<String>,

    /// Pages read and written.
    pub pages: usize,

    /// Tokens written back.
    pub tokens_updated: usize,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Average throughput (tokens/second).
    pub tokens_per_second: i64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,
}

impl TokenBackfill {
    /// Create a backfill for the configured table.
    pub fn new<T>(config: &Config, mode: WriteMode, transform: T) -> Result<Self>
    where
        T: TokenTransform + 'static,
    {
        config.validate()?;

        Ok(Self {
            engine: TokenHashEngine::from_config(&config.table)?,
            settings: config.backfill.clone(),
            config_hash: config.hash(),
            mode,
            transform: Box::new(transform),
        })
    }

    pub fn engine(&self) -> &TokenHashEngine {
        &self.engine
    }

    /// Resolve the dialect and probe for the hash columns without changing anything.
    pub async fn probe(
        &self,
        conn: &mut AnyConnection,
        metadata: &ConnectionMetadata,
    ) -> ProbeReport {
        let dialect = resolve_dialect(metadata);
        let outcome = self.engine.probe_hash_columns(conn, &dialect).await;

        ProbeReport {
            dialect,
            hash_columns_present: outcome.is_present(),
            outcome,
        }
    }

    /// Run the backfill. A dry run stops after the probe.
    pub async fn run(
        &self,
        conn: &mut AnyConnection,
        metadata: &ConnectionMetadata,
        dry_run: bool,
    ) -> Result<BackfillResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Starting {} backfill run {} (transform: {})",
            self.mode,
            run_id,
            self.transform.name()
        );

        // Phase 1: Probe
        let report = self.probe(conn, metadata).await;
        info!(
            "Phase 1: Dialect {} (page binding {:?}), hash columns present: {}",
            report.dialect.backend, report.dialect.page_binding, report.hash_columns_present
        );

        let mut columns_added = Vec::new();
        let mut pages = 0;
        let mut tokens_updated = 0;

        if dry_run {
            info!("Dry run: stopping after probe");
        } else {
            // Phase 2: Schema
            if !report.hash_columns_present {
                if !self.settings.add_missing_columns {
                    return Err(MigrateError::Config(format!(
                        "token table is missing hash columns ({}) and \
                         backfill.add_missing_columns is false",
                        describe(&report.outcome)
                    )));
                }
                info!("Phase 2: Adding hash columns");
                columns_added = self.add_missing_columns(conn, &report.dialect).await?;
            }

            // Phase 3: Rewrite
            info!("Phase 3: Rewriting tokens in pages of {}", self.settings.page_size);
            (pages, tokens_updated) = self.rewrite_pages(conn, &report.dialect).await?;
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let tokens_per_second = if duration > 0.0 {
            (tokens_updated as f64 / duration) as i64
        } else {
            0
        };

        let result = BackfillResult {
            run_id,
            status: if dry_run { "dry_run" } else { "completed" }.to_string(),
            mode: self.mode,
            transform: self.transform.name().to_string(),
            dialect: report.dialect,
            config_hash: self.config_hash.clone(),
            initial_probe: report.outcome,
            columns_added,
            pages,
            tokens_updated,
            duration_seconds: duration,
            tokens_per_second,
            started_at,
            completed_at,
        };

        info!(
            "Backfill {}: {} tokens in {} pages in {:.1}s ({} tokens/s)",
            result.status,
            result.tokens_updated,
            result.pages,
            result.duration_seconds,
            result.tokens_per_second
        );

        Ok(result)
    }

    /// Add whichever hash columns the probe reports missing.
    ///
    /// The probe names only the first missing column, so it is re-run before
    /// each addition. An unrunnable probe adds the column unconditionally.
    async fn add_missing_columns(
        &self,
        conn: &mut AnyConnection,
        dialect: &DialectProfile,
    ) -> Result<Vec<String>> {
        let mut added = Vec::new();

        for column in [ACCESS_TOKEN_HASH, REFRESH_TOKEN_HASH] {
            match self.engine.probe_hash_columns(conn, dialect).await {
                ProbeOutcome::Present => break,
                ProbeOutcome::Missing { column: missing } if missing != column => continue,
                _ => {}
            }

            if column == ACCESS_TOKEN_HASH {
                self.engine.add_access_token_hash_column(conn).await?;
            } else {
                self.engine.add_refresh_token_hash_column(conn).await?;
            }
            added.push(column.to_string());
        }

        if !self.engine.hash_columns_present(conn, dialect).await {
            warn!("Hash columns still not visible to the probe after adding {:?}", added);
        }

        Ok(added)
    }

    async fn rewrite_pages(
        &self,
        conn: &mut AnyConnection,
        dialect: &DialectProfile,
    ) -> Result<(usize, usize)> {
        let page_size = self.settings.page_size;
        let limit = page_size as i64;
        let mut offset: i64 = 0;
        let mut pages = 0;
        let mut tokens = 0;

        loop {
            let mut page = self
                .engine
                .list_tokens_page(conn, dialect, offset, limit)
                .await?;
            if page.is_empty() {
                break;
            }

            self.transform.apply_all(&mut page)?;
            self.engine.write_batch(conn, self.mode, &page).await?;

            pages += 1;
            tokens += page.len();
            debug!("Page {} at offset {}: {} tokens written", pages, offset, page.len());

            if page.len() < page_size {
                break;
            }
            offset += limit;
        }

        Ok((pages, tokens))
    }
}

impl BackfillResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ProbeReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn describe(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Present => "none".to_string(),
        ProbeOutcome::Missing { column } => format!("{} not found", column),
        ProbeOutcome::Unavailable { reason } => format!("probe failed: {}", reason),
    }
}
