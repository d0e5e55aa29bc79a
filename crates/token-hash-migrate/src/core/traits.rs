//! Core traits for plugging value transforms into the backfill.
//!
//! The engine never computes digests or ciphertext itself. Callers hand it
//! records whose values were produced by a [`TokenTransform`], which keeps
//! the cryptography out of the database code:
//!
//! - Plain-text phase: a hashing transform fills in both digests
//! - Encryption phase: an encryption transform rewrites the token values and
//!   fills in the digests of the plaintext
//!
//! # Design Patterns
//!
//! - **Strategy**: transforms are interchangeable per migration phase

use crate::error::Result;

use super::token::TokenRecord;

/// Rewrite one token record in place before it is written back.
///
/// Implementations must either set both hashes or leave both untouched.
/// Returning an error aborts the current page before any statement for it is
/// queued.
pub trait TokenTransform: Send + Sync {
    /// Transform a single record.
    fn apply(&self, record: &mut TokenRecord) -> Result<()>;

    /// Short name used in logs and run results.
    fn name(&self) -> &str;

    /// Transform every record of a page.
    ///
    /// This is a template method; the default applies [`apply`](Self::apply)
    /// to each record in order and stops at the first failure.
    fn apply_all(&self, records: &mut [TokenRecord]) -> Result<()> {
        for record in records.iter_mut() {
            self.apply(record)?;
        }
        Ok(())
    }
}
