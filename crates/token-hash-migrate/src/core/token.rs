//! Token row representation.

use serde::{Deserialize, Serialize};

/// Hash digests for one token row.
///
/// Both digests are computed and written together. A digest is `None`
/// exactly when the token it hashes is NULL, so a row without a refresh
/// token carries an access token digest and a NULL refresh token digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHashes {
    pub access_token_hash: Option<String>,
    pub refresh_token_hash: Option<String>,
}

impl TokenHashes {
    /// Digests for a row where both tokens are present.
    pub fn new(access_token_hash: impl Into<String>, refresh_token_hash: impl Into<String>) -> Self {
        Self {
            access_token_hash: Some(access_token_hash.into()),
            refresh_token_hash: Some(refresh_token_hash.into()),
        }
    }

    /// Digests for a row where either token may be NULL.
    pub fn from_digests(
        access_token_hash: Option<String>,
        refresh_token_hash: Option<String>,
    ) -> Self {
        Self {
            access_token_hash,
            refresh_token_hash,
        }
    }
}

/// One row of the access token table.
///
/// Records are transient copies: read from a page, mutated by a transform,
/// written back in a batch and then dropped. NULL token values stay `None`
/// and are written back as NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    token_id: String,
    /// Plaintext or ciphertext, depending on the migration phase.
    pub access_token: Option<String>,
    /// Plaintext or ciphertext. NULL for grants that issue no refresh token.
    pub refresh_token: Option<String>,
    hashes: Option<TokenHashes>,
}

impl TokenRecord {
    /// Create a record with both tokens present and no hashes.
    pub fn new(
        token_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self::from_tokens(
            token_id,
            Some(access_token.into()),
            Some(refresh_token.into()),
        )
    }

    /// Create a record whose tokens may be NULL, without hashes.
    pub fn from_tokens(
        token_id: impl Into<String>,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            access_token,
            refresh_token,
            hashes: None,
        }
    }

    /// Attach hashes, consuming the record.
    pub fn with_hashes(mut self, hashes: TokenHashes) -> Self {
        self.hashes = Some(hashes);
        self
    }

    /// The update key. Never changes after the record is read.
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn hashes(&self) -> Option<&TokenHashes> {
        self.hashes.as_ref()
    }

    pub fn set_hashes(&mut self, hashes: TokenHashes) {
        self.hashes = Some(hashes);
    }

    pub fn clear_hashes(&mut self) {
        self.hashes = None;
    }

    pub fn access_token_hash(&self) -> Option<&str> {
        self.hashes
            .as_ref()
            .and_then(|h| h.access_token_hash.as_deref())
    }

    pub fn refresh_token_hash(&self) -> Option<&str> {
        self.hashes
            .as_ref()
            .and_then(|h| h.refresh_token_hash.as_deref())
    }

    /// Build a record from the possibly-NULL columns of a row.
    ///
    /// Hashes are kept only when each digest column is NULL exactly where its
    /// token is NULL and at least one digest is set. Anything else, such as a
    /// row holding a single digest for two tokens, reads as unhashed so the
    /// next pass rewrites both.
    pub(crate) fn from_columns(
        token_id: String,
        access_token: Option<String>,
        refresh_token: Option<String>,
        access_token_hash: Option<String>,
        refresh_token_hash: Option<String>,
    ) -> Self {
        let consistent = access_token.is_some() == access_token_hash.is_some()
            && refresh_token.is_some() == refresh_token_hash.is_some()
            && (access_token_hash.is_some() || refresh_token_hash.is_some());

        let hashes =
            consistent.then(|| TokenHashes::from_digests(access_token_hash, refresh_token_hash));

        Self {
            token_id,
            access_token,
            refresh_token,
            hashes,
        }
    }
}
