//! Built-in token transforms.

use sha2::{Digest, Sha256};

use crate::core::{TokenHashes, TokenRecord, TokenTransform};
use crate::error::Result;

/// Fills in SHA-256 digests of the current token values.
///
/// Digests are lowercase hex. A NULL token gets a NULL digest. The token
/// values themselves are left as read, which is what the plain-text phase
/// needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256TokenHasher;

impl Sha256TokenHasher {
    pub fn digest(value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl TokenTransform for Sha256TokenHasher {
    fn apply(&self, record: &mut TokenRecord) -> Result<()> {
        let hashes = TokenHashes::from_digests(
            record.access_token.as_deref().map(Self::digest),
            record.refresh_token.as_deref().map(Self::digest),
        );
        record.set_hashes(hashes);
        Ok(())
    }

    fn name(&self) -> &str {
        "sha256"
    }
}
