//! Core types shared by the engine and the backfill runner.
//!
//! - [`token`]: the token row and its paired hash digests
//! - [`traits`]: the transform seam callers plug cryptography into
//! - [`identifier`]: validation for names spliced into statement text

pub mod identifier;
pub mod token;
pub mod traits;

pub use token::{TokenHashes, TokenRecord};
pub use traits::TokenTransform;
