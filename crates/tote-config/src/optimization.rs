//! Production optimization switches.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HASH_LENGTH: usize = 20;
pub const MIN_HASH_LENGTH: usize = 8;
/// BLAKE3 hex digest length.
pub const MAX_HASH_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationOptions {
    #[serde(default = "default_true")]
    pub split_chunks: bool,

    #[serde(default = "default_true")]
    pub minimize: bool,

    #[serde(default = "default_true")]
    pub strip_comments: bool,

    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            split_chunks: true,
            minimize: true,
            strip_comments: true,
            hash_length: DEFAULT_HASH_LENGTH,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}
