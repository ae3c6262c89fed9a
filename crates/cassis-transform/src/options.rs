//! Options for the closure conversion pass

use cassis_hir::scope::DEFAULT_TEMPORARY_PREFIX;
use serde::{Deserialize, Serialize};

/// Tunables for `convert_closures`, usually read from the `[lift]` table of `cassis.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiftOptions {
    /// Field holding a captured enclosing instance
    pub self_field_name: String,
    /// Prefix for temporaries minted during lifting
    pub temporary_prefix: String,
}

impl Default for LiftOptions {
    fn default() -> Self {
        Self {
            self_field_name: "_this".to_string(),
            temporary_prefix: DEFAULT_TEMPORARY_PREFIX.to_string(),
        }
    }
}
