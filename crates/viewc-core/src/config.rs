//! # Compiler Configuration

use crate::statement::DeterminismMode;
use serde::{Deserialize, Serialize};

/// Knobs for one schema-compile pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Determinism mode for every fallback and create-query statement.
    pub determinism: DeterminismMode,
    /// Emit a warning when a MIN/MAX aggregate has no supporting source index.
    pub warn_missing_min_max_index: bool,
    /// Skip those warnings for views over streamed (export-only) tables, which are
    /// never updated or deleted from.
    pub skip_warnings_for_streams: bool,
    /// Name of the unique index generated over a view's grouping columns.
    pub pk_index_name: String,
    /// Name of the PRIMARY KEY constraint backed by that index.
    pub pk_constraint_name: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            determinism: DeterminismMode::Faster,
            warn_missing_min_max_index: true,
            skip_warnings_for_streams: true,
            pk_index_name: "MATVIEW_PK_INDEX".to_string(),
            pk_constraint_name: "MATVIEW_PK_CONSTRAINT".to_string(),
        }
    }
}
