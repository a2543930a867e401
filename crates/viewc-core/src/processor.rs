//! # Schema Pass
//!
//! Compiles every materialized view of a schema in one pass:
//!
//! 1. collect the destination table names of all views, so each view can tell
//!    whether one of its sources is itself a view;
//! 2. compile each view, in definition order, against the unmodified database;
//! 3. write every compiled view into the catalog.
//!
//! The first failure aborts the pass and leaves the database untouched.

use crate::builder::ViewMetadataBuilder;
use crate::catalog::Database;
use crate::config::CompilerConfig;
use crate::error::{CompileWarning, Result};
use crate::external::CompileContext;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Compile `views` (destination table name to view query text) into `db`.
///
/// Returns the warnings raised, in view order.
pub fn compile_views(
    db: &mut Database,
    views: &IndexMap<String, String>,
    ctx: CompileContext<'_>,
    config: &CompilerConfig,
) -> Result<Vec<CompileWarning>> {
    let view_names: HashSet<String> = views.keys().cloned().collect();

    let compiled = {
        let builder = ViewMetadataBuilder::new(db, ctx, config, &view_names);
        views
            .iter()
            .map(|(dest, query)| builder.build(dest, query))
            .collect::<Result<Vec<_>>>()?
    };

    let mut warnings = Vec::new();
    for view in compiled {
        warnings.extend(view.warnings.iter().cloned());
        view.apply(db)?;
    }
    debug!(views = views.len(), warnings = warnings.len(), "schema pass complete");
    Ok(warnings)
}
