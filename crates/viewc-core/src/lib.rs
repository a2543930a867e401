//! # viewc-core: Materialized View Definition Compiler
//!
//! This crate turns parsed `CREATE VIEW ... AS SELECT ... GROUP BY` definitions into
//! the catalog metadata an engine needs to maintain the views incrementally, and
//! picks the source-table index each MIN/MAX aggregate should use for maintenance.
//!
//! ## Module Overview
//!
//! - **`expr`**: Typed expression trees, their JSON and hex-JSON catalog forms.
//! - **`catalog`**: Tables, columns, indexes, constraints and view records.
//! - **`statement`**: Parsed view definitions and compiled fallback statements.
//! - **`external`**: Traits for the parser, planner, fallback generator, predicate
//!   coverage test and expression checker this crate relies on.
//! - **`validate`**: Structural rules a maintainable view must satisfy.
//! - **`partition`**: Whether and how a view inherits its source's partitioning.
//! - **`index_match`**: Maintenance index selection.
//! - **`builder`**: Per-view metadata construction.
//! - **`processor`**: The schema pass over all views.
//! - **`config`** / **`error`**: Compiler knobs, errors and warnings.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expr;
pub mod external;
pub mod index_match;
pub mod partition;
pub mod processor;
pub mod statement;
pub mod validate;

pub use error::{CompileError, CompileWarning, Result};
pub use processor::compile_views;
