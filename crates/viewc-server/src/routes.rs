//! # HTTP Route Handlers
//!
//! ## Compile Pipeline
//!
//! `POST /compile` runs one schema pass per request:
//!
//! 1. **Collect**: the request's views, in order, keyed by destination table.
//! 2. **Compile**: run the view compiler with the request's parsed statements and
//!    the built-in collaborators.
//! 3. **Respond**: the updated database plus warning messages.
//!
//! ## Error Handling
//!
//! - 400 Bad Request: a view was declared twice, or the schema failed to compile.
//! - 500 Internal Server Error: the compiler hit an internal contract violation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use viewc_builtin::PreparsedStatements;
use viewc_core::catalog::Database;
use viewc_core::{compile_views, CompileError};

use crate::state::AppState;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /config
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.compiler.clone())
}

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    pub database: Database,
    /// Views in compile order.
    pub views: Vec<ViewRequest>,
    /// Parsed definition of every view query, keyed by query text.
    #[serde(default)]
    pub statements: PreparsedStatements,
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    /// Destination table of the view.
    pub table: String,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub database: Database,
    pub warnings: Vec<String>,
}

/// POST /compile
pub async fn compile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompileRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    Ok(Json(run_compile(&state, req)?))
}

fn run_compile(state: &AppState, req: CompileRequest) -> Result<CompileResponse, (StatusCode, String)> {
    let CompileRequest {
        mut database,
        views,
        statements,
    } = req;

    let mut definitions = IndexMap::with_capacity(views.len());
    for view in views {
        if definitions.contains_key(&view.table) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Materialized view \"{}\" is defined more than once", view.table),
            ));
        }
        definitions.insert(view.table, view.query);
    }

    let ctx = state.builtins.context(&statements);
    let warnings = compile_views(&mut database, &definitions, ctx, &state.config.compiler).map_err(|e| {
        let status = match &e {
            CompileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, e.to_string())
    })?;

    Ok(CompileResponse {
        database,
        warnings: warnings.iter().map(ToString::to_string).collect(),
    })
}
