//! # Built-in Collaborators
//!
//! Default implementations of the engine services the view compiler calls out to:
//!
//! - **`DefaultExpressionChecker`**: rejects aggregates, parameters and
//!   non-deterministic functions inside view expressions.
//! - **`ConjunctCoverage`**: partial-index eligibility by matching filter conjuncts.
//! - **`MinMaxFallbackGenerator`**: one recomputation query per MIN/MAX column.
//! - **`DeferredPlanCompiler`**: records statements for the engine to plan later.
//! - **`PreparsedStatements`**: a parser over already parsed view definitions.
//!
//! The parser is per request; everything else is stateless and bundled in
//! [`Builtins`].

pub mod checker;
pub mod coverage;
pub mod fallback;
pub mod parser;
pub mod planner;

use viewc_core::external::{CompileContext, StatementParser};

pub use checker::DefaultExpressionChecker;
pub use coverage::ConjunctCoverage;
pub use fallback::MinMaxFallbackGenerator;
pub use parser::PreparsedStatements;
pub use planner::DeferredPlanCompiler;

/// The stateless built-in collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtins {
    pub checker: DefaultExpressionChecker,
    pub coverage: ConjunctCoverage,
    pub fallback: MinMaxFallbackGenerator,
    pub planner: DeferredPlanCompiler,
}

impl Builtins {
    /// A compile context using these collaborators and `parser`.
    pub fn context<'a>(&'a self, parser: &'a dyn StatementParser) -> CompileContext<'a> {
        CompileContext {
            parser,
            planner: &self.planner,
            fallback: &self.fallback,
            coverage: &self.coverage,
            checker: &self.checker,
        }
    }
}

/// Create the default collaborator set.
pub fn default_collaborators() -> Builtins {
    Builtins::default()
}
