//! # Pre-parsed Statements
//!
//! A [`StatementParser`] for callers whose SQL front end already ran: view query
//! text maps straight to its parsed [`ViewDefinition`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use viewc_core::external::{ParseError, StatementParser};
use viewc_core::statement::ViewDefinition;

/// Parsed definitions keyed by query text, ignoring surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreparsedStatements {
    statements: HashMap<String, ViewDefinition>,
}

impl PreparsedStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: &str, definition: ViewDefinition) {
        self.statements.insert(query.trim().to_string(), definition);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, ViewDefinition)> for PreparsedStatements {
    fn from_iter<I: IntoIterator<Item = (S, ViewDefinition)>>(iter: I) -> Self {
        let mut statements = Self::new();
        for (query, definition) in iter {
            statements.insert(query.as_ref(), definition);
        }
        statements
    }
}

impl StatementParser for PreparsedStatements {
    fn parse(&self, query: &str) -> Result<ViewDefinition, ParseError> {
        self.statements
            .get(query.trim())
            .cloned()
            .ok_or_else(|| ParseError::new(format!("no parsed definition for view query: {}", query.trim())))
    }
}
