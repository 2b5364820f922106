//! Grammar document validation.
//!
//! Catches problems that would otherwise surface as graph errors or as
//! commands that can never match: empty names, duplicate siblings,
//! redirects combined with children, and redirect paths that lead nowhere.
//!
//! ```
//! use command_tree_grammar::*;
//!
//! let doc = GrammarDocument::new()
//!     .with_command(NodeSpec::literal("tp").child(NodeSpec::literal("here").executes(1)))
//!     .with_command(NodeSpec::literal("teleport").redirect(["tp"]));
//! assert!(validate_document(&doc).is_empty());
//!
//! let bad = GrammarDocument::new().with_command(NodeSpec::literal("go").redirect(["nowhere"]));
//! assert!(!validate_document(&bad).is_empty());
//! ```

use std::collections::HashSet;

use crate::document::{GrammarDocument, NodeSpec};
use crate::error::GrammarValidationError;

/// Returns every problem found in `document`; empty when it is valid.
pub fn validate_document(document: &GrammarDocument) -> Vec<GrammarValidationError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    validate_siblings(document, &document.commands, &mut path, &mut errors);
    errors
}

fn validate_siblings(
    document: &GrammarDocument,
    nodes: &[NodeSpec],
    path: &mut Vec<String>,
    errors: &mut Vec<GrammarValidationError>,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        path.push(node.name.clone());
        let here = path.join(" ");

        if node.name.trim().is_empty() {
            errors.push(GrammarValidationError::EmptyName(here.clone()));
        } else if !seen.insert(node.name.as_str()) {
            errors.push(GrammarValidationError::DuplicateSibling(here.clone()));
        }
        if node.is_literal() && node.name.chars().any(char::is_whitespace) {
            errors.push(GrammarValidationError::InvalidLiteral(here.clone()));
        }
        if node.is_literal() && node.suggestions.is_some() {
            errors.push(GrammarValidationError::SuggestionsOnLiteral(here.clone()));
        }
        if node.argument.as_ref().is_some_and(|a| !a.has_valid_bounds()) {
            errors.push(GrammarValidationError::InvalidBounds(here.clone()));
        }

        match &node.redirect {
            Some(target) => {
                if !node.children.is_empty() {
                    errors.push(GrammarValidationError::RedirectWithChildren(here.clone()));
                }
                if !target.is_empty() && document.find(target).is_none() {
                    errors.push(GrammarValidationError::UnresolvedRedirect {
                        node: here.clone(),
                        target: target.join(" "),
                    });
                }
            }
            None if node.fork => {
                errors.push(GrammarValidationError::ForkWithoutRedirect(here.clone()));
            }
            None => {}
        }

        validate_siblings(document, &node.children, path, errors);
        path.pop();
    }
}
