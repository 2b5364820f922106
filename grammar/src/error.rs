//! Error types for grammar documents.

use command_tree_core::GraphError;
use thiserror::Error;

/// Structural problems found by [`validate_document`](crate::validate_document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarValidationError {
    /// A node name is empty or whitespace-only.
    #[error("empty node name at: {0}")]
    EmptyName(String),
    /// A literal contains whitespace and could never match a token.
    #[error("literal contains whitespace: {0}")]
    InvalidLiteral(String),
    /// Two siblings share a name.
    #[error("duplicate node: {0}")]
    DuplicateSibling(String),
    /// A node both redirects and has children.
    #[error("node cannot redirect and have children: {0}")]
    RedirectWithChildren(String),
    /// A redirect path names no node.
    #[error("redirect of {node} points to unknown path [{target}]")]
    UnresolvedRedirect { node: String, target: String },
    /// `fork` was set on a node with no redirect.
    #[error("fork without redirect: {0}")]
    ForkWithoutRedirect(String),
    /// Custom suggestions were declared on a literal.
    #[error("suggestions on literal: {0}")]
    SuggestionsOnLiteral(String),
    /// A numeric argument's minimum exceeds its maximum.
    #[error("minimum exceeds maximum: {0}")]
    InvalidBounds(String),
}

/// Errors raised while loading, building or exporting grammar documents.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension names no supported format.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document failed validation.
    #[error("invalid grammar: {}", format_errors(.0))]
    Invalid(Vec<GrammarValidationError>),

    /// A redirect target has no name path from the root.
    #[error("redirect of {node} targets a node unreachable from the root")]
    UnresolvedRedirect { node: String },

    /// The graph's children form a cycle a document cannot express.
    #[error("child cycle detected at: {0}")]
    Cycle(String),

    /// The graph rejected a node.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

fn format_errors(errors: &[GrammarValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`GrammarError`].
pub type Result<T> = std::result::Result<T, GrammarError>;
