//! Serializable grammar documents for command graphs.
//!
//! A [`GrammarDocument`] describes commands as nested literal and argument
//! nodes and loads from JSON or YAML. [`GrammarDocument::build`] turns it
//! into a [`Dispatcher`](command_tree_core::Dispatcher), and
//! [`GrammarDocument::from_tree`] exports any graph, including one decoded
//! from a Commands packet, back into a document.

mod build;
mod document;
mod error;
mod source;
mod validate;

pub use document::{
    ArgumentSpec, DocumentFormat, GRAMMAR_FORMAT_VERSION, GrammarDocument, NodeSpec,
};
pub use error::{GrammarError, GrammarValidationError, Result};
pub use source::{CommandSource, PermissionHolder};
pub use validate::validate_document;
