//! Command graph, text cursor and asynchronous dispatcher for proxied game
//! commands.
//!
//! The crate models the command grammar a game server advertises to its
//! clients:
//!
//! - [`StringReader`]: a cursor over raw input that reads numbers, booleans
//!   and quoted or unquoted strings.
//! - [`CommandTree`]: an arena of [`CommandNode`]s (root, literals and typed
//!   arguments) linked by children and redirects.
//! - [`literal`] / [`argument`]: fluent [`ArgumentBuilder`]s for populating
//!   the graph.
//! - [`Dispatcher`]: parses input with backtracking over ambiguous
//!   branches, executes the winning parse across redirect chains, offers
//!   completions, and renders usage text.
//!
//! Executors, requirements and suggestion providers are asynchronous and
//! receive a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! # Example
//!
//! ```
//! use command_tree_core::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # futures::executor::block_on(async {
//! let mut dispatcher: Dispatcher<()> = Dispatcher::new();
//! dispatcher
//!     .register(
//!         literal("tp")
//!             .then(literal("here").executes(|_| Ok(1)))
//!             .then(argument("target", ArgumentType::word()).executes(|_| Ok(2))),
//!     )
//!     .unwrap();
//!
//! let cancel = CancellationToken::new();
//! assert_eq!(dispatcher.execute_input("tp here", (), &cancel).await.unwrap(), 1);
//! assert_eq!(dispatcher.execute_input("tp Steve", (), &cancel).await.unwrap(), 2);
//! # });
//! ```

mod arguments;
mod builder;
mod callbacks;
mod chain;
mod context;
mod dispatcher;
mod error;
mod range;
mod reader;
mod suggestion;
mod tree;
mod usage;

pub use arguments::{ArgumentType, ArgumentValue, ParsedArgument, PassthroughArgument, StringKind};
pub use builder::{ArgumentBuilder, argument, literal};
pub use callbacks::{
    Command, RedirectModifier, Requirement, ResultConsumer, Source, SuggestionProvider,
};
pub use chain::ContextChain;
pub use context::{CommandContext, CommandContextBuilder, ParsedCommandNode, SuggestionContext};
pub use dispatcher::{Dispatcher, ParseResults};
pub use error::{CommandError, CommandResult, CommandSyntaxError, GraphError, SyntaxErrorKind};
pub use range::StringRange;
pub use reader::StringReader;
pub use suggestion::{Suggestion, Suggestions, SuggestionsBuilder};
pub use tree::{CommandNode, CommandTree, NodeId, NodeKind};
