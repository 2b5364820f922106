//! Commands packet codec for proxied command graphs.
//!
//! [`CommandsCodec`] flattens a [`CommandTree`](command_tree_core::CommandTree)
//! into the wire layout the game client expects and rebuilds a tree from it.
//! Argument parser ids differ between protocol versions; the
//! [`ParserRegistry`] resolves them, and parsers the proxy does not model
//! are carried through as passthrough arguments with their raw properties.
//!
//! ```
//! use command_tree_codec::{CommandsCodec, ProtocolVersion, SuggestionProviderRegistry};
//! use command_tree_core::{ArgumentType, CommandTree, Dispatcher, argument, literal};
//!
//! let mut dispatcher: Dispatcher<()> = Dispatcher::new();
//! dispatcher
//!     .register(literal("say").then(argument("message", ArgumentType::greedy_string()).executes(|_| Ok(1))))
//!     .unwrap();
//!
//! let codec = CommandsCodec::new(ProtocolVersion::MINECRAFT_1_20_5);
//! let mut providers = SuggestionProviderRegistry::new();
//! let packet = codec.encode(dispatcher.tree(), &providers).unwrap();
//! let decoded: CommandTree<()> = codec.decode(packet, &mut providers).unwrap();
//! assert_eq!(decoded.len(), 3);
//! ```

mod buffer;
mod config;
mod error;
mod packet;
mod providers;
mod registry;
mod version;

pub use buffer::{MAX_STRING_LENGTH, PacketReader, PacketWriter};
pub use config::{CodecConfig, DEFAULT_BUFFER_CAPACITY};
pub use error::{CodecError, Result};
pub use packet::{CommandsCodec, flags};
pub use providers::{ASK_SERVER, BUILTIN_PROVIDERS, SuggestionProviderRegistry};
pub use registry::{ParserMapping, ParserRegistry, PropertyLayout, REMOVED_PARSER_ID, identifier_of};
pub use version::ProtocolVersion;
