//! Error types for packet encoding and decoding.
//!
//! Every structural problem in a Commands packet is fatal for that decode
//! attempt; no partially linked graph is ever returned.

use command_tree_core::GraphError;
use thiserror::Error;

use crate::version::ProtocolVersion;

/// Errors raised by the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The buffer ended before a value could be read.
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A VarInt ran past five bytes.
    #[error("VarInt is too big")]
    VarIntTooBig,

    /// A length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),

    /// A string exceeded the protocol limit.
    #[error("string of length {length} exceeds the maximum of {max}")]
    StringTooLong { length: usize, max: usize },

    /// String bytes were not UTF-8.
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The encoded graph did not fit in the configured capacity.
    #[error("encoded packet is {size} bytes, capacity is {limit}")]
    PacketTooLarge { size: usize, limit: usize },

    /// Low two flag bits named no known node kind.
    #[error("node {node} has unknown kind {kind}")]
    UnknownNodeKind { node: usize, kind: u8 },

    /// A child or redirect index pointed outside the node list.
    #[error("node {node} points to non-existent index {index} (node count {count})")]
    IndexOutOfRange { node: usize, index: i32, count: usize },

    /// The fixed-point pass stopped with nodes still unbuilt.
    #[error("broken command graph: {remaining} node(s) could not be built")]
    UnresolvedNodes { remaining: usize },

    /// A root record was listed as somebody's child.
    #[error("node {parent} lists root node {child} as a child")]
    RootAsChild { parent: usize, child: usize },

    /// The trailing root index named a non-root record.
    #[error("root index {0} does not refer to a root node")]
    RootIndexNotRoot(i32),

    /// More than one root record was present.
    #[error("node {0} is a second root node")]
    DuplicateRoot(usize),

    /// No parser is registered under the numeric id for this version.
    #[error("unknown argument parser id {id} for protocol {version}")]
    UnknownParserId { id: i32, version: ProtocolVersion },

    /// No parser is registered under the identifier.
    #[error("unknown argument parser {0}")]
    UnknownParserIdentifier(String),

    /// The parser exists but has no id in this protocol version.
    #[error("argument parser {identifier} has no id in protocol {version}")]
    MissingParserId { identifier: String, version: ProtocolVersion },

    /// A parser property payload could not be interpreted.
    #[error("invalid argument properties: {0}")]
    InvalidProperty(String),

    /// The protocol predates the Commands packet.
    #[error("protocol {0} does not carry a command graph")]
    UnsupportedVersion(ProtocolVersion),

    /// The decoded graph could not be linked.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration file I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration YAML failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`CodecError`].
pub type Result<T> = std::result::Result<T, CodecError>;
