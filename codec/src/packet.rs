//! The Commands packet: a flattened command graph.
//!
//! Nodes are listed in breadth-first order from the root. Each entry is a
//! flags byte, the child indices, an optional redirect index and a
//! kind-specific payload; the packet ends with the index of the root.

use std::collections::{HashSet, VecDeque};

use bytes::Bytes;
use command_tree_core::{
    ArgumentType, Command, CommandNode, CommandTree, NodeId, NodeKind, Requirement, Source,
};
use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::buffer::{PacketReader, PacketWriter};
use crate::config::{CodecConfig, DEFAULT_BUFFER_CAPACITY};
use crate::error::{CodecError, Result};
use crate::providers::SuggestionProviderRegistry;
use crate::registry::ParserRegistry;
use crate::version::ProtocolVersion;

/// Node flag bits.
pub mod flags {
    pub const KIND_MASK: u8 = 0x03;
    pub const KIND_ROOT: u8 = 0x00;
    pub const KIND_LITERAL: u8 = 0x01;
    pub const KIND_ARGUMENT: u8 = 0x02;
    pub const EXECUTABLE: u8 = 0x04;
    pub const HAS_REDIRECT: u8 = 0x08;
    pub const HAS_SUGGESTIONS_TYPE: u8 = 0x10;
    pub const RESTRICTED: u8 = 0x20;
}

/// Encodes and decodes command graphs for one protocol version.
#[derive(Debug, Clone)]
pub struct CommandsCodec {
    version: ProtocolVersion,
    capacity: usize,
    parsers: ParserRegistry,
}

impl CommandsCodec {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            capacity: DEFAULT_BUFFER_CAPACITY,
            parsers: ParserRegistry::vanilla(),
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.protocol_version).with_capacity(config.buffer_capacity)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    fn check_version(&self) -> Result<()> {
        if self.version.has_command_graph() {
            Ok(())
        } else {
            Err(CodecError::UnsupportedVersion(self.version))
        }
    }

    /// Encodes the graph reachable from the tree's root.
    ///
    /// Redirect targets are included even when they are not reachable as
    /// anybody's child.
    pub fn encode<S: Source>(
        &self,
        tree: &CommandTree<S>,
        providers: &SuggestionProviderRegistry<S>,
    ) -> Result<Bytes> {
        self.check_version()?;

        let mut queue = VecDeque::from([tree.root()]);
        let mut indices: IndexSet<NodeId> = IndexSet::new();
        while let Some(id) = queue.pop_front() {
            if !indices.insert(id) {
                continue;
            }
            let node = &tree[id];
            queue.extend(node.children());
            if let Some(target) = node.redirect() {
                queue.push_back(target);
            }
        }

        let mut writer = PacketWriter::with_limit(self.capacity);
        writer.write_var_int(wire_index(indices.len())?)?;
        for id in &indices {
            self.write_node(&mut writer, &tree[*id], &indices, providers)?;
        }
        let root = indices
            .get_index_of(&tree.root())
            .ok_or(CodecError::RootIndexNotRoot(-1))?;
        writer.write_var_int(wire_index(root)?)?;

        debug!(
            nodes = indices.len(),
            bytes = writer.len(),
            version = %self.version,
            "encoded command graph"
        );
        Ok(writer.into_bytes())
    }

    fn write_node<S: Source>(
        &self,
        writer: &mut PacketWriter,
        node: &CommandNode<S>,
        indices: &IndexSet<NodeId>,
        providers: &SuggestionProviderRegistry<S>,
    ) -> Result<()> {
        let mut bits = match node.kind() {
            NodeKind::Root => flags::KIND_ROOT,
            NodeKind::Literal(_) => flags::KIND_LITERAL,
            NodeKind::Argument { .. } => flags::KIND_ARGUMENT,
        };
        if node.is_executable() {
            bits |= flags::EXECUTABLE;
        }
        if node.redirect().is_some() {
            bits |= flags::HAS_REDIRECT;
        }
        if node.custom_suggestions().is_some() {
            bits |= flags::HAS_SUGGESTIONS_TYPE;
        }
        if node.is_restricted() {
            bits |= flags::RESTRICTED;
        }
        writer.write_u8(bits)?;

        writer.write_var_int(wire_index(node.children().len())?)?;
        for child in node.children() {
            writer.write_var_int(index_of(indices, child)?)?;
        }
        if let Some(target) = node.redirect() {
            writer.write_var_int(index_of(indices, target)?)?;
        }

        match node.kind() {
            NodeKind::Root => {}
            NodeKind::Literal(literal) => writer.write_string(literal)?,
            NodeKind::Argument {
                name,
                ty,
                suggestions,
            } => {
                writer.write_string(name)?;
                self.parsers.write_argument(writer, ty, self.version)?;
                if let Some(provider) = suggestions {
                    writer.write_string(providers.wire_name(provider))?;
                }
            }
        }
        Ok(())
    }

    /// Decodes a packet into a fresh tree.
    ///
    /// Executable nodes get an executor that returns `0` and restricted
    /// nodes a requirement that always passes, so re-encoding reproduces
    /// the same flags. Unknown suggestion provider names are registered in
    /// `providers` as empty placeholders.
    pub fn decode<S: Source>(
        &self,
        data: impl Into<Bytes>,
        providers: &mut SuggestionProviderRegistry<S>,
    ) -> Result<CommandTree<S>> {
        self.check_version()?;

        let mut reader = PacketReader::new(data);
        let count = reader.read_length()?;
        let mut records = Vec::with_capacity(count.min(reader.remaining()));
        for index in 0..count {
            records.push(self.read_record(&mut reader, index)?);
        }
        validate(&records)?;

        let root_index = reader.read_var_int()?;
        let root_record = usize::try_from(root_index)
            .ok()
            .and_then(|index| records.get(index))
            .ok_or(CodecError::RootIndexNotRoot(root_index))?;
        if !matches!(root_record.payload, Payload::Root) {
            return Err(CodecError::RootIndexNotRoot(root_index));
        }
        if reader.has_remaining() {
            debug!(trailing = reader.remaining(), "ignoring bytes after root index");
        }

        let tree = link(records, providers)?;
        debug!(nodes = tree.len(), version = %self.version, "decoded command graph");
        Ok(tree)
    }

    fn read_record(&self, reader: &mut PacketReader, index: usize) -> Result<Record> {
        let bits = reader.read_u8()?;
        let child_count = reader.read_length()?;
        let mut children = Vec::with_capacity(child_count.min(reader.remaining()));
        for _ in 0..child_count {
            children.push(reader.read_var_int()?);
        }
        let redirect = if bits & flags::HAS_REDIRECT != 0 {
            Some(reader.read_var_int()?)
        } else {
            None
        };

        let payload = match bits & flags::KIND_MASK {
            flags::KIND_ROOT => Payload::Root,
            flags::KIND_LITERAL => Payload::Literal(reader.read_string()?),
            flags::KIND_ARGUMENT => {
                let name = reader.read_string()?;
                let ty = self.parsers.read_argument(reader, self.version)?;
                let suggestions = if bits & flags::HAS_SUGGESTIONS_TYPE != 0 {
                    Some(reader.read_string()?)
                } else {
                    None
                };
                Payload::Argument {
                    name,
                    ty,
                    suggestions,
                }
            }
            kind => return Err(CodecError::UnknownNodeKind { node: index, kind }),
        };

        Ok(Record {
            index,
            bits,
            children,
            redirect,
            payload,
            built: None,
            linked: false,
        })
    }
}

fn wire_index(index: usize) -> Result<i32> {
    i32::try_from(index).map_err(|_| CodecError::PacketTooLarge {
        size: index,
        limit: i32::MAX as usize,
    })
}

fn index_of(indices: &IndexSet<NodeId>, id: NodeId) -> Result<i32> {
    let index = indices
        .get_index_of(&id)
        .ok_or(CodecError::Graph(command_tree_core::GraphError::UnknownNode(id.index())))?;
    wire_index(index)
}

#[derive(Debug)]
enum Payload {
    Root,
    Literal(String),
    Argument {
        name: String,
        ty: ArgumentType,
        suggestions: Option<String>,
    },
}

impl Payload {
    fn name(&self) -> &str {
        match self {
            Self::Root => "",
            Self::Literal(name) | Self::Argument { name, .. } => name,
        }
    }
}

/// A decoded node that is not linked into the tree yet.
#[derive(Debug)]
struct Record {
    index: usize,
    bits: u8,
    children: Vec<i32>,
    redirect: Option<i32>,
    payload: Payload,
    built: Option<NodeId>,
    linked: bool,
}

/// Result of one build attempt on a record.
enum Step {
    Blocked,
    Progress,
    Done,
}

fn validate(records: &[Record]) -> Result<()> {
    let count = records.len();
    let check = |node: usize, index: i32| -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|index| *index < count)
            .ok_or(CodecError::IndexOutOfRange { node, index, count })
    };

    let mut root: Option<usize> = None;
    for record in records {
        if matches!(record.payload, Payload::Root) {
            if root.is_some() {
                return Err(CodecError::DuplicateRoot(record.index));
            }
            root = Some(record.index);
        }
        for child in &record.children {
            let child = check(record.index, *child)?;
            if matches!(records[child].payload, Payload::Root) {
                return Err(CodecError::RootAsChild {
                    parent: record.index,
                    child,
                });
            }
        }
        if let Some(redirect) = record.redirect {
            check(record.index, redirect)?;
        }
    }
    Ok(())
}

/// Builds records into a tree by repeated passes until nothing changes.
///
/// A non-root record builds once its redirect target is built; it links
/// once every child is built. A pass that makes no progress with records
/// left over means the graph has no anchor.
fn link<S: Source>(
    mut records: Vec<Record>,
    providers: &mut SuggestionProviderRegistry<S>,
) -> Result<CommandTree<S>> {
    let mut tree = CommandTree::new();
    let mut pending: Vec<usize> = (0..records.len()).collect();
    let mut passes = 0usize;

    while !pending.is_empty() {
        passes += 1;
        let mut progressed = false;
        let mut left = Vec::with_capacity(pending.len());
        for index in pending {
            match build_record(&mut records, index, &mut tree, providers)? {
                Step::Done => progressed = true,
                Step::Progress => {
                    progressed = true;
                    left.push(index);
                }
                Step::Blocked => left.push(index),
            }
        }
        trace!(pass = passes, left = left.len(), "command graph link pass");
        if !progressed {
            return Err(CodecError::UnresolvedNodes {
                remaining: left.len(),
            });
        }
        pending = left;
    }

    debug!(passes, "linked command graph");
    Ok(tree)
}

fn build_record<S: Source>(
    records: &mut [Record],
    index: usize,
    tree: &mut CommandTree<S>,
    providers: &mut SuggestionProviderRegistry<S>,
) -> Result<Step> {
    let mut progressed = false;

    if records[index].built.is_none() {
        let redirect = match records[index].redirect {
            Some(target) => match records[target as usize].built {
                Some(id) => Some(id),
                None => return Ok(Step::Blocked),
            },
            None => None,
        };

        let record = &records[index];
        let id = match &record.payload {
            Payload::Root => tree.root(),
            Payload::Literal(literal) => {
                let node = placeholder(CommandNode::literal(literal.as_str()), record.bits, redirect);
                tree.insert(node)
            }
            Payload::Argument {
                name,
                ty,
                suggestions,
            } => {
                let mut node = CommandNode::argument(name.as_str(), ty.clone());
                if let Some(provider) = suggestions {
                    node.set_suggestions(Some(providers.resolve(provider)));
                }
                tree.insert(placeholder(node, record.bits, redirect))
            }
        };
        records[index].built = Some(id);
        progressed = true;
    }

    if records[index].linked {
        return Ok(Step::Done);
    }

    let Some(children) = linkable_children(records, index) else {
        return Ok(if progressed { Step::Progress } else { Step::Blocked });
    };

    let Some(parent) = records[index].built else {
        return Ok(Step::Blocked);
    };
    for child in children {
        tree.add_child(parent, child)?;
    }
    records[index].linked = true;
    Ok(Step::Done)
}

/// Handles of the record's children, or `None` while any is not ready.
/// Children sharing a name are merged on link, so those must be linked
/// themselves before the parent.
fn linkable_children(records: &[Record], index: usize) -> Option<Vec<NodeId>> {
    let mut names = HashSet::new();
    let merged: HashSet<&str> = records[index]
        .children
        .iter()
        .map(|child| records[*child as usize].payload.name())
        .filter(|name| !names.insert(*name))
        .collect();

    records[index]
        .children
        .iter()
        .map(|child| {
            let record = &records[*child as usize];
            let ready = !merged.contains(record.payload.name()) || record.linked;
            record.built.filter(|_| ready)
        })
        .collect()
}

fn placeholder<S: Source>(
    mut node: CommandNode<S>,
    bits: u8,
    redirect: Option<NodeId>,
) -> CommandNode<S> {
    if bits & flags::EXECUTABLE != 0 {
        node.set_command(Some(Command::noop()));
    }
    if bits & flags::RESTRICTED != 0 {
        node.set_requirement(Some(Requirement::always()));
    }
    node.set_redirect(redirect);
    node
}
