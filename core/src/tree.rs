//! The command graph.
//!
//! Nodes live in an arena owned by [`CommandTree`] and refer to each other
//! through [`NodeId`] handles. Children form a tree below the root, while
//! redirects may point anywhere, including back at the root, so the
//! overall structure can contain cycles.

use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::arguments::{ArgumentType, ParsedArgument};
use crate::callbacks::{Command, RedirectModifier, Requirement, Source, SuggestionProvider};
use crate::context::{CommandContext, CommandContextBuilder};
use crate::error::{CommandResult, CommandSyntaxError, GraphError, SyntaxErrorKind};
use crate::range::StringRange;
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Handle to a node inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Every tree stores its root first.
    pub const ROOT: NodeId = NodeId(0);

    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node matches.
#[derive(Clone)]
pub enum NodeKind<S> {
    Root,
    Literal(String),
    Argument {
        name: String,
        ty: ArgumentType,
        suggestions: Option<SuggestionProvider<S>>,
    },
}

impl<S> fmt::Debug for NodeKind<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Literal(literal) => f.debug_tuple("Literal").field(literal).finish(),
            Self::Argument {
                name,
                ty,
                suggestions,
            } => f
                .debug_struct("Argument")
                .field("name", name)
                .field("ty", ty)
                .field("suggestions", suggestions)
                .finish(),
        }
    }
}

/// A single vertex of the command graph.
#[derive(Clone)]
pub struct CommandNode<S> {
    kind: NodeKind<S>,
    children: IndexMap<String, NodeId>,
    literals: IndexMap<String, NodeId>,
    arguments: IndexMap<String, NodeId>,
    command: Option<Command<S>>,
    requirement: Option<Requirement<S>>,
    redirect: Option<NodeId>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S> fmt::Debug for CommandNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("executable", &self.command.is_some())
            .field("restricted", &self.requirement.is_some())
            .field("redirect", &self.redirect)
            .field("forks", &self.forks)
            .finish()
    }
}

impl<S: Source> CommandNode<S> {
    fn with_kind(kind: NodeKind<S>) -> Self {
        Self {
            kind,
            children: IndexMap::new(),
            literals: IndexMap::new(),
            arguments: IndexMap::new(),
            command: None,
            requirement: None,
            redirect: None,
            modifier: None,
            forks: false,
        }
    }

    pub fn root() -> Self {
        Self::with_kind(NodeKind::Root)
    }

    pub fn literal(literal: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Literal(literal.into()))
    }

    pub fn argument(name: impl Into<String>, ty: ArgumentType) -> Self {
        Self::with_kind(NodeKind::Argument {
            name: name.into(),
            ty,
            suggestions: None,
        })
    }

    pub fn kind(&self) -> &NodeKind<S> {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Key under which the node is stored in its parent.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Root => "",
            NodeKind::Literal(literal) => literal,
            NodeKind::Argument { name, .. } => name,
        }
    }

    /// How the node appears in usage strings.
    pub fn usage_text(&self) -> String {
        match &self.kind {
            NodeKind::Root => String::new(),
            NodeKind::Literal(literal) => literal.clone(),
            NodeKind::Argument { name, .. } => format!("<{name}>"),
        }
    }

    pub fn argument_type(&self) -> Option<&ArgumentType> {
        match &self.kind {
            NodeKind::Argument { ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub fn custom_suggestions(&self) -> Option<&SuggestionProvider<S>> {
        match &self.kind {
            NodeKind::Argument { suggestions, .. } => suggestions.as_ref(),
            _ => None,
        }
    }

    /// Children in registration order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn is_executable(&self) -> bool {
        self.command.is_some()
    }

    pub fn requirement(&self) -> Option<&Requirement<S>> {
        self.requirement.as_ref()
    }

    /// A node is restricted exactly when it carries a requirement.
    pub fn is_restricted(&self) -> bool {
        self.requirement.is_some()
    }

    pub fn redirect(&self) -> Option<NodeId> {
        self.redirect
    }

    pub fn modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    pub fn is_fork(&self) -> bool {
        self.forks
    }

    pub fn set_command(&mut self, command: Option<Command<S>>) {
        self.command = command;
    }

    pub fn set_requirement(&mut self, requirement: Option<Requirement<S>>) {
        self.requirement = requirement;
    }

    pub fn set_redirect(&mut self, redirect: Option<NodeId>) {
        self.redirect = redirect;
    }

    pub fn set_modifier(&mut self, modifier: Option<RedirectModifier<S>>) {
        self.modifier = modifier;
    }

    pub fn set_forks(&mut self, forks: bool) {
        self.forks = forks;
    }

    /// Replaces the custom suggestion provider. Ignored on non-arguments.
    pub fn set_suggestions(&mut self, provider: Option<SuggestionProvider<S>>) {
        if let NodeKind::Argument { suggestions, .. } = &mut self.kind {
            *suggestions = provider;
        }
    }

    /// Children worth trying for the next token: the literal that matches
    /// it exactly, or failing that every argument child.
    pub fn relevant_nodes(&self, reader: &StringReader) -> Vec<NodeId> {
        if !self.literals.is_empty() {
            let token = reader.remaining().split(' ').next().unwrap_or("");
            if let Some(&literal) = self.literals.get(token) {
                return vec![literal];
            }
        }
        self.arguments.values().copied().collect()
    }

    /// Whether `input` on its own would be accepted by this node.
    pub fn is_valid_input(&self, input: &str) -> bool {
        let mut reader = StringReader::new(input);
        match &self.kind {
            NodeKind::Root => false,
            NodeKind::Literal(literal) => match_literal(literal, &mut reader).is_some(),
            NodeKind::Argument { ty, .. } => {
                ty.parse(&mut reader).is_ok() && (!reader.can_read() || reader.peek() == Some(' '))
            }
        }
    }

    /// Sample inputs for ambiguity detection.
    pub fn examples(&self) -> Vec<String> {
        match &self.kind {
            NodeKind::Root => Vec::new(),
            NodeKind::Literal(literal) => vec![literal.clone()],
            NodeKind::Argument { ty, .. } => ty.examples().iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Suggestions this node offers for the text in `builder`.
    pub fn list_suggestions(
        &self,
        ctx: CommandContext<S>,
        mut builder: SuggestionsBuilder,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, CommandResult<Suggestions>> {
        match &self.kind {
            NodeKind::Root => future::ready(Ok(Suggestions::empty())).boxed(),
            NodeKind::Literal(literal) => {
                if literal.to_lowercase().starts_with(builder.remaining_lowercase()) {
                    builder.suggest(literal.clone());
                    future::ready(Ok(builder.build())).boxed()
                } else {
                    future::ready(Ok(Suggestions::empty())).boxed()
                }
            }
            NodeKind::Argument {
                suggestions: Some(provider),
                ..
            } => provider.provide(ctx, builder, cancel),
            NodeKind::Argument { ty, .. } => future::ready(Ok(ty.list_suggestions(builder))).boxed(),
        }
    }
}

/// Consumes `literal` plus nothing else from the current token, returning
/// the end offset. The reader is left untouched on mismatch.
fn match_literal(literal: &str, reader: &mut StringReader) -> Option<usize> {
    let start = reader.cursor();
    if reader.remaining().starts_with(literal) {
        let end = start + literal.len();
        reader.set_cursor(end);
        if !reader.can_read() || reader.peek() == Some(' ') {
            return Some(end);
        }
        reader.set_cursor(start);
    }
    None
}

/// Arena of command nodes with the root at [`NodeId::ROOT`].
#[derive(Debug, Clone)]
pub struct CommandTree<S> {
    nodes: Vec<CommandNode<S>>,
}

impl<S: Source> Default for CommandTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Source> CommandTree<S> {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::root()],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode<S>> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut CommandNode<S>> {
        self.nodes.get_mut(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id.0))
        }
    }

    /// Stores a detached node and returns its handle.
    pub fn insert(&mut self, node: CommandNode<S>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Attaches `child` below `parent`.
    ///
    /// If `parent` already has a child with the same name, the two are
    /// merged: the newcomer's executor (if any) replaces the existing one
    /// and its children are added recursively to the existing node, whose
    /// handle is returned. Attaching the same handle twice is a no-op.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, GraphError> {
        self.check(parent)?;
        self.check(child)?;
        if self.nodes[child.0].is_root() {
            return Err(GraphError::RootAsChild);
        }

        let name = self.nodes[child.0].name().to_string();
        if let Some(existing) = self.nodes[parent.0].child(&name) {
            if existing == child {
                return Ok(existing);
            }
            if let Some(command) = self.nodes[child.0].command.clone() {
                self.nodes[existing.0].command = Some(command);
            }
            let grandchildren: Vec<NodeId> = self.nodes[child.0].children().collect();
            for grandchild in grandchildren {
                self.add_child(existing, grandchild)?;
            }
            return Ok(existing);
        }

        let is_literal = matches!(self.nodes[child.0].kind, NodeKind::Literal(_));
        let node = &mut self.nodes[parent.0];
        node.children.insert(name.clone(), child);
        if is_literal {
            node.literals.insert(name, child);
        } else {
            node.arguments.insert(name, child);
        }
        Ok(child)
    }

    /// Matches node `id` against the reader, recording the result in
    /// `context`. On failure the reader is left where the match started.
    pub fn parse_node(
        &self,
        id: NodeId,
        reader: &mut StringReader,
        context: &mut CommandContextBuilder<S>,
    ) -> Result<(), CommandSyntaxError> {
        let node = &self[id];
        let start = reader.cursor();
        match &node.kind {
            NodeKind::Root => Ok(()),
            NodeKind::Literal(literal) => match match_literal(literal, reader) {
                Some(end) => {
                    context.with_node(id, node, StringRange::new(start, end));
                    Ok(())
                }
                None => Err(CommandSyntaxError::with_context(
                    SyntaxErrorKind::LiteralIncorrect(literal.clone()),
                    reader,
                )),
            },
            NodeKind::Argument { name, ty, .. } => {
                let value = ty.parse(reader).map_err(|err| {
                    if err.cursor().is_some() {
                        err
                    } else {
                        CommandSyntaxError::with_context(
                            SyntaxErrorKind::ParseException(err.message()),
                            reader,
                        )
                    }
                })?;
                let range = StringRange::new(start, reader.cursor());
                context.with_argument(name.clone(), ParsedArgument { range, value });
                context.with_node(id, node, range);
                Ok(())
            }
        }
    }

    /// Reports every pair of sibling nodes where one sibling's example
    /// inputs are also accepted by the other, as
    /// `(parent, child, sibling, inputs)`.
    pub fn find_ambiguities<F>(&self, mut consumer: F)
    where
        F: FnMut(NodeId, NodeId, NodeId, &[String]),
    {
        let mut visited = HashSet::new();
        self.collect_ambiguities(self.root(), &mut consumer, &mut visited);
    }

    fn collect_ambiguities<F>(&self, parent: NodeId, consumer: &mut F, visited: &mut HashSet<NodeId>)
    where
        F: FnMut(NodeId, NodeId, NodeId, &[String]),
    {
        if !visited.insert(parent) {
            return;
        }
        let node = &self[parent];
        for child in node.children() {
            for sibling in node.children() {
                if child == sibling {
                    continue;
                }
                let matches: Vec<String> = self[child]
                    .examples()
                    .into_iter()
                    .filter(|input| self[sibling].is_valid_input(input))
                    .collect();
                if !matches.is_empty() {
                    consumer(parent, child, sibling, &matches);
                }
            }
            self.collect_ambiguities(child, consumer, visited);
        }
    }
}

impl<S> Index<NodeId> for CommandTree<S> {
    type Output = CommandNode<S>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(children: &[CommandNode<()>]) -> (CommandTree<()>, Vec<NodeId>) {
        let mut tree = CommandTree::new();
        let ids = children
            .iter()
            .map(|node| {
                let id = tree.insert(node.clone());
                tree.add_child(NodeId::ROOT, id).unwrap()
            })
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_root_cannot_be_a_child() {
        let mut tree: CommandTree<()> = CommandTree::new();
        let literal = tree.insert(CommandNode::literal("a"));
        assert_eq!(tree.add_child(literal, NodeId::ROOT), Err(GraphError::RootAsChild));
    }

    #[test]
    fn test_duplicate_name_merges_children_and_command() {
        let mut tree: CommandTree<()> = CommandTree::new();
        let first = tree.insert(CommandNode::literal("tp"));
        let here = tree.insert(CommandNode::literal("here"));
        tree.add_child(first, here).unwrap();
        tree.add_child(NodeId::ROOT, first).unwrap();

        let mut second_node = CommandNode::literal("tp");
        second_node.set_command(Some(Command::new(|_| Ok(7))));
        let second = tree.insert(second_node);
        let there = tree.insert(CommandNode::literal("there"));
        tree.add_child(second, there).unwrap();

        let merged = tree.add_child(NodeId::ROOT, second).unwrap();
        assert_eq!(merged, first);
        assert_eq!(tree[NodeId::ROOT].children().len(), 1);
        assert!(tree[first].is_executable());
        let names: Vec<&str> = tree[first].children().map(|id| tree[id].name()).collect();
        assert_eq!(names, vec!["here", "there"]);
    }

    #[test]
    fn test_add_same_child_twice_is_idempotent() {
        let mut tree: CommandTree<()> = CommandTree::new();
        let a = tree.insert(CommandNode::literal("a"));
        tree.add_child(NodeId::ROOT, a).unwrap();
        tree.add_child(NodeId::ROOT, a).unwrap();
        assert_eq!(tree[NodeId::ROOT].children().len(), 1);
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let mut tree: CommandTree<()> = CommandTree::new();
        assert_eq!(
            tree.add_child(NodeId::ROOT, NodeId::from_index(9)),
            Err(GraphError::UnknownNode(9))
        );
    }

    #[test]
    fn test_relevant_nodes_prefers_exact_literal() {
        let (tree, ids) = tree_with(&[
            CommandNode::literal("here"),
            CommandNode::argument("target", ArgumentType::word()),
        ]);
        let root = &tree[NodeId::ROOT];

        assert_eq!(root.relevant_nodes(&StringReader::new("here now")), vec![ids[0]]);
        assert_eq!(root.relevant_nodes(&StringReader::new("Steve")), vec![ids[1]]);
        assert_eq!(root.relevant_nodes(&StringReader::new("hereafter")), vec![ids[1]]);
    }

    #[test]
    fn test_usage_text() {
        let literal: CommandNode<()> = CommandNode::literal("give");
        let argument: CommandNode<()> = CommandNode::argument("count", ArgumentType::integer());
        assert_eq!(literal.usage_text(), "give");
        assert_eq!(argument.usage_text(), "<count>");
    }

    #[test]
    fn test_literal_parse_requires_token_boundary() {
        let (tree, ids) = tree_with(&[CommandNode::literal("foo")]);
        let mut context = CommandContextBuilder::new((), NodeId::ROOT, 0);

        let mut reader = StringReader::new("foobar");
        let err = tree.parse_node(ids[0], &mut reader, &mut context).unwrap_err();
        assert_eq!(err.kind(), &SyntaxErrorKind::LiteralIncorrect("foo".to_string()));
        assert_eq!(reader.cursor(), 0);

        let mut reader = StringReader::new("foo bar");
        tree.parse_node(ids[0], &mut reader, &mut context).unwrap();
        assert_eq!(reader.cursor(), 3);
        assert_eq!(context.range(), StringRange::new(0, 3));
    }

    #[test]
    fn test_find_ambiguities_reports_overlapping_siblings() {
        let (tree, ids) = tree_with(&[
            CommandNode::literal("123"),
            CommandNode::argument("number", ArgumentType::integer()),
            CommandNode::literal("word"),
        ]);

        let mut found = Vec::new();
        tree.find_ambiguities(|parent, child, sibling, inputs| {
            found.push((parent, child, sibling, inputs.to_vec()));
        });

        assert!(found.contains(&(NodeId::ROOT, ids[0], ids[1], vec!["123".to_string()])));
        assert!(found.iter().all(|(_, child, _, _)| *child != ids[2]));
    }
}
