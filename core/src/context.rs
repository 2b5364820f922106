//! Parse state and the immutable context handed to executors.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::arguments::{ArgumentValue, ParsedArgument};
use crate::callbacks::{Command, RedirectModifier, Source};
use crate::error::{CommandSyntaxError, SyntaxErrorKind};
use crate::range::StringRange;
use crate::tree::{CommandNode, NodeId};

/// A node matched during parsing and the input span it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommandNode {
    node: NodeId,
    range: StringRange,
}

impl ParsedCommandNode {
    pub fn new(node: NodeId, range: StringRange) -> Self {
        Self { node, range }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn range(&self) -> StringRange {
        self.range
    }
}

/// Where completion should look: the node whose children are candidates,
/// and the input offset the candidates replace from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionContext {
    pub parent: NodeId,
    pub start: usize,
}

/// Mutable accumulator filled in while parsing. Each redirect starts a
/// child builder rooted at the redirect target.
#[derive(Debug, Clone)]
pub struct CommandContextBuilder<S> {
    source: S,
    root: NodeId,
    command: Option<Command<S>>,
    child: Option<Box<CommandContextBuilder<S>>>,
    nodes: Vec<ParsedCommandNode>,
    arguments: IndexMap<String, ParsedArgument>,
    range: StringRange,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: Source> CommandContextBuilder<S> {
    pub fn new(source: S, root: NodeId, start: usize) -> Self {
        Self {
            source,
            root,
            command: None,
            child: None,
            nodes: Vec::new(),
            arguments: IndexMap::new(),
            range: StringRange::at(start),
            modifier: None,
            forks: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    pub fn arguments(&self) -> &IndexMap<String, ParsedArgument> {
        &self.arguments
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn child(&self) -> Option<&CommandContextBuilder<S>> {
        self.child.as_deref()
    }

    /// The innermost builder in the redirect chain.
    pub fn last_child(&self) -> &CommandContextBuilder<S> {
        let mut current = self;
        while let Some(child) = current.child() {
            current = child;
        }
        current
    }

    pub fn with_source(mut self, source: S) -> Self {
        self.source = source;
        self
    }

    pub fn with_argument(&mut self, name: impl Into<String>, argument: ParsedArgument) {
        self.arguments.insert(name.into(), argument);
    }

    pub fn with_command(&mut self, command: Option<Command<S>>) {
        self.command = command;
    }

    /// Records a matched node, widening the range and taking over the
    /// node's redirect modifier and fork flag.
    pub fn with_node(&mut self, id: NodeId, node: &CommandNode<S>, range: StringRange) {
        self.nodes.push(ParsedCommandNode::new(id, range));
        self.range = StringRange::encompassing(self.range, range);
        self.modifier = node.modifier().cloned();
        self.forks = node.is_fork();
    }

    pub fn with_child(&mut self, child: CommandContextBuilder<S>) {
        self.child = Some(Box::new(child));
    }

    /// Freezes the builder against `input`.
    pub fn build(&self, input: &str) -> CommandContext<S> {
        self.build_shared(&Arc::from(input))
    }

    fn build_shared(&self, input: &Arc<str>) -> CommandContext<S> {
        CommandContext {
            source: self.source.clone(),
            input: Arc::clone(input),
            arguments: Arc::new(self.arguments.clone()),
            command: self.command.clone(),
            root: self.root,
            nodes: Arc::from(self.nodes.as_slice()),
            range: self.range,
            child: self
                .child
                .as_ref()
                .map(|child| Arc::new(child.build_shared(input))),
            modifier: self.modifier.clone(),
            forks: self.forks,
        }
    }

    /// Locates the node whose children should be offered at `cursor`.
    /// Returns `None` when the cursor lies before this context.
    pub fn find_suggestion_context(&self, cursor: usize) -> Option<SuggestionContext> {
        if self.range.start() > cursor {
            return None;
        }

        if self.range.end() < cursor {
            if let Some(child) = &self.child {
                return child.find_suggestion_context(cursor);
            }
            if let Some(last) = self.nodes.last() {
                return Some(SuggestionContext {
                    parent: last.node(),
                    start: last.range().end() + 1,
                });
            }
            return Some(SuggestionContext {
                parent: self.root,
                start: self.range.start(),
            });
        }

        let mut prev = self.root;
        for parsed in &self.nodes {
            let range = parsed.range();
            if range.start() <= cursor && cursor <= range.end() {
                return Some(SuggestionContext {
                    parent: prev,
                    start: range.start(),
                });
            }
            prev = parsed.node();
        }
        Some(SuggestionContext {
            parent: prev,
            start: self.range.start(),
        })
    }
}

/// Everything an executor needs to know about the parsed input.
///
/// Cheap to clone; argument maps and node lists are shared.
#[derive(Debug, Clone)]
pub struct CommandContext<S> {
    source: S,
    input: Arc<str>,
    arguments: Arc<IndexMap<String, ParsedArgument>>,
    command: Option<Command<S>>,
    root: NodeId,
    nodes: Arc<[ParsedCommandNode]>,
    range: StringRange,
    child: Option<Arc<CommandContext<S>>>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

impl<S: Source> CommandContext<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    pub fn root_node(&self) -> NodeId {
        self.root
    }

    pub fn nodes(&self) -> &[ParsedCommandNode] {
        &self.nodes
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn child(&self) -> Option<&CommandContext<S>> {
        self.child.as_deref()
    }

    pub fn last_child(&self) -> &CommandContext<S> {
        let mut current = self;
        while let Some(child) = current.child() {
            current = child;
        }
        current
    }

    pub fn redirect_modifier(&self) -> Option<&RedirectModifier<S>> {
        self.modifier.as_ref()
    }

    pub fn is_forked(&self) -> bool {
        self.forks
    }

    /// The same context seen from a different source.
    pub fn copy_for(&self, source: S) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    pub fn arguments(&self) -> impl Iterator<Item = (&str, &ParsedArgument)> {
        self.arguments.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    pub fn argument(&self, name: &str) -> Result<&ArgumentValue, CommandSyntaxError> {
        self.arguments
            .get(name)
            .map(|parsed| &parsed.value)
            .ok_or_else(|| {
                let available = self
                    .arguments
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                CommandSyntaxError::new(SyntaxErrorKind::NoSuchArgument {
                    name: name.to_string(),
                    available,
                })
            })
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        extract: impl FnOnce(&'a ArgumentValue) -> Option<T>,
    ) -> Result<T, CommandSyntaxError> {
        let value = self.argument(name)?;
        extract(value).ok_or_else(|| {
            CommandSyntaxError::new(SyntaxErrorKind::ArgumentTypeMismatch {
                name: name.to_string(),
                expected,
                found: value.type_name(),
            })
        })
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, CommandSyntaxError> {
        self.typed(name, "bool", |v| match v {
            ArgumentValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn get_integer(&self, name: &str) -> Result<i32, CommandSyntaxError> {
        self.typed(name, "integer", |v| match v {
            ArgumentValue::Integer(i) => Some(*i),
            _ => None,
        })
    }

    pub fn get_long(&self, name: &str) -> Result<i64, CommandSyntaxError> {
        self.typed(name, "long", |v| match v {
            ArgumentValue::Long(l) => Some(*l),
            _ => None,
        })
    }

    pub fn get_float(&self, name: &str) -> Result<f32, CommandSyntaxError> {
        self.typed(name, "float", |v| match v {
            ArgumentValue::Float(f) => Some(*f),
            _ => None,
        })
    }

    pub fn get_double(&self, name: &str) -> Result<f64, CommandSyntaxError> {
        self.typed(name, "double", |v| match v {
            ArgumentValue::Double(d) => Some(*d),
            _ => None,
        })
    }

    /// String arguments, and the raw token of passthrough arguments.
    pub fn get_string(&self, name: &str) -> Result<&str, CommandSyntaxError> {
        self.typed(name, "string", |v| match v {
            ArgumentValue::String(s) | ArgumentValue::Raw(s) => Some(s.as_str()),
            _ => None,
        })
    }
}
