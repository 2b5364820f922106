//! Parsing, execution and completion over a [`CommandTree`].

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::builder::ArgumentBuilder;
use crate::callbacks::{ResultConsumer, Source, until_cancelled};
use crate::chain::ContextChain;
use crate::context::CommandContextBuilder;
use crate::error::{CommandError, CommandResult, CommandSyntaxError, GraphError, SyntaxErrorKind};
use crate::reader::StringReader;
use crate::suggestion::{Suggestions, SuggestionsBuilder};
use crate::tree::{CommandTree, NodeId};

/// Outcome of [`Dispatcher::parse`]: the best candidate parse, the reader
/// positioned where it stopped, and the errors of candidates that failed
/// at the point parsing stopped.
#[derive(Debug, Clone)]
pub struct ParseResults<S> {
    context: CommandContextBuilder<S>,
    reader: StringReader,
    exceptions: IndexMap<NodeId, CommandSyntaxError>,
}

impl<S: Source> ParseResults<S> {
    pub fn new(
        context: CommandContextBuilder<S>,
        reader: StringReader,
        exceptions: IndexMap<NodeId, CommandSyntaxError>,
    ) -> Self {
        Self {
            context,
            reader,
            exceptions,
        }
    }

    pub fn context(&self) -> &CommandContextBuilder<S> {
        &self.context
    }

    pub fn reader(&self) -> &StringReader {
        &self.reader
    }

    pub fn exceptions(&self) -> &IndexMap<NodeId, CommandSyntaxError> {
        &self.exceptions
    }

    /// True when input is left over after the best parse.
    pub fn has_remaining(&self) -> bool {
        self.reader.can_read()
    }
}

/// Candidates that consumed all input win, then candidates without
/// errors. Ties keep registration order.
fn compare_candidates<S>(a: &ParseResults<S>, b: &ParseResults<S>) -> Ordering {
    let a_remaining = a.reader.can_read();
    let b_remaining = b.reader.can_read();
    match (a_remaining, b_remaining) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }
    match (a.exceptions.is_empty(), b.exceptions.is_empty()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Entry point for registering, parsing, executing and completing
/// commands for sources of type `S`.
#[derive(Debug)]
pub struct Dispatcher<S> {
    tree: CommandTree<S>,
    consumer: Option<ResultConsumer<S>>,
}

impl<S: Source> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Source> Dispatcher<S> {
    pub fn new() -> Self {
        Self::from_tree(CommandTree::new())
    }

    /// Wraps an existing graph, e.g. one decoded from the wire.
    pub fn from_tree(tree: CommandTree<S>) -> Self {
        Self {
            tree,
            consumer: None,
        }
    }

    pub fn tree(&self) -> &CommandTree<S> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CommandTree<S> {
        &mut self.tree
    }

    pub fn into_tree(self) -> CommandTree<S> {
        self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Observer notified after each execution.
    pub fn set_consumer(&mut self, consumer: ResultConsumer<S>) {
        self.consumer = Some(consumer);
    }

    /// Attaches an already-built node under the root, merging with any
    /// existing child of the same name.
    pub fn add(&mut self, node: NodeId) -> Result<NodeId, GraphError> {
        let root = self.tree.root();
        self.tree.add_child(root, node)
    }

    /// Builds `builder` and attaches it under the root. Returns the node
    /// now registered under that name.
    pub fn register(&mut self, builder: ArgumentBuilder<S>) -> Result<NodeId, GraphError> {
        let name = builder.name().to_string();
        let node = self.tree.build(builder)?;
        let registered = self.add(node)?;
        debug!(command = %name, node = %registered, "registered command");
        Ok(registered)
    }

    /// Whether `source` passes the requirement of `node`.
    pub async fn can_use(
        &self,
        node: NodeId,
        source: &S,
        cancel: &CancellationToken,
    ) -> CommandResult<bool> {
        match self.tree[node].requirement() {
            None => Ok(true),
            Some(requirement) => {
                let check = requirement.check(source.clone(), cancel.clone());
                until_cancelled(cancel, check).await
            }
        }
    }

    /// Parses `input` for `source`, exploring every viable branch and
    /// keeping the best one.
    pub async fn parse(
        &self,
        input: impl Into<Arc<str>>,
        source: S,
        cancel: &CancellationToken,
    ) -> CommandResult<ParseResults<S>> {
        self.parse_reader(StringReader::new(input), source, cancel).await
    }

    pub async fn parse_reader(
        &self,
        reader: StringReader,
        source: S,
        cancel: &CancellationToken,
    ) -> CommandResult<ParseResults<S>> {
        let root = self.tree.root();
        let context = CommandContextBuilder::new(source, root, reader.cursor());
        let parse = self.parse_nodes(root, reader, context, cancel).await?;
        trace!(
            consumed = parse.reader.cursor(),
            errors = parse.exceptions.len(),
            "parsed command input"
        );
        Ok(parse)
    }

    fn parse_nodes<'a>(
        &'a self,
        node: NodeId,
        original: StringReader,
        context_so_far: CommandContextBuilder<S>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandResult<ParseResults<S>>> {
        async move {
            if cancel.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            let source = context_so_far.source().clone();
            let mut errors = IndexMap::new();
            let mut potentials: Vec<ParseResults<S>> = Vec::new();

            for child in self.tree[node].relevant_nodes(&original) {
                if !self.can_use(child, &source, cancel).await? {
                    continue;
                }
                let mut context = context_so_far.clone();
                let mut reader = original.clone();

                let matched = self
                    .tree
                    .parse_node(child, &mut reader, &mut context)
                    .and_then(|()| {
                        if reader.can_read() && reader.peek() != Some(' ') {
                            Err(CommandSyntaxError::with_context(
                                SyntaxErrorKind::ExpectedArgumentSeparator,
                                &reader,
                            ))
                        } else {
                            Ok(())
                        }
                    });
                if let Err(err) = matched {
                    trace!(node = %child, error = %err, "candidate rejected");
                    errors.insert(child, err);
                    continue;
                }

                let child_node = &self.tree[child];
                context.with_command(child_node.command().cloned());
                let redirect = child_node.redirect();
                if reader.can_read_length(if redirect.is_none() { 2 } else { 1 }) {
                    reader.skip();
                    if let Some(target) = redirect {
                        let child_context =
                            CommandContextBuilder::new(source.clone(), target, reader.cursor());
                        let parse = self
                            .parse_nodes(target, reader, child_context, cancel)
                            .await?;
                        context.with_child(parse.context);
                        return Ok(ParseResults::new(context, parse.reader, parse.exceptions));
                    }
                    potentials.push(self.parse_nodes(child, reader, context, cancel).await?);
                } else {
                    potentials.push(ParseResults::new(context, reader, IndexMap::new()));
                }
            }

            potentials.sort_by(compare_candidates);
            match potentials.into_iter().next() {
                Some(best) => Ok(best),
                None => Ok(ParseResults::new(context_so_far, original, errors)),
            }
        }
        .boxed()
    }

    /// Executes a parse. Leftover input is reported as the single recorded
    /// candidate error, or as an unknown command or argument.
    pub async fn execute(
        &self,
        parse: ParseResults<S>,
        cancel: &CancellationToken,
    ) -> CommandResult<i32> {
        if parse.reader.can_read() {
            let err = if parse.exceptions.len() == 1 {
                parse.exceptions.values().next().cloned().unwrap_or_else(|| {
                    CommandSyntaxError::with_context(SyntaxErrorKind::UnknownArgument, &parse.reader)
                })
            } else if parse.context.range().is_empty() {
                CommandSyntaxError::with_context(SyntaxErrorKind::UnknownCommand, &parse.reader)
            } else {
                CommandSyntaxError::with_context(SyntaxErrorKind::UnknownArgument, &parse.reader)
            };
            debug!(input = parse.reader.string(), error = %err, "command did not parse");
            return Err(err.into());
        }

        let original = parse.context.build(parse.reader.string());
        let Some(chain) = ContextChain::try_flatten(&original) else {
            if let Some(consumer) = &self.consumer {
                consumer.on_command_complete(&original, false, 0);
            }
            debug!(input = parse.reader.string(), "no executor at end of input");
            let err =
                CommandSyntaxError::with_context(SyntaxErrorKind::UnknownCommand, &parse.reader);
            return Err(err.into());
        };

        let result = chain
            .execute_all(original.source().clone(), self.consumer.as_ref(), cancel)
            .await?;
        if let Some(consumer) = &self.consumer {
            consumer.on_command_complete(&original, true, result);
        }
        debug!(input = parse.reader.string(), result, "executed command");
        Ok(result)
    }

    /// Parses and executes `input` in one step.
    pub async fn execute_input(
        &self,
        input: impl Into<Arc<str>>,
        source: S,
        cancel: &CancellationToken,
    ) -> CommandResult<i32> {
        let parse = self.parse(input, source, cancel).await?;
        self.execute(parse, cancel).await
    }

    /// Completion candidates at `cursor` (end of input when `None`).
    ///
    /// Every child of the node before the cursor is asked concurrently;
    /// children failing their requirement or raising a syntax error
    /// contribute nothing.
    pub async fn suggest(
        &self,
        parse: &ParseResults<S>,
        cursor: Option<usize>,
        cancel: &CancellationToken,
    ) -> CommandResult<Suggestions> {
        let full = parse.reader.string();
        let mut cursor = cursor.unwrap_or(full.len()).min(full.len());
        while !full.is_char_boundary(cursor) {
            cursor -= 1;
        }

        let Some(found) = parse.context.find_suggestion_context(cursor) else {
            return Ok(Suggestions::empty());
        };
        let start = found.start.min(cursor);
        let truncated = &full[..cursor];
        let context = parse.context.build(truncated);
        let source = parse.context.source();

        let requests = self.tree[found.parent].children().map(move |child| {
            let builder = SuggestionsBuilder::new(truncated, start);
            let context = context.clone();
            async move {
                if !self.can_use(child, source, cancel).await? {
                    return Ok(Suggestions::empty());
                }
                let pending = self.tree[child].list_suggestions(context, builder, cancel.clone());
                match until_cancelled(cancel, pending).await? {
                    Ok(suggestions) => Ok(suggestions),
                    Err(CommandError::Cancelled) => Err(CommandError::Cancelled),
                    Err(CommandError::Syntax(err)) => {
                        debug!(node = %child, error = %err, "suggestion provider failed");
                        Ok(Suggestions::empty())
                    }
                }
            }
        });

        let results = join_all(requests)
            .await
            .into_iter()
            .collect::<CommandResult<Vec<Suggestions>>>()?;
        Ok(Suggestions::merge(full, results))
    }

    /// Parses `input` and completes at its end.
    pub async fn suggest_input(
        &self,
        input: impl Into<Arc<str>>,
        source: S,
        cancel: &CancellationToken,
    ) -> CommandResult<Suggestions> {
        let parse = self.parse(input, source, cancel).await?;
        self.suggest(&parse, None, cancel).await
    }

    /// Follows `path` from the root by child name.
    pub fn find_node<I, T>(&self, path: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut node = self.tree.root();
        for name in path {
            node = self.tree[node].child(name.as_ref())?;
        }
        Some(node)
    }

    /// Names along the first depth-first path from the root to `target`.
    /// Empty for the root and for nodes not reachable through children.
    pub fn get_path(&self, target: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.find_path(self.tree.root(), target, &mut path, &mut visited) {
            path.iter().map(|id| self.tree[*id].name().to_string()).collect()
        } else {
            Vec::new()
        }
    }

    fn find_path(
        &self,
        node: NodeId,
        target: NodeId,
        path: &mut Vec<NodeId>,
        visited: &mut HashSet<NodeId>,
    ) -> bool {
        if node == target {
            return true;
        }
        if !visited.insert(node) {
            return false;
        }
        for child in self.tree[node].children() {
            path.push(child);
            if self.find_path(child, target, path, visited) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// See [`CommandTree::find_ambiguities`].
    pub fn find_ambiguities<F>(&self, consumer: F)
    where
        F: FnMut(NodeId, NodeId, NodeId, &[String]),
    {
        self.tree.find_ambiguities(consumer);
    }
}
