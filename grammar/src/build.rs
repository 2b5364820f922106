//! Turning documents into dispatchers and graphs back into documents.

use std::collections::HashMap;

use command_tree_codec::SuggestionProviderRegistry;
use command_tree_core::{
    Command, CommandContext, CommandNode, CommandTree, Dispatcher, GraphError, NodeId,
    RedirectModifier, Requirement, Source,
};
use tracing::debug;

use crate::document::{ArgumentSpec, GrammarDocument, NodeSpec};
use crate::error::{GrammarError, Result};
use crate::source::PermissionHolder;
use crate::validate::validate_document;

struct PendingRedirect<'a> {
    node: NodeId,
    spec: &'a NodeSpec,
    target: &'a [String],
}

impl GrammarDocument {
    /// Builds a dispatcher from the document.
    ///
    /// Executors report the node's `result`. A `permission` becomes a
    /// requirement on the source's level. Suggestion names resolve through
    /// `providers`; unknown names get empty placeholders. Forks use an
    /// identity modifier.
    ///
    /// # Errors
    ///
    /// [`GrammarError::Invalid`] with every validation problem, or a graph
    /// error if a node cannot be linked.
    pub fn build<S>(&self, providers: &mut SuggestionProviderRegistry<S>) -> Result<Dispatcher<S>>
    where
        S: Source + PermissionHolder,
    {
        let errors = validate_document(self);
        if !errors.is_empty() {
            return Err(GrammarError::Invalid(errors));
        }

        let mut dispatcher = Dispatcher::new();
        let mut pending = Vec::new();
        let root = dispatcher.root();
        for command in &self.commands {
            insert_spec(dispatcher.tree_mut(), root, command, providers, &mut pending)?;
        }

        for redirect in pending {
            let target = dispatcher
                .find_node(redirect.target)
                .ok_or_else(|| GrammarError::UnresolvedRedirect {
                    node: redirect.spec.name.clone(),
                })?;
            let node = dispatcher
                .tree_mut()
                .get_mut(redirect.node)
                .ok_or(GraphError::UnknownNode(redirect.node.index()))?;
            node.set_redirect(Some(target));
            if redirect.spec.fork {
                node.set_modifier(Some(RedirectModifier::new(|ctx: &CommandContext<S>| {
                    Ok(vec![ctx.source().clone()])
                })));
                node.set_forks(true);
            }
        }

        debug!(
            commands = self.commands.len(),
            nodes = dispatcher.tree().len(),
            "built grammar"
        );
        Ok(dispatcher)
    }

    /// Exports the graph below the tree's root.
    ///
    /// Executable nodes are written with `executes: true` and restricted
    /// nodes with `permission: 0`; executor results and permission levels
    /// are not recoverable from a graph. Redirects are written as the first
    /// depth-first name path to their target.
    pub fn from_tree<S: Source>(
        tree: &CommandTree<S>,
        providers: &SuggestionProviderRegistry<S>,
    ) -> Result<Self> {
        let mut paths = HashMap::new();
        collect_paths(tree, tree.root(), &mut Vec::new(), &mut paths);

        let mut exporter = Exporter {
            tree,
            providers,
            paths,
            stack: Vec::new(),
        };
        let mut document = Self::new();
        for child in tree[tree.root()].children() {
            document.commands.push(exporter.export(child)?);
        }
        Ok(document)
    }

    pub fn from_dispatcher<S: Source>(
        dispatcher: &Dispatcher<S>,
        providers: &SuggestionProviderRegistry<S>,
    ) -> Result<Self> {
        Self::from_tree(dispatcher.tree(), providers)
    }
}

fn insert_spec<'a, S>(
    tree: &mut CommandTree<S>,
    parent: NodeId,
    spec: &'a NodeSpec,
    providers: &mut SuggestionProviderRegistry<S>,
    pending: &mut Vec<PendingRedirect<'a>>,
) -> Result<()>
where
    S: Source + PermissionHolder,
{
    let mut node = match &spec.argument {
        None => CommandNode::literal(spec.name.as_str()),
        Some(argument) => CommandNode::argument(spec.name.as_str(), argument.to_argument_type()),
    };
    if spec.executes {
        let result = spec.result;
        node.set_command(Some(Command::new(move |ctx: &CommandContext<S>| {
            debug!(input = ctx.input(), result, "command executed");
            Ok(result)
        })));
    }
    if let Some(level) = spec.permission {
        node.set_requirement(Some(Requirement::new(move |source: &S| {
            source.permission_level() >= level
        })));
    }
    if let Some(name) = &spec.suggestions {
        node.set_suggestions(Some(providers.resolve(name)));
    }

    let id = tree.insert(node);
    let id = tree.add_child(parent, id)?;
    if let Some(target) = &spec.redirect {
        pending.push(PendingRedirect {
            node: id,
            spec,
            target,
        });
    }
    for child in &spec.children {
        insert_spec(tree, id, child, providers, pending)?;
    }
    Ok(())
}

fn collect_paths<S: Source>(
    tree: &CommandTree<S>,
    node: NodeId,
    path: &mut Vec<String>,
    paths: &mut HashMap<NodeId, Vec<String>>,
) {
    if paths.contains_key(&node) {
        return;
    }
    paths.insert(node, path.clone());
    for child in tree[node].children() {
        path.push(tree[child].name().to_string());
        collect_paths(tree, child, path, paths);
        path.pop();
    }
}

struct Exporter<'a, S> {
    tree: &'a CommandTree<S>,
    providers: &'a SuggestionProviderRegistry<S>,
    paths: HashMap<NodeId, Vec<String>>,
    stack: Vec<NodeId>,
}

impl<S: Source> Exporter<'_, S> {
    fn location(&self, id: NodeId) -> String {
        self.stack
            .iter()
            .chain(std::iter::once(&id))
            .map(|node| self.tree[*node].name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn export(&mut self, id: NodeId) -> Result<NodeSpec> {
        if self.stack.contains(&id) {
            return Err(GrammarError::Cycle(self.location(id)));
        }
        let tree = self.tree;
        let node = &tree[id];

        let mut spec = match node.argument_type() {
            Some(ty) => NodeSpec::argument(node.name(), ArgumentSpec::from_argument_type(ty)),
            None => NodeSpec::literal(node.name()),
        };
        spec.executes = node.is_executable();
        if node.is_restricted() {
            spec.permission = Some(0);
        }
        if let Some(provider) = node.custom_suggestions() {
            spec.suggestions = Some(self.providers.wire_name(provider).to_string());
        }
        if let Some(target) = node.redirect() {
            let path = self
                .paths
                .get(&target)
                .ok_or_else(|| GrammarError::UnresolvedRedirect {
                    node: self.location(id),
                })?;
            spec.redirect = Some(path.clone());
            spec.fork = node.is_fork();
        }

        self.stack.push(id);
        for child in node.children() {
            let exported = self.export(child)?;
            spec.children.push(exported);
        }
        self.stack.pop();
        Ok(spec)
    }
}
