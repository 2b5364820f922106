//! Fluent construction of command nodes.
//!
//! ```
//! use command_tree_core::{argument, literal, ArgumentType, Dispatcher};
//!
//! let mut dispatcher: Dispatcher<()> = Dispatcher::new();
//! dispatcher
//!     .register(
//!         literal("give").then(
//!             argument("count", ArgumentType::integer_between(1, 64))
//!                 .executes(|ctx| Ok(ctx.get_integer("count")?)),
//!         ),
//!     )
//!     .unwrap();
//! ```

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::arguments::ArgumentType;
use crate::callbacks::{Command, RedirectModifier, Requirement, Source, SuggestionProvider};
use crate::context::CommandContext;
use crate::error::{CommandResult, GraphError};
use crate::tree::{CommandNode, CommandTree, NodeId};

enum BuilderKind {
    Literal(String),
    Argument { name: String, ty: ArgumentType },
}

enum BuilderChild<S> {
    Builder(ArgumentBuilder<S>),
    Node(NodeId),
}

/// Describes a literal or argument node and its subtree before it is
/// placed into a [`CommandTree`].
pub struct ArgumentBuilder<S> {
    kind: BuilderKind,
    children: Vec<BuilderChild<S>>,
    command: Option<Command<S>>,
    requirement: Option<Requirement<S>>,
    suggestions: Option<SuggestionProvider<S>>,
    target: Option<NodeId>,
    modifier: Option<RedirectModifier<S>>,
    forks: bool,
}

/// Starts a literal node matching `literal` exactly.
pub fn literal<S: Source>(literal: impl Into<String>) -> ArgumentBuilder<S> {
    ArgumentBuilder::new(BuilderKind::Literal(literal.into()))
}

/// Starts an argument node named `name` parsing values of type `ty`.
pub fn argument<S: Source>(name: impl Into<String>, ty: ArgumentType) -> ArgumentBuilder<S> {
    ArgumentBuilder::new(BuilderKind::Argument {
        name: name.into(),
        ty,
    })
}

impl<S: Source> ArgumentBuilder<S> {
    fn new(kind: BuilderKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            command: None,
            requirement: None,
            suggestions: None,
            target: None,
            modifier: None,
            forks: false,
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            BuilderKind::Literal(literal) => literal,
            BuilderKind::Argument { name, .. } => name,
        }
    }

    pub fn then(mut self, child: ArgumentBuilder<S>) -> Self {
        self.children.push(BuilderChild::Builder(child));
        self
    }

    /// Adds an existing node of the tree as a child.
    pub fn then_node(mut self, node: NodeId) -> Self {
        self.children.push(BuilderChild::Node(node));
        self
    }

    pub fn executes<F>(self, f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult<i32> + Send + Sync + 'static,
    {
        self.executes_command(Command::new(f))
    }

    pub fn executes_async<F, Fut>(self, f: F) -> Self
    where
        F: Fn(CommandContext<S>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<i32>> + Send + 'static,
    {
        self.executes_command(Command::from_async(f))
    }

    pub fn executes_command(mut self, command: Command<S>) -> Self {
        self.command = Some(command);
        self
    }

    pub fn requires<F>(self, f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.requirement(Requirement::new(f))
    }

    pub fn requirement(mut self, requirement: Requirement<S>) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// Custom completion; only valid on argument builders.
    pub fn suggests(mut self, provider: SuggestionProvider<S>) -> Self {
        self.suggestions = Some(provider);
        self
    }

    /// Continues parsing at `target` once this node is matched.
    pub fn redirect(self, target: NodeId) -> Self {
        self.forward(target, None, false)
    }

    /// Like [`redirect`](Self::redirect), transforming the source on the way.
    pub fn redirect_with(self, target: NodeId, modifier: RedirectModifier<S>) -> Self {
        self.forward(target, Some(modifier), false)
    }

    /// Redirect whose modifier may fan out to many sources. Failures of
    /// individual branches are swallowed.
    pub fn fork(self, target: NodeId, modifier: RedirectModifier<S>) -> Self {
        self.forward(target, Some(modifier), true)
    }

    pub fn forward(mut self, target: NodeId, modifier: Option<RedirectModifier<S>>, fork: bool) -> Self {
        self.target = Some(target);
        self.modifier = modifier;
        self.forks = fork;
        self
    }
}

impl<S: Source> CommandTree<S> {
    /// Materializes `builder` and its subtree as detached nodes and
    /// returns the handle of its top node.
    pub fn build(&mut self, builder: ArgumentBuilder<S>) -> Result<NodeId, GraphError> {
        let ArgumentBuilder {
            kind,
            children,
            command,
            requirement,
            suggestions,
            target,
            modifier,
            forks,
        } = builder;

        let mut node = match kind {
            BuilderKind::Literal(literal) => {
                if suggestions.is_some() {
                    return Err(GraphError::SuggestionsOnLiteral(literal));
                }
                if target.is_some() && !children.is_empty() {
                    return Err(GraphError::RedirectWithChildren(literal));
                }
                CommandNode::literal(literal)
            }
            BuilderKind::Argument { name, ty } => {
                if target.is_some() && !children.is_empty() {
                    return Err(GraphError::RedirectWithChildren(name));
                }
                let mut node = CommandNode::argument(name, ty);
                node.set_suggestions(suggestions);
                node
            }
        };
        if let Some(target) = target {
            if !self.contains(target) {
                return Err(GraphError::UnknownNode(target.index()));
            }
        }
        node.set_command(command);
        node.set_requirement(requirement);
        node.set_redirect(target);
        node.set_modifier(modifier);
        node.set_forks(forks);

        let id = self.insert(node);
        for child in children {
            let child = match child {
                BuilderChild::Builder(builder) => self.build(builder)?,
                BuilderChild::Node(node) => node,
            };
            self.add_child(id, child)?;
        }
        Ok(id)
    }
}
