//! Callback handles attached to command nodes.
//!
//! Executors, requirements and suggestion providers are asynchronous and
//! receive a [`CancellationToken`]; redirect modifiers are synchronous.
//! Each handle is a cheaply clonable `Arc` with identity comparison, so
//! trees can share callbacks between nodes and the codec can map providers
//! back to registered names.

use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use futures::future::{self, BoxFuture, Either, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, CommandSyntaxError};
use crate::suggestion::{Suggestions, SuggestionsBuilder};

/// Bound every command source type must satisfy.
pub trait Source: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Source for T {}

type CommandFn<S> = dyn Fn(CommandContext<S>, CancellationToken) -> BoxFuture<'static, CommandResult<i32>>
    + Send
    + Sync;
type RequirementFn<S> = dyn Fn(S, CancellationToken) -> BoxFuture<'static, bool> + Send + Sync;
type ModifierFn<S> = dyn Fn(&CommandContext<S>) -> Result<Vec<S>, CommandSyntaxError> + Send + Sync;
type ProviderFn<S> = dyn Fn(
        CommandContext<S>,
        SuggestionsBuilder,
        CancellationToken,
    ) -> BoxFuture<'static, CommandResult<Suggestions>>
    + Send
    + Sync;
type ConsumerFn<S> = dyn Fn(&CommandContext<S>, bool, i32) + Send + Sync;

macro_rules! callback_handle {
    ($name:ident, $label:literal) => {
        impl<S> Clone for $name<S> {
            fn clone(&self) -> Self {
                Self(Arc::clone(&self.0))
            }
        }

        impl<S> fmt::Debug for $name<S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({:p})"), Arc::as_ptr(&self.0))
            }
        }

        impl<S> $name<S> {
            /// True when both handles wrap the same callback.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }
    };
}

/// Executor run when input ends on an executable node.
pub struct Command<S>(Arc<CommandFn<S>>);

callback_handle!(Command, "Command");

impl<S: Source> Command<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> CommandResult<i32> + Send + Sync + 'static,
    {
        Self(Arc::new(move |ctx: CommandContext<S>, _: CancellationToken| {
            future::ready(f(&ctx)).boxed()
        }))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(CommandContext<S>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<i32>> + Send + 'static,
    {
        Self(Arc::new(move |ctx: CommandContext<S>, cancel: CancellationToken| {
            f(ctx, cancel).boxed()
        }))
    }

    /// Executor that does nothing and reports `0`.
    pub fn noop() -> Self {
        Self::new(|_| Ok(0))
    }

    pub fn run(
        &self,
        ctx: CommandContext<S>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, CommandResult<i32>> {
        (self.0)(ctx, cancel)
    }
}

/// Predicate deciding whether a source may use a node.
pub struct Requirement<S>(Arc<RequirementFn<S>>);

callback_handle!(Requirement, "Requirement");

impl<S: Source> Requirement<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |source: S, _: CancellationToken| {
            future::ready(f(&source)).boxed()
        }))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(S, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self(Arc::new(move |source: S, cancel: CancellationToken| {
            f(source, cancel).boxed()
        }))
    }

    /// A requirement every source satisfies.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn check(&self, source: S, cancel: CancellationToken) -> BoxFuture<'static, bool> {
        (self.0)(source, cancel)
    }
}

/// Maps the current source to the sources a redirect continues with.
pub struct RedirectModifier<S>(Arc<ModifierFn<S>>);

callback_handle!(RedirectModifier, "RedirectModifier");

impl<S: Source> RedirectModifier<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<Vec<S>, CommandSyntaxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Modifier producing exactly one source.
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<S, CommandSyntaxError> + Send + Sync + 'static,
    {
        Self(Arc::new(move |ctx: &CommandContext<S>| {
            f(ctx).map(|source| vec![source])
        }))
    }

    pub fn apply(&self, ctx: &CommandContext<S>) -> Result<Vec<S>, CommandSyntaxError> {
        (self.0)(ctx)
    }
}

/// Custom completion for an argument node.
pub struct SuggestionProvider<S>(Arc<ProviderFn<S>>);

callback_handle!(SuggestionProvider, "SuggestionProvider");

impl<S: Source> SuggestionProvider<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>, SuggestionsBuilder) -> CommandResult<Suggestions> + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |ctx: CommandContext<S>, builder: SuggestionsBuilder, _: CancellationToken| {
                future::ready(f(&ctx, builder)).boxed()
            },
        ))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(CommandContext<S>, SuggestionsBuilder, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<Suggestions>> + Send + 'static,
    {
        Self(Arc::new(
            move |ctx: CommandContext<S>, builder: SuggestionsBuilder, cancel: CancellationToken| {
                f(ctx, builder, cancel).boxed()
            },
        ))
    }

    /// Provider that never suggests anything.
    pub fn empty() -> Self {
        Self::new(|_, _| Ok(Suggestions::empty()))
    }

    pub fn provide(
        &self,
        ctx: CommandContext<S>,
        builder: SuggestionsBuilder,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, CommandResult<Suggestions>> {
        (self.0)(ctx, builder, cancel)
    }
}

/// Observer told about each execution outcome.
pub struct ResultConsumer<S>(Arc<ConsumerFn<S>>);

callback_handle!(ResultConsumer, "ResultConsumer");

impl<S: Source> ResultConsumer<S> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<S>, bool, i32) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn on_command_complete(&self, ctx: &CommandContext<S>, success: bool, result: i32) {
        (self.0)(ctx, success, result)
    }
}

/// Awaits `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: BoxFuture<'static, T>,
) -> CommandResult<T> {
    if cancel.is_cancelled() {
        return Err(CommandError::Cancelled);
    }
    let cancelled = pin!(cancel.cancelled());
    match future::select(fut, cancelled).await {
        Either::Left((value, _)) if !cancel.is_cancelled() => Ok(value),
        _ => Err(CommandError::Cancelled),
    }
}
