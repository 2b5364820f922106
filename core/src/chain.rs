use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::callbacks::{ResultConsumer, Source};
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, CommandSyntaxError, SyntaxErrorKind};

/// A parsed context flattened into the redirect stages that transform the
/// source, followed by the one context that actually executes.
#[derive(Debug, Clone)]
pub struct ContextChain<S> {
    modifiers: Vec<CommandContext<S>>,
    executable: CommandContext<S>,
}

impl<S: Source> ContextChain<S> {
    /// Walks the child links of `root`. Fails when the innermost context has
    /// no executor.
    pub fn try_flatten(root: &CommandContext<S>) -> Option<Self> {
        let mut modifiers = Vec::new();
        let mut current = root.clone();
        loop {
            let Some(child) = current.child().cloned() else {
                current.command()?;
                return Some(Self {
                    modifiers,
                    executable: current,
                });
            };
            modifiers.push(current);
            current = child;
        }
    }

    pub fn modifiers(&self) -> &[CommandContext<S>] {
        &self.modifiers
    }

    pub fn executable(&self) -> &CommandContext<S> {
        &self.executable
    }

    /// Runs every stage for `source` and returns the combined result.
    ///
    /// Once any stage forks, failures of individual sources are reported to
    /// `consumer` and skipped, and each successful execution counts as `1`.
    /// Otherwise the first failure aborts the chain.
    pub async fn execute_all(
        &self,
        source: S,
        consumer: Option<&ResultConsumer<S>>,
        cancel: &CancellationToken,
    ) -> CommandResult<i32> {
        let mut forked = false;
        let mut sources = vec![source];

        for stage in &self.modifiers {
            forked |= stage.is_forked();
            let mut next = Vec::new();
            for source in sources {
                check_cancelled(cancel)?;
                next.extend(run_modifier(stage, source, consumer, forked)?);
            }
            if next.is_empty() {
                debug!(forked, "redirect modifier produced no sources");
                return Ok(0);
            }
            sources = next;
        }

        let mut result = 0i32;
        for source in sources {
            check_cancelled(cancel)?;
            result = result.wrapping_add(
                run_executable(&self.executable, source, consumer, forked, cancel).await?,
            );
        }
        Ok(result)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> CommandResult<()> {
    if cancel.is_cancelled() {
        return Err(CommandError::Cancelled);
    }
    Ok(())
}

fn notify_failure<S: Source>(consumer: Option<&ResultConsumer<S>>, ctx: &CommandContext<S>) {
    if let Some(consumer) = consumer {
        consumer.on_command_complete(ctx, false, 0);
    }
}

fn run_modifier<S: Source>(
    stage: &CommandContext<S>,
    source: S,
    consumer: Option<&ResultConsumer<S>>,
    forked: bool,
) -> CommandResult<Vec<S>> {
    let Some(modifier) = stage.redirect_modifier() else {
        return Ok(vec![source]);
    };
    let ctx = stage.copy_for(source);
    match modifier.apply(&ctx) {
        Ok(sources) => {
            trace!(count = sources.len(), "redirect modifier applied");
            Ok(sources)
        }
        Err(err) => {
            notify_failure(consumer, &ctx);
            if forked {
                debug!(error = %err, "forked redirect modifier failed");
                Ok(Vec::new())
            } else {
                Err(err.into())
            }
        }
    }
}

async fn run_executable<S: Source>(
    executable: &CommandContext<S>,
    source: S,
    consumer: Option<&ResultConsumer<S>>,
    forked: bool,
    cancel: &CancellationToken,
) -> CommandResult<i32> {
    let ctx = executable.copy_for(source);
    let Some(command) = ctx.command().cloned() else {
        return Err(CommandSyntaxError::new(SyntaxErrorKind::UnknownCommand).into());
    };
    match command.run(ctx.clone(), cancel.clone()).await {
        Ok(result) => Ok(if forked { 1 } else { result }),
        Err(CommandError::Cancelled) => Err(CommandError::Cancelled),
        Err(err) => {
            notify_failure(consumer, &ctx);
            if forked {
                debug!(error = %err, "forked command failed");
                Ok(0)
            } else {
                Err(err)
            }
        }
    }
}
