//! Human-readable usage strings.

use futures::future::{BoxFuture, FutureExt};
use indexmap::{IndexMap, IndexSet};
use tokio_util::sync::CancellationToken;

use crate::callbacks::Source;
use crate::dispatcher::Dispatcher;
use crate::error::CommandResult;
use crate::tree::NodeId;

const ARGUMENT_SEPARATOR: &str = " ";
const USAGE_OPTIONAL_OPEN: &str = "[";
const USAGE_OPTIONAL_CLOSE: &str = "]";
const USAGE_REQUIRED_OPEN: &str = "(";
const USAGE_REQUIRED_CLOSE: &str = ")";
const USAGE_OR: &str = "|";

impl<S: Source> Dispatcher<S> {
    fn redirect_usage(&self, target: NodeId) -> String {
        if target == self.root() {
            "...".to_string()
        } else {
            format!("=> {}", self.tree()[target].usage_text())
        }
    }

    /// Every executable or redirecting path below `node`, one string per
    /// path. With `restricted`, nodes `source` may not use are skipped.
    pub async fn get_all_usage(
        &self,
        node: NodeId,
        source: &S,
        restricted: bool,
        cancel: &CancellationToken,
    ) -> CommandResult<Vec<String>> {
        let mut result = Vec::new();
        self.collect_all_usage(node, source, &mut result, String::new(), restricted, cancel)
            .await?;
        Ok(result)
    }

    fn collect_all_usage<'a>(
        &'a self,
        node: NodeId,
        source: &'a S,
        result: &'a mut Vec<String>,
        prefix: String,
        restricted: bool,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandResult<()>> {
        async move {
            if restricted && !self.can_use(node, source, cancel).await? {
                return Ok(());
            }
            let current = &self.tree()[node];
            if current.is_executable() {
                result.push(prefix.clone());
            }

            if let Some(target) = current.redirect() {
                let redirect = self.redirect_usage(target);
                if prefix.is_empty() {
                    result.push(format!("{}{ARGUMENT_SEPARATOR}{redirect}", current.usage_text()));
                } else {
                    result.push(format!("{prefix}{ARGUMENT_SEPARATOR}{redirect}"));
                }
                return Ok(());
            }

            let children: Vec<NodeId> = current.children().collect();
            for child in children {
                let text = self.tree()[child].usage_text();
                let child_prefix = if prefix.is_empty() {
                    text
                } else {
                    format!("{prefix}{ARGUMENT_SEPARATOR}{text}")
                };
                self.collect_all_usage(child, source, result, child_prefix, restricted, cancel)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// One compact usage string per usable child of `node`.
    ///
    /// Optional continuations (the node is executable on its own) are
    /// wrapped in `[...]`, required ones in `(...)`, and alternatives are
    /// separated by `|`.
    pub async fn get_smart_usage(
        &self,
        node: NodeId,
        source: &S,
        cancel: &CancellationToken,
    ) -> CommandResult<IndexMap<NodeId, String>> {
        let mut result = IndexMap::new();
        let optional = self.tree()[node].is_executable();
        let children: Vec<NodeId> = self.tree()[node].children().collect();
        for child in children {
            if let Some(usage) = self.smart_usage_of(child, source, optional, false, cancel).await? {
                result.insert(child, usage);
            }
        }
        Ok(result)
    }

    fn smart_usage_of<'a>(
        &'a self,
        node: NodeId,
        source: &'a S,
        optional: bool,
        deep: bool,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandResult<Option<String>>> {
        async move {
            if !self.can_use(node, source, cancel).await? {
                return Ok(None);
            }

            let current = &self.tree()[node];
            let this = if optional {
                format!("{USAGE_OPTIONAL_OPEN}{}{USAGE_OPTIONAL_CLOSE}", current.usage_text())
            } else {
                current.usage_text()
            };
            if deep {
                return Ok(Some(this));
            }

            if let Some(target) = current.redirect() {
                let redirect = self.redirect_usage(target);
                return Ok(Some(format!("{this}{ARGUMENT_SEPARATOR}{redirect}")));
            }

            let child_optional = current.is_executable();
            let (open, close) = if child_optional {
                (USAGE_OPTIONAL_OPEN, USAGE_OPTIONAL_CLOSE)
            } else {
                (USAGE_REQUIRED_OPEN, USAGE_REQUIRED_CLOSE)
            };

            let mut children = Vec::new();
            for child in current.children() {
                if self.can_use(child, source, cancel).await? {
                    children.push(child);
                }
            }

            match children.as_slice() {
                [] => {}
                [only] => {
                    let usage = self
                        .smart_usage_of(*only, source, child_optional, child_optional, cancel)
                        .await?;
                    if let Some(usage) = usage {
                        return Ok(Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}")));
                    }
                }
                many => {
                    let mut child_usage = IndexSet::new();
                    for child in many {
                        if let Some(usage) =
                            self.smart_usage_of(*child, source, child_optional, true, cancel).await?
                        {
                            child_usage.insert(usage);
                        }
                    }
                    if child_usage.len() == 1 {
                        let usage = child_usage.into_iter().next().unwrap_or_default();
                        let usage = if child_optional {
                            format!("{USAGE_OPTIONAL_OPEN}{usage}{USAGE_OPTIONAL_CLOSE}")
                        } else {
                            usage
                        };
                        return Ok(Some(format!("{this}{ARGUMENT_SEPARATOR}{usage}")));
                    } else if child_usage.len() > 1 {
                        let alternatives: Vec<String> =
                            many.iter().map(|child| self.tree()[*child].usage_text()).collect();
                        return Ok(Some(format!(
                            "{this}{ARGUMENT_SEPARATOR}{open}{}{close}",
                            alternatives.join(USAGE_OR)
                        )));
                    }
                }
            }
            Ok(Some(this))
        }
        .boxed()
    }
}
