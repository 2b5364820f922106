//! Names for custom suggestion providers.
//!
//! On the wire an argument with custom suggestions carries only the
//! provider's name. The host owns a [`SuggestionProviderRegistry`] and hands
//! it to the codec: encoding looks names up by provider identity, decoding
//! resolves names to providers and registers a placeholder for names it
//! has never seen.

use command_tree_core::{Source, SuggestionProvider};
use indexmap::IndexMap;
use tracing::warn;

/// Name the client sends back to the server for completion.
pub const ASK_SERVER: &str = "minecraft:ask_server";

/// Providers the game itself defines.
pub const BUILTIN_PROVIDERS: &[&str] = &[
    ASK_SERVER,
    "minecraft:all_recipes",
    "minecraft:available_sounds",
    "minecraft:summonable_entities",
];

/// Bidirectional provider name table.
#[derive(Debug, Clone)]
pub struct SuggestionProviderRegistry<S> {
    providers: IndexMap<String, SuggestionProvider<S>>,
    default_name: String,
}

impl<S: Source> Default for SuggestionProviderRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Source> SuggestionProviderRegistry<S> {
    /// A registry holding placeholders for the built-in providers.
    pub fn new() -> Self {
        Self::with_default_name(ASK_SERVER)
    }

    /// Like [`new`](Self::new), with a different name for unnamed providers.
    pub fn with_default_name(default_name: impl Into<String>) -> Self {
        let mut registry = Self {
            providers: IndexMap::new(),
            default_name: default_name.into(),
        };
        for name in BUILTIN_PROVIDERS {
            registry.register(*name, SuggestionProvider::empty());
        }
        registry
    }

    /// Name written for providers that were never registered.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Binds `name` to `provider`, replacing any earlier binding.
    pub fn register(&mut self, name: impl Into<String>, provider: SuggestionProvider<S>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&SuggestionProvider<S>> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered name of `provider`, compared by identity.
    pub fn name_of(&self, provider: &SuggestionProvider<S>) -> Option<&str> {
        self.providers
            .iter()
            .find(|(_, candidate)| candidate.ptr_eq(provider))
            .map(|(name, _)| name.as_str())
    }

    /// Name to put on the wire for `provider`.
    pub fn wire_name(&self, provider: &SuggestionProvider<S>) -> &str {
        self.name_of(provider).unwrap_or(&self.default_name)
    }

    /// Provider bound to `name`, registering an empty placeholder first if
    /// the name is new.
    pub fn resolve(&mut self, name: &str) -> SuggestionProvider<S> {
        if let Some(provider) = self.providers.get(name) {
            return provider.clone();
        }
        warn!(provider = name, "unknown suggestion provider, registering placeholder");
        let provider = SuggestionProvider::empty();
        self.providers.insert(name.to_string(), provider.clone());
        provider
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
