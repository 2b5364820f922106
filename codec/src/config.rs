//! Codec configuration.
//!
//! Loaded from YAML:
//!
//! ```yaml
//! protocol_version: 771
//! buffer_capacity: 131072
//! default_suggestion_provider: "minecraft:ask_server"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_tree_core::Source;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::providers::{ASK_SERVER, SuggestionProviderRegistry};
use crate::version::ProtocolVersion;

/// Default encode capacity, 128 KiB of packet body.
pub const DEFAULT_BUFFER_CAPACITY: usize = 128 * 1024;

/// Settings for [`CommandsCodec`](crate::CommandsCodec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Protocol version of the connection.
    pub protocol_version: ProtocolVersion,

    /// Largest encoded packet body accepted, in bytes.
    ///
    /// The limit covers the whole body: the node count, every node record
    /// and the trailing root index. Packet framing (length prefix and
    /// packet id) is not counted.
    pub buffer_capacity: usize,

    /// Provider name written for suggestion providers with no registered name.
    pub default_suggestion_provider: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::LATEST,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            default_suggestion_provider: ASK_SERVER.to_string(),
        }
    }
}

impl CodecConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// A provider registry using the configured default name.
    pub fn provider_registry<S: Source>(&self) -> SuggestionProviderRegistry<S> {
        SuggestionProviderRegistry::with_default_name(self.default_suggestion_provider.clone())
    }
}
