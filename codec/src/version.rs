//! Protocol version numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A game protocol version number as sent in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub i32);

const NAMED: &[(ProtocolVersion, &str)] = &[
    (ProtocolVersion::MINECRAFT_1_13, "1.13"),
    (ProtocolVersion::MINECRAFT_1_19, "1.19"),
    (ProtocolVersion::MINECRAFT_1_19_3, "1.19.3"),
    (ProtocolVersion::MINECRAFT_1_19_4, "1.19.4"),
    (ProtocolVersion::MINECRAFT_1_20_3, "1.20.3"),
    (ProtocolVersion::MINECRAFT_1_20_5, "1.20.5"),
    (ProtocolVersion::MINECRAFT_1_21_5, "1.21.5"),
    (ProtocolVersion::MINECRAFT_1_21_6, "1.21.6"),
];

impl ProtocolVersion {
    pub const MINECRAFT_1_13: Self = Self(393);
    pub const MINECRAFT_1_19: Self = Self(759);
    pub const MINECRAFT_1_19_3: Self = Self(761);
    pub const MINECRAFT_1_19_4: Self = Self(762);
    pub const MINECRAFT_1_20_3: Self = Self(765);
    pub const MINECRAFT_1_20_5: Self = Self(766);
    pub const MINECRAFT_1_21_5: Self = Self(770);
    pub const MINECRAFT_1_21_6: Self = Self(771);

    /// Newest version this codec knows the parser table for.
    pub const LATEST: Self = Self::MINECRAFT_1_21_6;

    /// Oldest version that has a Commands packet.
    pub const OLDEST: Self = Self::MINECRAFT_1_13;

    pub fn number(self) -> i32 {
        self.0
    }

    /// Release name for the versions the parser table distinguishes.
    pub fn name(self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(version, _)| *version == self)
            .map(|(_, name)| *name)
    }

    /// Whether the Commands packet exists in this version.
    pub fn has_command_graph(self) -> bool {
        self >= Self::OLDEST
    }

    /// From 1.19 on, argument parsers are identified by numeric ids instead
    /// of namespaced strings.
    pub fn uses_parser_ids(self) -> bool {
        self >= Self::MINECRAFT_1_19
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
