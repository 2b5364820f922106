//! Argument parser registry.
//!
//! Every argument parser has a namespaced identifier. From 1.19 on the wire
//! carries a numeric id instead, and those ids shift between releases as
//! parsers are added and removed. A [`ParserMapping`] stores the id per
//! release threshold: the id for a version is the one attached to the
//! newest threshold not newer than that version, and `-1` marks a parser
//! that no longer exists.
//!
//! The `brigadier:*` parsers decode into typed [`ArgumentType`]s. Every
//! other parser decodes into [`ArgumentType::Passthrough`], keeping its raw
//! property bytes so the graph can be re-encoded unchanged.

use command_tree_core::{ArgumentType, PassthroughArgument, StringKind};
use indexmap::IndexMap;
use tracing::trace;

use crate::buffer::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::version::ProtocolVersion;

const FLAG_HAS_MIN: u8 = 0x01;
const FLAG_HAS_MAX: u8 = 0x02;

/// Id value marking a parser removed in a release.
pub const REMOVED_PARSER_ID: i32 = -1;

/// Shape of the properties that follow a parser id on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLayout {
    /// Nothing follows.
    Empty,
    Bool,
    Float,
    Double,
    Integer,
    Long,
    /// VarInt string kind.
    String,
    /// One flags byte (entity and score holder selectors).
    Byte,
    /// An `i32` minimum tick count from 1.19.4 on, nothing before.
    Time,
    /// A registry identifier string.
    RegistryKey,
    /// A wrapped parser header followed by a length-prefixed byte array.
    ModArgument,
}

/// One parser and its per-release ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserMapping {
    identifier: String,
    /// Sorted newest first.
    thresholds: Vec<(ProtocolVersion, i32)>,
    layout: PropertyLayout,
}

impl ParserMapping {
    pub fn new(
        identifier: impl Into<String>,
        thresholds: impl IntoIterator<Item = (ProtocolVersion, i32)>,
        layout: PropertyLayout,
    ) -> Self {
        let mut thresholds: Vec<_> = thresholds.into_iter().collect();
        thresholds.sort_by(|a, b| b.0.cmp(&a.0));
        Self {
            identifier: identifier.into(),
            thresholds,
            layout,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn layout(&self) -> PropertyLayout {
        self.layout
    }

    /// Numeric id used in `version`, if the parser exists there.
    pub fn parser_id(&self, version: ProtocolVersion) -> Option<i32> {
        self.thresholds
            .iter()
            .find(|(threshold, _)| *threshold <= version)
            .map(|(_, id)| *id)
            .filter(|id| *id != REMOVED_PARSER_ID)
    }
}

use PropertyLayout as L;

const V1_19: ProtocolVersion = ProtocolVersion::MINECRAFT_1_19;
const V1_19_3: ProtocolVersion = ProtocolVersion::MINECRAFT_1_19_3;
const V1_19_4: ProtocolVersion = ProtocolVersion::MINECRAFT_1_19_4;
const V1_20_3: ProtocolVersion = ProtocolVersion::MINECRAFT_1_20_3;
const V1_20_5: ProtocolVersion = ProtocolVersion::MINECRAFT_1_20_5;
const V1_21_5: ProtocolVersion = ProtocolVersion::MINECRAFT_1_21_5;
const V1_21_6: ProtocolVersion = ProtocolVersion::MINECRAFT_1_21_6;

type ParserRow = (&'static str, PropertyLayout, &'static [(ProtocolVersion, i32)]);

#[rustfmt::skip]
const VANILLA_PARSERS: &[ParserRow] = &[
    ("brigadier:bool", L::Bool, &[(V1_19, 0)]),
    ("brigadier:float", L::Float, &[(V1_19, 1)]),
    ("brigadier:double", L::Double, &[(V1_19, 2)]),
    ("brigadier:integer", L::Integer, &[(V1_19, 3)]),
    ("brigadier:long", L::Long, &[(V1_19, 4)]),
    ("brigadier:string", L::String, &[(V1_19, 5)]),
    ("minecraft:entity", L::Byte, &[(V1_19, 6)]),
    ("minecraft:score_holder", L::Byte, &[(V1_21_6, 31), (V1_20_3, 30), (V1_19, 29)]),
    ("minecraft:time", L::Time, &[(V1_21_6, 43), (V1_20_5, 42), (V1_20_3, 41), (V1_19_3, 40), (V1_19, 42)]),
    ("minecraft:resource_or_tag", L::RegistryKey, &[(V1_21_6, 44), (V1_20_5, 43), (V1_20_3, 42), (V1_19_3, 41), (V1_19, 43)]),
    ("minecraft:resource_or_tag_key", L::RegistryKey, &[(V1_21_6, 45), (V1_20_5, 44), (V1_20_3, 43), (V1_19_3, 42)]),
    ("minecraft:resource", L::RegistryKey, &[(V1_21_6, 46), (V1_20_5, 45), (V1_20_3, 44), (V1_19_3, 43), (V1_19, 44)]),
    ("minecraft:resource_key", L::RegistryKey, &[(V1_21_6, 47), (V1_20_5, 46), (V1_20_3, 45), (V1_19_3, 44)]),
    ("minecraft:resource_selector", L::RegistryKey, &[(V1_21_6, 48), (V1_21_5, 47)]),
    ("minecraft:nbt", L::Empty, &[]),
    ("minecraft:game_profile", L::Empty, &[(V1_19, 7)]),
    ("minecraft:block_pos", L::Empty, &[(V1_19, 8)]),
    ("minecraft:column_pos", L::Empty, &[(V1_19, 9)]),
    ("minecraft:vec3", L::Empty, &[(V1_19, 10)]),
    ("minecraft:vec2", L::Empty, &[(V1_19, 11)]),
    ("minecraft:block_state", L::Empty, &[(V1_19, 12)]),
    ("minecraft:block_predicate", L::Empty, &[(V1_19, 13)]),
    ("minecraft:item_stack", L::Empty, &[(V1_19, 14)]),
    ("minecraft:item_predicate", L::Empty, &[(V1_19, 15)]),
    ("minecraft:color", L::Empty, &[(V1_19, 16)]),
    ("minecraft:component", L::Empty, &[(V1_21_6, 18), (V1_19, 17)]),
    ("minecraft:style", L::Empty, &[(V1_21_6, 19), (V1_20_3, 18)]),
    ("minecraft:message", L::Empty, &[(V1_21_6, 20), (V1_20_3, 19), (V1_19, 18)]),
    ("minecraft:nbt_compound_tag", L::Empty, &[(V1_21_6, 21), (V1_20_3, 20), (V1_19, 19)]),
    ("minecraft:nbt_tag", L::Empty, &[(V1_21_6, 22), (V1_20_3, 21), (V1_19, 20)]),
    ("minecraft:nbt_path", L::Empty, &[(V1_21_6, 23), (V1_20_3, 22), (V1_19, 21)]),
    ("minecraft:objective", L::Empty, &[(V1_21_6, 24), (V1_20_3, 23), (V1_19, 22)]),
    ("minecraft:objective_criteria", L::Empty, &[(V1_21_6, 25), (V1_20_3, 24), (V1_19, 23)]),
    ("minecraft:operation", L::Empty, &[(V1_21_6, 26), (V1_20_3, 25), (V1_19, 24)]),
    ("minecraft:particle", L::Empty, &[(V1_21_6, 27), (V1_20_3, 26), (V1_19, 25)]),
    ("minecraft:angle", L::Empty, &[(V1_21_6, 28), (V1_20_3, 27), (V1_19, 26)]),
    ("minecraft:rotation", L::Empty, &[(V1_21_6, 29), (V1_20_3, 28), (V1_19, 27)]),
    ("minecraft:scoreboard_slot", L::Empty, &[(V1_21_6, 30), (V1_20_3, 29), (V1_19, 28)]),
    ("minecraft:swizzle", L::Empty, &[(V1_21_6, 32), (V1_20_3, 31), (V1_19, 30)]),
    ("minecraft:team", L::Empty, &[(V1_21_6, 33), (V1_20_3, 32), (V1_19, 31)]),
    ("minecraft:item_slot", L::Empty, &[(V1_21_6, 34), (V1_20_3, 33), (V1_19, 32)]),
    ("minecraft:item_slots", L::Empty, &[(V1_21_6, 35), (V1_20_5, 34)]),
    ("minecraft:resource_location", L::Empty, &[(V1_21_6, 36), (V1_20_5, 35), (V1_20_3, 34), (V1_19, 33)]),
    ("minecraft:mob_effect", L::Empty, &[(V1_19_3, REMOVED_PARSER_ID), (V1_19, 34)]),
    ("minecraft:function", L::Empty, &[(V1_21_6, 37), (V1_20_5, 36), (V1_20_3, 35), (V1_19_3, 34), (V1_19, 35)]),
    ("minecraft:entity_anchor", L::Empty, &[(V1_21_6, 38), (V1_20_5, 37), (V1_20_3, 36), (V1_19_3, 35), (V1_19, 36)]),
    ("minecraft:int_range", L::Empty, &[(V1_21_6, 39), (V1_20_5, 38), (V1_20_3, 37), (V1_19_3, 36), (V1_19, 37)]),
    ("minecraft:float_range", L::Empty, &[(V1_21_6, 40), (V1_20_5, 39), (V1_20_3, 38), (V1_19_3, 37), (V1_19, 38)]),
    ("minecraft:item_enchantment", L::Empty, &[(V1_19_3, REMOVED_PARSER_ID), (V1_19, 39)]),
    ("minecraft:entity_summon", L::Empty, &[(V1_19_3, REMOVED_PARSER_ID), (V1_19, 40)]),
    ("minecraft:dimension", L::Empty, &[(V1_21_6, 41), (V1_20_5, 40), (V1_20_3, 39), (V1_19_3, 38), (V1_19, 41)]),
    ("minecraft:gamemode", L::Empty, &[(V1_21_6, 42), (V1_20_5, 41), (V1_20_3, 40), (V1_19_3, 39)]),
    ("minecraft:template_mirror", L::Empty, &[(V1_21_6, 49), (V1_21_5, 48), (V1_20_5, 47), (V1_20_3, 46), (V1_19, 45)]),
    ("minecraft:template_rotation", L::Empty, &[(V1_21_6, 50), (V1_21_5, 49), (V1_20_5, 48), (V1_20_3, 47), (V1_19, 46)]),
    ("minecraft:heightmap", L::Empty, &[(V1_21_6, 51), (V1_21_5, 50), (V1_20_3, 49), (V1_19_4, 47)]),
    ("minecraft:uuid", L::Empty, &[(V1_21_6, 56), (V1_21_5, 54), (V1_20_5, 53), (V1_20_3, 48), (V1_19_4, 48), (V1_19, 47)]),
    ("minecraft:loot_table", L::Empty, &[(V1_21_6, 52), (V1_21_5, 51), (V1_20_5, 50)]),
    ("minecraft:loot_predicate", L::Empty, &[(V1_21_6, 53), (V1_21_5, 52), (V1_20_5, 51)]),
    ("minecraft:loot_modifier", L::Empty, &[(V1_21_6, 54), (V1_21_5, 53), (V1_20_5, 52)]),
    ("minecraft:hex_color", L::Empty, &[(V1_21_6, 17)]),
    ("minecraft:dialog", L::Empty, &[(V1_21_6, 55)]),
    ("crossstitch:mod_argument", L::ModArgument, &[(V1_19, -256)]),
];

/// Maps argument types to wire parser ids and back.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    mappings: IndexMap<String, ParserMapping>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::vanilla()
    }
}

impl ParserRegistry {
    /// A registry with no parsers.
    pub fn empty() -> Self {
        Self {
            mappings: IndexMap::new(),
        }
    }

    /// Every parser the game protocol defines, plus the CrossStitch wrapper.
    pub fn vanilla() -> Self {
        let mut registry = Self::empty();
        for (identifier, layout, thresholds) in VANILLA_PARSERS {
            registry.register(ParserMapping::new(
                *identifier,
                thresholds.iter().copied(),
                *layout,
            ));
        }
        registry
    }

    /// Adds or replaces a parser.
    pub fn register(&mut self, mapping: ParserMapping) {
        self.mappings.insert(mapping.identifier.clone(), mapping);
    }

    pub fn get(&self, identifier: &str) -> Option<&ParserMapping> {
        self.mappings.get(identifier)
    }

    /// The parser whose id in `version` is `id`.
    pub fn by_id(&self, id: i32, version: ProtocolVersion) -> Option<&ParserMapping> {
        self.mappings
            .values()
            .find(|mapping| mapping.parser_id(version) == Some(id))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Writes the parser header and properties of `ty`.
    pub fn write_argument(
        &self,
        writer: &mut PacketWriter,
        ty: &ArgumentType,
        version: ProtocolVersion,
    ) -> Result<()> {
        let identifier = identifier_of(ty);
        let mapping = self
            .get(identifier)
            .ok_or_else(|| CodecError::UnknownParserIdentifier(identifier.to_string()))?;
        self.write_header(writer, mapping, version)?;

        match ty {
            ArgumentType::Bool => Ok(()),
            ArgumentType::Float { min, max } => {
                write_bounds(writer, *min != f32::MIN, *max != f32::MAX)?;
                if *min != f32::MIN {
                    writer.write_f32(*min)?;
                }
                if *max != f32::MAX {
                    writer.write_f32(*max)?;
                }
                Ok(())
            }
            ArgumentType::Double { min, max } => {
                write_bounds(writer, *min != f64::MIN, *max != f64::MAX)?;
                if *min != f64::MIN {
                    writer.write_f64(*min)?;
                }
                if *max != f64::MAX {
                    writer.write_f64(*max)?;
                }
                Ok(())
            }
            ArgumentType::Integer { min, max } => {
                write_bounds(writer, *min != i32::MIN, *max != i32::MAX)?;
                if *min != i32::MIN {
                    writer.write_i32(*min)?;
                }
                if *max != i32::MAX {
                    writer.write_i32(*max)?;
                }
                Ok(())
            }
            ArgumentType::Long { min, max } => {
                write_bounds(writer, *min != i64::MIN, *max != i64::MAX)?;
                if *min != i64::MIN {
                    writer.write_i64(*min)?;
                }
                if *max != i64::MAX {
                    writer.write_i64(*max)?;
                }
                Ok(())
            }
            ArgumentType::String(kind) => writer.write_var_int(kind.id()),
            ArgumentType::Passthrough(passthrough) => writer.write_bytes(&passthrough.properties),
        }
    }

    /// Reads a parser header and its properties.
    pub fn read_argument(
        &self,
        reader: &mut PacketReader,
        version: ProtocolVersion,
    ) -> Result<ArgumentType> {
        let mapping = self.read_header(reader, version)?;
        trace!(parser = mapping.identifier(), "reading argument properties");

        let ty = match mapping.layout {
            L::Bool => ArgumentType::Bool,
            L::Float => {
                let flags = reader.read_u8()?;
                let min = read_bound(reader, flags, FLAG_HAS_MIN, PacketReader::read_f32, f32::MIN)?;
                let max = read_bound(reader, flags, FLAG_HAS_MAX, PacketReader::read_f32, f32::MAX)?;
                ArgumentType::float_between(min, max)
            }
            L::Double => {
                let flags = reader.read_u8()?;
                let min = read_bound(reader, flags, FLAG_HAS_MIN, PacketReader::read_f64, f64::MIN)?;
                let max = read_bound(reader, flags, FLAG_HAS_MAX, PacketReader::read_f64, f64::MAX)?;
                ArgumentType::double_between(min, max)
            }
            L::Integer => {
                let flags = reader.read_u8()?;
                let min = read_bound(reader, flags, FLAG_HAS_MIN, PacketReader::read_i32, i32::MIN)?;
                let max = read_bound(reader, flags, FLAG_HAS_MAX, PacketReader::read_i32, i32::MAX)?;
                ArgumentType::integer_between(min, max)
            }
            L::Long => {
                let flags = reader.read_u8()?;
                let min = read_bound(reader, flags, FLAG_HAS_MIN, PacketReader::read_i64, i64::MIN)?;
                let max = read_bound(reader, flags, FLAG_HAS_MAX, PacketReader::read_i64, i64::MAX)?;
                ArgumentType::long_between(min, max)
            }
            L::String => {
                let kind = reader.read_var_int()?;
                let kind = StringKind::from_id(kind).ok_or_else(|| {
                    CodecError::InvalidProperty(format!("invalid string argument type {kind}"))
                })?;
                ArgumentType::String(kind)
            }
            layout => {
                let properties = reader.capture(|r| self.skip_properties(r, layout, version))?;
                ArgumentType::Passthrough(PassthroughArgument::new(
                    mapping.identifier(),
                    properties.to_vec(),
                ))
            }
        };
        Ok(ty)
    }

    fn skip_properties(
        &self,
        reader: &mut PacketReader,
        layout: PropertyLayout,
        version: ProtocolVersion,
    ) -> Result<()> {
        match layout {
            L::Byte => {
                reader.read_u8()?;
            }
            L::Time => {
                if version >= ProtocolVersion::MINECRAFT_1_19_4 {
                    reader.read_i32()?;
                }
            }
            L::RegistryKey => {
                reader.read_string()?;
            }
            L::ModArgument => {
                if version.uses_parser_ids() {
                    reader.read_var_int()?;
                } else {
                    reader.read_string()?;
                }
                let length = reader.read_length()?;
                reader.read_bytes(length)?;
            }
            L::Empty => {}
            L::Bool | L::Float | L::Double | L::Integer | L::Long | L::String => {
                return Err(CodecError::InvalidProperty(format!(
                    "{layout:?} properties are not opaque"
                )));
            }
        }
        Ok(())
    }

    fn write_header(
        &self,
        writer: &mut PacketWriter,
        mapping: &ParserMapping,
        version: ProtocolVersion,
    ) -> Result<()> {
        if !version.uses_parser_ids() {
            return writer.write_string(mapping.identifier());
        }
        let id = mapping
            .parser_id(version)
            .ok_or_else(|| CodecError::MissingParserId {
                identifier: mapping.identifier().to_string(),
                version,
            })?;
        writer.write_var_int(id)
    }

    fn read_header(&self, reader: &mut PacketReader, version: ProtocolVersion) -> Result<&ParserMapping> {
        if version.uses_parser_ids() {
            let id = reader.read_var_int()?;
            self.by_id(id, version)
                .ok_or(CodecError::UnknownParserId { id, version })
        } else {
            let identifier = reader.read_string()?;
            self.get(&identifier)
                .ok_or(CodecError::UnknownParserIdentifier(identifier))
        }
    }
}

/// Namespaced parser identifier for an argument type.
pub fn identifier_of(ty: &ArgumentType) -> &str {
    match ty {
        ArgumentType::Bool => "brigadier:bool",
        ArgumentType::Float { .. } => "brigadier:float",
        ArgumentType::Double { .. } => "brigadier:double",
        ArgumentType::Integer { .. } => "brigadier:integer",
        ArgumentType::Long { .. } => "brigadier:long",
        ArgumentType::String(_) => "brigadier:string",
        ArgumentType::Passthrough(passthrough) => &passthrough.identifier,
    }
}

fn write_bounds(writer: &mut PacketWriter, has_min: bool, has_max: bool) -> Result<()> {
    let mut flags = 0;
    if has_min {
        flags |= FLAG_HAS_MIN;
    }
    if has_max {
        flags |= FLAG_HAS_MAX;
    }
    writer.write_u8(flags)
}

fn read_bound<T>(
    reader: &mut PacketReader,
    flags: u8,
    flag: u8,
    read: fn(&mut PacketReader) -> Result<T>,
    default: T,
) -> Result<T> {
    if flags & flag != 0 {
        read(reader)
    } else {
        Ok(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(ty: &ArgumentType, version: ProtocolVersion) -> Vec<u8> {
        let mut writer = PacketWriter::with_limit(1024);
        ParserRegistry::vanilla()
            .write_argument(&mut writer, ty, version)
            .unwrap();
        writer.into_bytes().to_vec()
    }

    fn decode(bytes: Vec<u8>, version: ProtocolVersion) -> ArgumentType {
        let mut reader = PacketReader::new(bytes);
        let ty = ParserRegistry::vanilla()
            .read_argument(&mut reader, version)
            .unwrap();
        assert!(!reader.has_remaining());
        ty
    }

    #[test]
    fn test_parser_id_uses_newest_threshold() {
        let registry = ParserRegistry::vanilla();
        let component = registry.get("minecraft:component").unwrap();
        assert_eq!(component.parser_id(ProtocolVersion::MINECRAFT_1_19), Some(17));
        assert_eq!(component.parser_id(ProtocolVersion::MINECRAFT_1_21_5), Some(17));
        assert_eq!(component.parser_id(ProtocolVersion::MINECRAFT_1_21_6), Some(18));
        assert_eq!(component.parser_id(ProtocolVersion(800)), Some(18));
    }

    #[test]
    fn test_removed_parser_has_no_id() {
        let registry = ParserRegistry::vanilla();
        let mob_effect = registry.get("minecraft:mob_effect").unwrap();
        assert_eq!(mob_effect.parser_id(ProtocolVersion::MINECRAFT_1_19), Some(34));
        assert_eq!(mob_effect.parser_id(ProtocolVersion::MINECRAFT_1_19_3), None);
    }

    #[test]
    fn test_parser_absent_before_first_threshold() {
        let registry = ParserRegistry::vanilla();
        let dialog = registry.get("minecraft:dialog").unwrap();
        assert_eq!(dialog.parser_id(ProtocolVersion::MINECRAFT_1_21_5), None);
        assert_eq!(registry.get("minecraft:nbt").unwrap().parser_id(ProtocolVersion::LATEST), None);
    }

    #[test]
    fn test_by_id_is_version_specific() {
        let registry = ParserRegistry::vanilla();
        let at_1_19 = registry.by_id(41, ProtocolVersion::MINECRAFT_1_19).unwrap();
        assert_eq!(at_1_19.identifier(), "minecraft:dimension");
        let at_1_21_6 = registry.by_id(41, ProtocolVersion::MINECRAFT_1_21_6).unwrap();
        assert_eq!(at_1_21_6.identifier(), "minecraft:dimension");
        let at_1_20_5 = registry.by_id(41, ProtocolVersion::MINECRAFT_1_20_5).unwrap();
        assert_eq!(at_1_20_5.identifier(), "minecraft:gamemode");
    }

    #[test]
    fn test_integer_bounds_flags() {
        let version = ProtocolVersion::LATEST;
        assert_eq!(encode(&ArgumentType::integer(), version), vec![3, 0x00]);
        assert_eq!(
            encode(&ArgumentType::integer_between(0, i32::MAX), version),
            vec![3, 0x01, 0, 0, 0, 0]
        );
        assert_eq!(
            encode(&ArgumentType::integer_between(-1, 10), version),
            vec![3, 0x03, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 10]
        );
    }

    #[test]
    fn test_bounded_numbers_survive_the_wire() {
        let version = ProtocolVersion::LATEST;
        for ty in [
            ArgumentType::integer_between(1, 64),
            ArgumentType::long_between(i64::MIN, 5),
            ArgumentType::float_between(0.5, f32::MAX),
            ArgumentType::double_between(-1.0, 1.0),
        ] {
            assert_eq!(decode(encode(&ty, version), version), ty);
        }
    }

    #[test]
    fn test_string_kind() {
        let version = ProtocolVersion::LATEST;
        assert_eq!(encode(&ArgumentType::greedy_string(), version), vec![5, 2]);
        let mut reader = PacketReader::new(vec![5, 7]);
        let err = ParserRegistry::vanilla()
            .read_argument(&mut reader, version)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidProperty(_)));
    }

    #[test]
    fn test_identifier_header_before_1_19() {
        let version = ProtocolVersion(758);
        let bytes = encode(&ArgumentType::bool(), version);
        assert_eq!(bytes[0] as usize, "brigadier:bool".len());
        assert_eq!(&bytes[1..], b"brigadier:bool");
        assert_eq!(decode(bytes, version), ArgumentType::Bool);
    }

    #[test]
    fn test_entity_keeps_flags_byte() {
        let version = ProtocolVersion::LATEST;
        let ty = decode(vec![6, 0x03], version);
        assert_eq!(ty, ArgumentType::passthrough("minecraft:entity", vec![0x03]));
        assert_eq!(encode(&ty, version), vec![6, 0x03]);
    }

    #[test]
    fn test_time_minimum_only_from_1_19_4() {
        let ty = decode(vec![43, 0, 0, 0, 20], ProtocolVersion::MINECRAFT_1_21_6);
        assert_eq!(ty, ArgumentType::passthrough("minecraft:time", vec![0, 0, 0, 20]));

        let ty = decode(vec![40], ProtocolVersion::MINECRAFT_1_19_3);
        assert_eq!(ty, ArgumentType::passthrough("minecraft:time", vec![]));
    }

    #[test]
    fn test_registry_key_keeps_identifier() {
        let mut bytes = vec![46, 17];
        bytes.extend_from_slice(b"minecraft:effects");
        let ty = decode(bytes.clone(), ProtocolVersion::MINECRAFT_1_21_6);
        match &ty {
            ArgumentType::Passthrough(passthrough) => {
                assert_eq!(passthrough.identifier, "minecraft:resource");
                assert_eq!(passthrough.properties, bytes[1..].to_vec());
            }
            other => panic!("unexpected type {other:?}"),
        }
    }

    #[test]
    fn test_mod_argument_wraps_inner_payload() {
        let mut writer = PacketWriter::with_limit(64);
        writer.write_var_int(-256).unwrap();
        writer.write_var_int(12).unwrap();
        writer.write_var_int(2).unwrap();
        writer.write_bytes(&[0xaa, 0xbb]).unwrap();
        let bytes = writer.into_bytes().to_vec();

        let ty = decode(bytes.clone(), ProtocolVersion::LATEST);
        assert_eq!(identifier_of(&ty), "crossstitch:mod_argument");
        assert_eq!(encode(&ty, ProtocolVersion::LATEST), bytes);
    }

    #[test]
    fn test_missing_parser_id_on_encode() {
        let mut writer = PacketWriter::with_limit(64);
        let err = ParserRegistry::vanilla()
            .write_argument(
                &mut writer,
                &ArgumentType::passthrough("minecraft:mob_effect", vec![]),
                ProtocolVersion::LATEST,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::MissingParserId { .. }));
    }

    #[test]
    fn test_unknown_parser_id() {
        let mut reader = PacketReader::new(vec![0x7f]);
        let err = ParserRegistry::vanilla()
            .read_argument(&mut reader, ProtocolVersion::LATEST)
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownParserId { id: 127, .. }));
    }

    #[test]
    fn test_custom_mapping_registration() {
        let mut registry = ParserRegistry::empty();
        registry.register(ParserMapping::new(
            "example:marker",
            [(ProtocolVersion::MINECRAFT_1_19, 900)],
            PropertyLayout::Empty,
        ));
        assert_eq!(registry.len(), 1);
        let found = registry.by_id(900, ProtocolVersion::LATEST).unwrap();
        assert_eq!(found.identifier(), "example:marker");
    }
}
