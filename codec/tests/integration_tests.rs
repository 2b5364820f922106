use std::collections::HashMap;

use command_tree_codec::*;
use command_tree_core::{
    ArgumentType, CommandTree, Dispatcher, NodeId, NodeKind, SuggestionProvider, argument, literal,
};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

fn grammar() -> Dispatcher<()> {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            literal("tp")
                .then(literal("here").executes(|_| Ok(1)))
                .then(argument("target", ArgumentType::word()).executes(|_| Ok(2))),
        )
        .unwrap();
    dispatcher
        .register(
            literal("give").then(
                argument("amount", ArgumentType::integer_between(1, 64))
                    .then(argument("scale", ArgumentType::double_between(0.0, 1.0)).executes(|_| Ok(1))),
            ),
        )
        .unwrap();
    let root = dispatcher.root();
    dispatcher.register(literal("execute").redirect(root)).unwrap();
    let tp = dispatcher.find_node(["tp"]).unwrap();
    dispatcher.register(literal("teleport").redirect(tp)).unwrap();
    dispatcher
}

fn kind_label<S>(kind: &NodeKind<S>) -> String {
    match kind {
        NodeKind::Root => "root".to_string(),
        NodeKind::Literal(literal) => format!("literal:{literal}"),
        NodeKind::Argument { name, ty, .. } => format!("argument:{name}:{ty:?}"),
    }
}

/// Walks both graphs in lockstep, pairing nodes by position.
fn assert_same_shape<A, B>(a: &CommandTree<A>, b: &CommandTree<B>)
where
    A: command_tree_core::Source,
    B: command_tree_core::Source,
{
    let mut pairs: HashMap<NodeId, NodeId> = HashMap::new();
    let mut stack = vec![(a.root(), b.root())];
    while let Some((x, y)) = stack.pop() {
        if let Some(seen) = pairs.get(&x) {
            assert_eq!(*seen, y, "node {x} paired twice");
            continue;
        }
        pairs.insert(x, y);

        let (nx, ny) = (&a[x], &b[y]);
        assert_eq!(kind_label(nx.kind()), kind_label(ny.kind()));
        assert_eq!(nx.is_executable(), ny.is_executable());
        assert_eq!(nx.is_restricted(), ny.is_restricted());
        assert_eq!(nx.redirect().is_some(), ny.redirect().is_some());

        let cx: Vec<NodeId> = nx.children().collect();
        let cy: Vec<NodeId> = ny.children().collect();
        assert_eq!(cx.len(), cy.len());
        stack.extend(cx.into_iter().zip(cy));
        if let (Some(rx), Some(ry)) = (nx.redirect(), ny.redirect()) {
            stack.push((rx, ry));
        }
    }
}

/// Writes a literal node record.
fn literal_record(w: &mut PacketWriter, name: &str, children: &[i32], redirect: Option<i32>) {
    let mut bits = flags::KIND_LITERAL;
    if redirect.is_some() {
        bits |= flags::HAS_REDIRECT;
    }
    w.write_u8(bits).unwrap();
    w.write_var_int(children.len() as i32).unwrap();
    for child in children {
        w.write_var_int(*child).unwrap();
    }
    if let Some(target) = redirect {
        w.write_var_int(target).unwrap();
    }
    w.write_string(name).unwrap();
}

fn root_record(w: &mut PacketWriter, children: &[i32]) {
    w.write_u8(flags::KIND_ROOT).unwrap();
    w.write_var_int(children.len() as i32).unwrap();
    for child in children {
        w.write_var_int(*child).unwrap();
    }
}

fn decode_raw(bytes: bytes::Bytes) -> Result<CommandTree<()>> {
    CommandsCodec::new(ProtocolVersion::LATEST).decode(bytes, &mut SuggestionProviderRegistry::new())
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_round_trip_with_redirect_to_root() {
    let dispatcher = grammar();
    for version in [
        ProtocolVersion::MINECRAFT_1_13,
        ProtocolVersion::MINECRAFT_1_19,
        ProtocolVersion::MINECRAFT_1_20_3,
        ProtocolVersion::LATEST,
    ] {
        let codec = CommandsCodec::new(version);
        let mut providers = SuggestionProviderRegistry::new();
        let bytes = codec.encode(dispatcher.tree(), &providers).unwrap();
        let decoded: CommandTree<()> = codec.decode(bytes.clone(), &mut providers).unwrap();

        assert_eq!(decoded.len(), dispatcher.tree().len());
        assert_same_shape(dispatcher.tree(), &decoded);
        assert_eq!(codec.encode(&decoded, &providers).unwrap(), bytes);
    }
}

#[test]
fn test_decoded_redirect_points_at_root() {
    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let mut providers = SuggestionProviderRegistry::new();
    let bytes = codec.encode(grammar().tree(), &providers).unwrap();
    let decoded: CommandTree<()> = codec.decode(bytes, &mut providers).unwrap();

    let execute = decoded[decoded.root()].child("execute").unwrap();
    assert_eq!(decoded[execute].redirect(), Some(decoded.root()));
    let teleport = decoded[decoded.root()].child("teleport").unwrap();
    let tp = decoded[decoded.root()].child("tp").unwrap();
    assert_eq!(decoded[teleport].redirect(), Some(tp));
}

#[tokio::test]
async fn test_decoded_graph_is_dispatchable() {
    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let mut providers = SuggestionProviderRegistry::new();
    let bytes = codec.encode(grammar().tree(), &providers).unwrap();
    let decoded: CommandTree<()> = codec.decode(bytes, &mut providers).unwrap();
    let dispatcher = Dispatcher::from_tree(decoded);
    let cancel = CancellationToken::new();

    assert_eq!(dispatcher.execute_input("tp here", (), &cancel).await.unwrap(), 0);
    assert_eq!(
        dispatcher.execute_input("execute teleport Steve", (), &cancel).await.unwrap(),
        0
    );
    assert!(dispatcher.execute_input("give 65 0.5", (), &cancel).await.is_err());
}

#[test]
fn test_redirect_target_outside_children_is_encoded() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    let hidden = dispatcher.tree_mut().insert(command_tree_core::CommandNode::literal("hidden"));
    dispatcher.register(literal("alias").redirect(hidden)).unwrap();

    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let mut providers = SuggestionProviderRegistry::new();
    let bytes = codec.encode(dispatcher.tree(), &providers).unwrap();
    assert_eq!(bytes[0], 3);

    let decoded: CommandTree<()> = codec.decode(bytes, &mut providers).unwrap();
    let alias = decoded[decoded.root()].child("alias").unwrap();
    let target = decoded[alias].redirect().unwrap();
    assert_eq!(decoded[target].name(), "hidden");
}

// ============================================================================
// Suggestion providers
// ============================================================================

#[test]
fn test_named_provider_round_trip() {
    let players: SuggestionProvider<()> = SuggestionProvider::empty();
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("msg").then(
                argument("player", ArgumentType::word())
                    .suggests(players.clone())
                    .executes(|_| Ok(1)),
            ),
        )
        .unwrap();

    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let mut sender = SuggestionProviderRegistry::new();
    sender.register("proxy:players", players);
    let bytes = codec.encode(dispatcher.tree(), &sender).unwrap();

    let mut receiver = SuggestionProviderRegistry::new();
    let decoded: CommandTree<()> = codec.decode(bytes.clone(), &mut receiver).unwrap();
    assert!(receiver.contains("proxy:players"));

    let msg = decoded[decoded.root()].child("msg").unwrap();
    let player = decoded[msg].child("player").unwrap();
    let provider = decoded[player].custom_suggestions().unwrap();
    assert_eq!(receiver.name_of(provider), Some("proxy:players"));
    assert_eq!(codec.encode(&decoded, &receiver).unwrap(), bytes);
}

#[test]
fn test_unnamed_provider_falls_back_to_default() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("warp").then(argument("name", ArgumentType::word()).suggests(SuggestionProvider::empty())))
        .unwrap();

    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let bytes = codec.encode(dispatcher.tree(), &SuggestionProviderRegistry::new()).unwrap();
    let tail = &bytes[bytes.len() - 1 - (1 + ASK_SERVER.len())..bytes.len() - 1];
    assert_eq!(tail[0] as usize, ASK_SERVER.len());
    assert_eq!(&tail[1..], ASK_SERVER.as_bytes());
}

// ============================================================================
// Argument parsers across versions
// ============================================================================

#[test]
fn test_passthrough_arguments_relay_verbatim() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("kill")
                .then(argument("targets", ArgumentType::passthrough("minecraft:entity", vec![0x00])).executes(|_| Ok(1))),
        )
        .unwrap();
    dispatcher
        .register(
            literal("tellraw")
                .then(argument("message", ArgumentType::passthrough("minecraft:component", vec![])).executes(|_| Ok(1))),
        )
        .unwrap();

    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let mut providers = SuggestionProviderRegistry::new();
    let bytes = codec.encode(dispatcher.tree(), &providers).unwrap();
    let decoded: CommandTree<()> = codec.decode(bytes.clone(), &mut providers).unwrap();
    assert_same_shape(dispatcher.tree(), &decoded);
    assert_eq!(codec.encode(&decoded, &providers).unwrap(), bytes);
}

#[test]
fn test_parser_id_depends_on_version() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("tellraw").then(argument("message", ArgumentType::passthrough("minecraft:component", vec![]))))
        .unwrap();

    let providers = SuggestionProviderRegistry::new();
    let old = CommandsCodec::new(ProtocolVersion::MINECRAFT_1_21_5)
        .encode(dispatcher.tree(), &providers)
        .unwrap();
    let new = CommandsCodec::new(ProtocolVersion::MINECRAFT_1_21_6)
        .encode(dispatcher.tree(), &providers)
        .unwrap();
    // Parser id sits right before the trailing root index.
    assert_eq!(old[old.len() - 2], 17);
    assert_eq!(new[new.len() - 2], 18);
}

#[test]
fn test_removed_parser_cannot_be_encoded() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("effect").then(argument("effect", ArgumentType::passthrough("minecraft:mob_effect", vec![]))))
        .unwrap();
    let providers = SuggestionProviderRegistry::new();

    assert!(CommandsCodec::new(ProtocolVersion::MINECRAFT_1_19)
        .encode(dispatcher.tree(), &providers)
        .is_ok());
    let err = CommandsCodec::new(ProtocolVersion::MINECRAFT_1_19_3)
        .encode(dispatcher.tree(), &providers)
        .unwrap_err();
    assert!(matches!(err, CodecError::MissingParserId { .. }));
}

// ============================================================================
// Malformed packets
// ============================================================================

#[test]
fn test_cyclic_redirects_fail() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(6).unwrap();
    root_record(&mut w, &[1, 2, 3, 4, 5]);
    literal_record(&mut w, "a", &[], None);
    literal_record(&mut w, "b", &[], Some(5));
    literal_record(&mut w, "c", &[], None);
    literal_record(&mut w, "d", &[], None);
    literal_record(&mut w, "e", &[], Some(2));
    w.write_var_int(0).unwrap();

    match decode_raw(w.into_bytes()) {
        Err(CodecError::UnresolvedNodes { remaining }) => assert_eq!(remaining, 3),
        other => panic!("expected unresolved nodes, got {other:?}"),
    }
}

#[test]
fn test_forward_redirect_resolves() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(3).unwrap();
    literal_record(&mut w, "alias", &[], Some(2));
    root_record(&mut w, &[0, 2]);
    literal_record(&mut w, "real", &[], None);
    w.write_var_int(1).unwrap();

    let tree = decode_raw(w.into_bytes()).unwrap();
    let alias = tree[tree.root()].child("alias").unwrap();
    let real = tree[tree.root()].child("real").unwrap();
    assert_eq!(tree[alias].redirect(), Some(real));
}

#[test]
fn test_duplicate_children_keep_all_grandchildren() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(5).unwrap();
    root_record(&mut w, &[1, 2]);
    literal_record(&mut w, "a", &[3], None);
    literal_record(&mut w, "a", &[4], None);
    literal_record(&mut w, "x", &[], None);
    literal_record(&mut w, "y", &[], None);
    w.write_var_int(0).unwrap();

    let tree = decode_raw(w.into_bytes()).unwrap();
    assert_eq!(tree[tree.root()].children().count(), 1);
    let a = tree[tree.root()].child("a").unwrap();
    assert!(tree[a].child("x").is_some());
    assert!(tree[a].child("y").is_some());
}

#[test]
fn test_child_index_out_of_range() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(1).unwrap();
    root_record(&mut w, &[7]);
    w.write_var_int(0).unwrap();

    assert!(matches!(
        decode_raw(w.into_bytes()),
        Err(CodecError::IndexOutOfRange { node: 0, index: 7, count: 1 })
    ));
}

#[test]
fn test_root_as_child_rejected() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(2).unwrap();
    root_record(&mut w, &[1]);
    literal_record(&mut w, "loop", &[0], None);
    w.write_var_int(0).unwrap();

    assert!(matches!(
        decode_raw(w.into_bytes()),
        Err(CodecError::RootAsChild { parent: 1, child: 0 })
    ));
}

#[test]
fn test_duplicate_root_rejected() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(2).unwrap();
    root_record(&mut w, &[]);
    root_record(&mut w, &[]);
    w.write_var_int(0).unwrap();

    assert!(matches!(decode_raw(w.into_bytes()), Err(CodecError::DuplicateRoot(1))));
}

#[test]
fn test_root_index_must_name_root() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(2).unwrap();
    root_record(&mut w, &[1]);
    literal_record(&mut w, "a", &[], None);
    w.write_var_int(1).unwrap();

    assert!(matches!(decode_raw(w.into_bytes()), Err(CodecError::RootIndexNotRoot(1))));
}

#[test]
fn test_unknown_node_kind() {
    let mut w = PacketWriter::with_limit(1024);
    w.write_var_int(1).unwrap();
    w.write_u8(0x03).unwrap();
    w.write_var_int(0).unwrap();
    w.write_var_int(0).unwrap();

    assert!(matches!(
        decode_raw(w.into_bytes()),
        Err(CodecError::UnknownNodeKind { node: 0, kind: 3 })
    ));
}

#[test]
fn test_truncated_packet() {
    let bytes = CommandsCodec::new(ProtocolVersion::LATEST)
        .encode(grammar().tree(), &SuggestionProviderRegistry::new())
        .unwrap();
    let truncated = bytes.slice(..bytes.len() / 2);
    assert!(matches!(decode_raw(truncated), Err(CodecError::UnexpectedEof { .. })));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_codec_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codec.yaml");
    std::fs::write(&path, "protocol_version: 759\nbuffer_capacity: 16\n").unwrap();

    let config = CodecConfig::load(&path).unwrap();
    let codec = CommandsCodec::from_config(&config);
    assert_eq!(codec.version(), ProtocolVersion::MINECRAFT_1_19);
    assert_eq!(codec.capacity(), 16);
    let err = codec
        .encode(grammar().tree(), &config.provider_registry())
        .unwrap_err();
    assert!(matches!(err, CodecError::PacketTooLarge { .. }));
}
