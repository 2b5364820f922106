//! Commands packet round trip.
//!
//! Builds a dispatcher from a YAML grammar, encodes it for two protocol
//! versions, decodes the modern packet back into a graph the way a proxy
//! would on the client side of a connection, and prints the recovered
//! grammar.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --bin packet_round_trip
//! ```

use command_tree_codec::{CommandsCodec, ProtocolVersion, SuggestionProviderRegistry};
use command_tree_core::{CommandTree, Dispatcher};
use command_tree_grammar::{CommandSource, GrammarDocument};
use tokio_util::sync::CancellationToken;

const GRAMMAR: &str = r#"
name: lobby
description: Commands advertised by a lobby server
commands:
  - name: hub
    executes: true
  - name: server
    children:
      - name: name
        argument: { type: word }
        suggestions: "minecraft:ask_server"
        executes: true
  - name: kick
    permission: 2
    children:
      - name: targets
        argument: { type: passthrough, identifier: "minecraft:entity", properties: [1] }
        executes: true
        children:
          - name: reason
            argument: { type: greedy_string }
            executes: true
  - name: spawn
    executes: true
    redirect: [hub]
"#;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let document = GrammarDocument::from_yaml_str(GRAMMAR)?;
    let mut providers = SuggestionProviderRegistry::new();
    let dispatcher: Dispatcher<CommandSource> = document.build(&mut providers)?;

    for version in [ProtocolVersion::MINECRAFT_1_13, ProtocolVersion::LATEST] {
        let packet = CommandsCodec::new(version).encode(dispatcher.tree(), &providers)?;
        println!("{version}: {} bytes", packet.len());
        println!("  {}", hex(&packet));
    }
    println!();

    let codec = CommandsCodec::new(ProtocolVersion::LATEST);
    let packet = codec.encode(dispatcher.tree(), &providers)?;
    let mut received = SuggestionProviderRegistry::new();
    let tree: CommandTree<CommandSource> = codec.decode(packet.clone(), &mut received)?;
    println!("decoded {} nodes", tree.len());

    // Decoded executors are placeholders; parsing still works end to end.
    let decoded = Dispatcher::from_tree(tree);
    let cancel = CancellationToken::new();
    for input in ["spawn", "server survival", "kick @a"] {
        let outcome = decoded
            .execute_input(input, CommandSource::console(), &cancel)
            .await;
        println!("/{input}: {outcome:?}");
    }

    let recovered = GrammarDocument::from_dispatcher(&decoded, &received)?;
    println!();
    print!("{}", recovered.to_yaml()?);

    let again = codec.encode(decoded.tree(), &received)?;
    println!();
    println!("re-encoded packet identical: {}", again == packet);
    Ok(())
}
