//! Builder API example.
//!
//! Registers a small teleport grammar with typed arguments, a redirect
//! alias, an `execute as` modifier and a custom suggestion provider, then
//! runs, completes and describes a few inputs.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-tree-demos --bin teleport
//! ```

use command_tree_core::{
    ArgumentType, CommandContext, CommandResult, Dispatcher, RedirectModifier,
    SuggestionProvider, argument, literal,
};
use tokio_util::sync::CancellationToken;

type Ctx = CommandContext<Player>;

const ONLINE: [&str; 3] = ["Alex", "Steve", "Sunny"];

#[derive(Debug, Clone)]
struct Player {
    name: String,
    operator: bool,
}

impl Player {
    fn new(name: &str, operator: bool) -> Self {
        Self {
            name: name.to_string(),
            operator,
        }
    }
}

fn online_players() -> SuggestionProvider<Player> {
    SuggestionProvider::new(|_, mut builder| {
        let typed = builder.remaining_lowercase().to_string();
        for name in ONLINE {
            if name.to_lowercase().starts_with(&typed) {
                builder.suggest(name);
            }
        }
        Ok(builder.build())
    })
}

fn register(dispatcher: &mut Dispatcher<Player>) -> Result<(), Box<dyn std::error::Error>> {
    let tp = dispatcher.register(
        literal("tp")
            .requires(|player: &Player| player.operator)
            .then(
                argument("x", ArgumentType::double())
                    .then(argument("y", ArgumentType::double_between(-64.0, 320.0)).then(
                        argument("z", ArgumentType::double()).executes(|ctx: &Ctx| {
                            let (x, y, z) = (
                                ctx.get_double("x")?,
                                ctx.get_double("y")?,
                                ctx.get_double("z")?,
                            );
                            println!("  {} -> ({x}, {y}, {z})", ctx.source().name);
                            Ok(1)
                        }),
                    )),
            )
            .then(
                argument("target", ArgumentType::word())
                    .suggests(online_players())
                    .executes(|ctx: &Ctx| {
                        println!("  {} -> {}", ctx.source().name, ctx.get_string("target")?);
                        Ok(1)
                    }),
            ),
    )?;
    dispatcher.register(literal("teleport").redirect(tp))?;

    let root = dispatcher.root();
    let execute = dispatcher.register(literal("execute").then(literal("run").redirect(root)))?;
    dispatcher.register(
        literal("execute").then(
            literal("as").then(
                argument("player", ArgumentType::word())
                    .suggests(online_players())
                    .redirect_with(
                        execute,
                        RedirectModifier::single(|ctx: &Ctx| {
                            let name = ctx.get_string("player")?;
                            Ok(Player::new(name, ctx.source().operator))
                        }),
                    ),
            ),
        ),
    )?;
    Ok(())
}

async fn run(dispatcher: &Dispatcher<Player>, input: &str, player: &Player) -> CommandResult<i32> {
    dispatcher
        .execute_input(input, player.clone(), &CancellationToken::new())
        .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut dispatcher = Dispatcher::new();
    register(&mut dispatcher)?;
    let cancel = CancellationToken::new();
    let op = Player::new("Server", true);
    let guest = Player::new("Guest", false);

    println!("Usage for an operator:");
    for line in dispatcher.get_smart_usage(dispatcher.root(), &op, &cancel).await?.values() {
        println!("  /{line}");
    }
    println!();

    for input in [
        "tp 10 64 -5",
        "teleport Alex",
        "execute as Steve run tp Sunny",
        "tp 0 999 0",
        "tpp Alex",
    ] {
        println!("/{input}");
        match run(&dispatcher, input, &op).await {
            Ok(result) => println!("  = {result}"),
            Err(err) => println!("  ! {err}"),
        }
    }

    println!("/tp Alex (as {})", guest.name);
    if let Err(err) = run(&dispatcher, "tp Alex", &guest).await {
        println!("  ! {err}");
    }
    println!();

    for partial in ["t", "tp S", "execute as A"] {
        let suggestions = dispatcher.suggest_input(partial, op.clone(), &cancel).await?;
        println!("complete {partial:?}: {:?}", suggestions.texts());
    }

    dispatcher.find_ambiguities(|parent, child, sibling, inputs| {
        let tree = dispatcher.tree();
        println!(
            "ambiguity under {:?}: {} vs {} on {inputs:?}",
            dispatcher.get_path(parent),
            tree[child].usage_text(),
            tree[sibling].usage_text()
        );
    });
    Ok(())
}
