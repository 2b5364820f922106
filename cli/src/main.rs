use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_tree_codec::{CodecConfig, CommandsCodec, ProtocolVersion, SuggestionProviderRegistry};
use command_tree_core::{CommandTree, Dispatcher};
use command_tree_grammar::{CommandSource, GrammarDocument, validate_document};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "command-tree")]
#[command(about = "Inspect, run and transcode command grammars")]
struct Cli {
    /// Codec configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Protocol version number; overrides the configuration file.
    #[arg(long, global = true)]
    protocol: Option<i32>,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print usage lines for a grammar.
    Usage(UsageArgs),
    /// Parse and execute one input line against a grammar.
    Run(RunArgs),
    /// List completions for a partial input line.
    Suggest(SuggestArgs),
    /// Encode a grammar into a Commands packet body.
    Encode(EncodeArgs),
    /// Decode a Commands packet body into a grammar document.
    Decode(DecodeArgs),
    /// Validate one or more grammar documents.
    Validate(ValidateArgs),
    /// Report sibling nodes that accept the same input.
    Ambiguities(AmbiguitiesArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Permission level of the invoking source.
    #[arg(long, default_value_t = 0)]
    permission: u32,
    /// Name of the invoking source.
    #[arg(long, default_value = "Player")]
    name: String,
}

impl SourceArgs {
    fn source(&self) -> CommandSource {
        CommandSource::new(self.name.as_str(), self.permission)
    }
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Grammar document (.json, .yaml or .yml).
    grammar: PathBuf,
    /// List every path instead of one compact line per command.
    #[arg(long)]
    all: bool,
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct RunArgs {
    grammar: PathBuf,
    /// Command line to execute, without a leading slash.
    input: String,
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    grammar: PathBuf,
    input: String,
    /// Cursor position in bytes (default: end of input).
    #[arg(long)]
    cursor: Option<usize>,
    /// Print suggestions as JSON.
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Args)]
struct EncodeArgs {
    grammar: PathBuf,
    /// Output packet path.
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Packet body produced by `encode` or captured from a server.
    packet: PathBuf,
    /// Output grammar path; YAML on stdout when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Name recorded in the decoded document.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(required = true)]
    grammars: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct AmbiguitiesArgs {
    grammar: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_config(cli.config.as_deref(), cli.protocol) {
        Ok(config) => run(cli.command, &config).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>, protocol: Option<i32>) -> Result<CodecConfig, String> {
    let mut config = match path {
        Some(path) => CodecConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => CodecConfig::default(),
    };
    if let Some(protocol) = protocol {
        config.protocol_version = ProtocolVersion(protocol);
    }
    debug!(
        protocol = %config.protocol_version,
        capacity = config.buffer_capacity,
        "codec configuration"
    );
    Ok(config)
}

async fn run(command: Command, config: &CodecConfig) -> Result<(), String> {
    match command {
        Command::Usage(args) => run_usage(args, config).await,
        Command::Run(args) => run_execute(args, config).await,
        Command::Suggest(args) => run_suggest(args, config).await,
        Command::Encode(args) => run_encode(args, config),
        Command::Decode(args) => run_decode(args, config),
        Command::Validate(args) => run_validate(args),
        Command::Ambiguities(args) => run_ambiguities(args, config),
    }
}

fn load_grammar(path: &Path) -> Result<GrammarDocument, String> {
    GrammarDocument::load(path)
        .map_err(|err| format!("Failed to load grammar '{}': {err}", path.display()))
}

fn build_dispatcher(
    path: &Path,
    config: &CodecConfig,
) -> Result<(Dispatcher<CommandSource>, SuggestionProviderRegistry<CommandSource>), String> {
    let document = load_grammar(path)?;
    let mut providers = config.provider_registry();
    let dispatcher = document
        .build(&mut providers)
        .map_err(|err| format!("Invalid grammar '{}': {err}", path.display()))?;
    Ok((dispatcher, providers))
}

async fn run_usage(args: UsageArgs, config: &CodecConfig) -> Result<(), String> {
    let (dispatcher, _) = build_dispatcher(&args.grammar, config)?;
    let source = args.source.source();
    let cancel = CancellationToken::new();
    let root = dispatcher.root();

    let lines = if args.all {
        dispatcher
            .get_all_usage(root, &source, true, &cancel)
            .await
            .map_err(|err| err.to_string())?
    } else {
        dispatcher
            .get_smart_usage(root, &source, &cancel)
            .await
            .map_err(|err| err.to_string())?
            .into_values()
            .collect()
    };
    for line in lines {
        println!("/{line}");
    }
    Ok(())
}

async fn run_execute(args: RunArgs, config: &CodecConfig) -> Result<(), String> {
    let (dispatcher, _) = build_dispatcher(&args.grammar, config)?;
    let cancel = CancellationToken::new();
    let input = args.input.strip_prefix('/').unwrap_or(&args.input);
    let result = dispatcher
        .execute_input(input, args.source.source(), &cancel)
        .await
        .map_err(|err| err.to_string())?;
    println!("{result}");
    Ok(())
}

async fn run_suggest(args: SuggestArgs, config: &CodecConfig) -> Result<(), String> {
    let (dispatcher, _) = build_dispatcher(&args.grammar, config)?;
    let cancel = CancellationToken::new();
    let parse = dispatcher
        .parse(args.input.as_str(), args.source.source(), &cancel)
        .await
        .map_err(|err| err.to_string())?;
    let suggestions = dispatcher
        .suggest(&parse, args.cursor, &cancel)
        .await
        .map_err(|err| err.to_string())?;

    if args.json {
        let list: Vec<serde_json::Value> = suggestions
            .list()
            .iter()
            .map(|suggestion| {
                serde_json::json!({
                    "text": suggestion.text(),
                    "start": suggestion.range().start(),
                    "end": suggestion.range().end(),
                    "tooltip": suggestion.tooltip(),
                })
            })
            .collect();
        let raw = serde_json::to_string_pretty(&list)
            .map_err(|err| format!("Failed to serialize suggestions: {err}"))?;
        println!("{raw}");
    } else {
        for suggestion in suggestions.list() {
            println!("{suggestion}");
        }
    }
    Ok(())
}

fn run_encode(args: EncodeArgs, config: &CodecConfig) -> Result<(), String> {
    let (dispatcher, providers) = build_dispatcher(&args.grammar, config)?;
    let codec = CommandsCodec::from_config(config);
    let packet = codec
        .encode(dispatcher.tree(), &providers)
        .map_err(|err| format!("Failed to encode '{}': {err}", args.grammar.display()))?;

    create_parent_dir(&args.output)?;
    fs::write(&args.output, &packet)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!(
        "Encoded {} node(s) into {} byte(s) for protocol {}.",
        dispatcher.tree().len(),
        packet.len(),
        codec.version()
    );
    Ok(())
}

fn run_decode(args: DecodeArgs, config: &CodecConfig) -> Result<(), String> {
    let data = fs::read(&args.packet)
        .map_err(|err| format!("Failed to read '{}': {err}", args.packet.display()))?;
    let codec = CommandsCodec::from_config(config);
    let mut providers = config.provider_registry();
    let tree: CommandTree<CommandSource> = codec
        .decode(data, &mut providers)
        .map_err(|err| format!("Failed to decode '{}': {err}", args.packet.display()))?;

    let mut document = GrammarDocument::from_tree(&tree, &providers)
        .map_err(|err| format!("Failed to export decoded graph: {err}"))?;
    document.name = args.name.or_else(|| {
        args.packet
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    });
    document.generated_at = Some(chrono::Utc::now().to_rfc3339());

    match &args.output {
        Some(output) => {
            create_parent_dir(output)?;
            document
                .save(output)
                .map_err(|err| format!("Failed to write '{}': {err}", output.display()))?;
            println!(
                "Decoded {} node(s) into '{}'.",
                document.node_count(),
                output.display()
            );
        }
        None => {
            let raw = document
                .to_yaml()
                .map_err(|err| format!("Failed to serialize grammar: {err}"))?;
            print!("{raw}");
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut invalid = 0usize;
    let mut commands = 0usize;
    for path in &args.grammars {
        let document = load_grammar(path)?;
        let errors = validate_document(&document);
        if errors.is_empty() {
            commands += document.commands.len();
            continue;
        }
        invalid += 1;
        eprintln!("{}:", path.display());
        for err in errors {
            eprintln!("  {err}");
        }
    }

    if invalid > 0 {
        return Err(format!("{invalid} of {} grammar file(s) are invalid", args.grammars.len()));
    }
    println!(
        "Validated {} grammar file(s) with {commands} command(s).",
        args.grammars.len()
    );
    Ok(())
}

fn run_ambiguities(args: AmbiguitiesArgs, config: &CodecConfig) -> Result<(), String> {
    let (dispatcher, _) = build_dispatcher(&args.grammar, config)?;
    let mut found = 0usize;
    dispatcher.find_ambiguities(|parent, child, sibling, inputs| {
        found += 1;
        let path = dispatcher.get_path(parent).join(" ");
        let tree = dispatcher.tree();
        println!(
            "{}: {} and {} both accept {}",
            if path.is_empty() { "/" } else { path.as_str() },
            tree[child].usage_text(),
            tree[sibling].usage_text(),
            inputs.join(", ")
        );
    });
    if found == 0 {
        println!("No ambiguities found.");
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    Ok(())
}
