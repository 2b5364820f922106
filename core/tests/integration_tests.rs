use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use command_tree_core::{
    ArgumentType, CommandError, Dispatcher, RedirectModifier, ResultConsumer, StringReader,
    SyntaxErrorKind, argument, literal,
};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&count), count)
}

fn syntax_kind(err: &CommandError) -> &SyntaxErrorKind {
    err.as_syntax().expect("expected a syntax error").kind()
}

// ---------------------------------------------------------------------------
// Dispatch scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_teleport_grammar_dispatch() {
    let (e1_runs, e1_seen) = counter();
    let (e2_runs, e2_seen) = counter();
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("tp")
                .then(literal("here").executes(move |_| {
                    e1_runs.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                }))
                .then(argument("target", ArgumentType::word()).executes(move |ctx| {
                    assert_eq!(ctx.get_string("target")?, "Steve");
                    e2_runs.fetch_add(1, Ordering::SeqCst);
                    Ok(2)
                })),
        )
        .unwrap();
    let cancel = CancellationToken::new();

    assert_eq!(dispatcher.execute_input("tp here", (), &cancel).await.unwrap(), 1);
    assert_eq!(dispatcher.execute_input("tp Steve", (), &cancel).await.unwrap(), 2);
    let err = dispatcher.execute_input("tp", (), &cancel).await.unwrap_err();
    assert_eq!(syntax_kind(&err), &SyntaxErrorKind::UnknownCommand);

    assert_eq!(e1_seen.load(Ordering::SeqCst), 1);
    assert_eq!(e2_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redirect_to_root_runs_executor_once() {
    let (runs, seen) = counter();
    let completions = Arc::new(Mutex::new(Vec::new()));

    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("here").executes(move |_| {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(5)
        }))
        .unwrap();
    let root = dispatcher.root();
    dispatcher.register(literal("tp").redirect(root)).unwrap();

    let recorded = Arc::clone(&completions);
    dispatcher.set_consumer(ResultConsumer::new(move |ctx, success, result| {
        recorded
            .lock()
            .unwrap()
            .push((ctx.input().to_string(), success, result));
    }));

    let cancel = CancellationToken::new();
    let parse = dispatcher.parse("tp tp here", (), &cancel).await.unwrap();
    let context = parse.context();
    assert!(context.child().is_some());
    assert!(context.child().unwrap().child().is_some());

    let result = dispatcher.execute(parse, &cancel).await.unwrap();
    assert_eq!(result, 5);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(
        *completions.lock().unwrap(),
        vec![("tp tp here".to_string(), true, 5)]
    );
}

#[tokio::test]
async fn test_redirect_modifier_transforms_source() {
    let mut dispatcher: Dispatcher<i32> = Dispatcher::new();
    dispatcher
        .register(literal("whoami").executes(|ctx| Ok(*ctx.source())))
        .unwrap();
    let root = dispatcher.root();
    dispatcher
        .register(
            literal("as").then(
                argument("id", ArgumentType::integer()).redirect_with(
                    root,
                    RedirectModifier::single(|ctx| Ok(ctx.get_integer("id")?)),
                ),
            ),
        )
        .unwrap();

    let result = dispatcher
        .execute_input("as 42 whoami", 0, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_failed_modifier_aborts_unforked_chain() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher.register(literal("ok").executes(|_| Ok(1))).unwrap();
    let root = dispatcher.root();
    dispatcher
        .register(literal("broken").redirect_with(
            root,
            RedirectModifier::new(|_| Err(command_tree_core::CommandSyntaxError::custom("no target"))),
        ))
        .unwrap();

    let err = dispatcher
        .execute_input("broken ok", (), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no target");
}

#[tokio::test]
async fn test_escaped_quote_in_string_argument() {
    let captured = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&captured);

    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("say").then(argument("message", ArgumentType::string()).executes(
            move |ctx| {
                *sink.lock().unwrap() = ctx.get_string("message")?.to_string();
                Ok(1)
            },
        )))
        .unwrap();

    dispatcher
        .execute_input(r#"say "hi\"there""#, (), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(*captured.lock().unwrap(), "hi\"there");
}

// ---------------------------------------------------------------------------
// Parse properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_literal_matches_only_whole_tokens() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("foo").executes(|_| Ok(1)).then(literal("bar").executes(|_| Ok(2))))
        .unwrap();
    let cancel = CancellationToken::new();

    assert_eq!(dispatcher.execute_input("foo", (), &cancel).await.unwrap(), 1);
    assert_eq!(dispatcher.execute_input("foo bar", (), &cancel).await.unwrap(), 2);
    for input in ["foobar", "fo", "Foo", "bar"] {
        let err = dispatcher.execute_input(input, (), &cancel).await.unwrap_err();
        assert_eq!(syntax_kind(&err), &SyntaxErrorKind::UnknownCommand, "{input}");
    }
}

#[tokio::test]
async fn test_tie_break_prefers_registration_order() {
    async fn winner(first: &str, second: &str) -> i32 {
        let mut dispatcher: Dispatcher<()> = Dispatcher::new();
        let value = |name: &str| if name == "word" { 1 } else { 2 };
        let first_value = value(first);
        let second_value = value(second);
        let ty = |name: &str| {
            if name == "word" {
                ArgumentType::word()
            } else {
                ArgumentType::string()
            }
        };
        dispatcher
            .register(
                literal("pick")
                    .then(argument(first, ty(first)).executes(move |_| Ok(first_value)))
                    .then(argument(second, ty(second)).executes(move |_| Ok(second_value))),
            )
            .unwrap();
        dispatcher
            .execute_input("pick Steve", (), &CancellationToken::new())
            .await
            .unwrap()
    }

    assert_eq!(winner("word", "phrase").await, 1);
    assert_eq!(winner("phrase", "word").await, 2);
    for _ in 0..5 {
        assert_eq!(winner("word", "phrase").await, 1);
    }
}

#[tokio::test]
async fn test_full_consumption_beats_registration_order() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("msg")
                .then(argument("word", ArgumentType::word()).executes(|_| Ok(1)))
                .then(argument("text", ArgumentType::greedy_string()).executes(|_| Ok(2))),
        )
        .unwrap();

    let result = dispatcher
        .execute_input("msg hello there", (), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result, 2);
}

#[tokio::test]
async fn test_failure_reproduces_from_recorded_cursor() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("give").then(
                argument("target", ArgumentType::word())
                    .then(argument("count", ArgumentType::integer_between(1, 64)).executes(|_| Ok(1))),
            ),
        )
        .unwrap();
    let cancel = CancellationToken::new();

    for input in ["give Steve lots", "give Steve 65"] {
        let err = dispatcher.execute_input(input, (), &cancel).await.unwrap_err();
        let err = err.as_syntax().unwrap().clone();
        let cursor = err.cursor().unwrap();

        let mut reader = StringReader::new(input);
        reader.set_cursor(cursor);
        let again = ArgumentType::integer_between(1, 64).parse(&mut reader).unwrap_err();
        assert_eq!(again, err, "{input}");

        let second = dispatcher.execute_input(input, (), &cancel).await.unwrap_err();
        assert_eq!(second.as_syntax(), Some(&err));
    }
}

#[tokio::test]
async fn test_trailing_input_is_unknown_argument() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("time").then(literal("set").executes(|_| Ok(1))))
        .unwrap();

    let err = dispatcher
        .execute_input("time set day", (), &CancellationToken::new())
        .await
        .unwrap_err();
    let err = err.as_syntax().unwrap();
    assert_eq!(err.kind(), &SyntaxErrorKind::UnknownArgument);
    assert_eq!(err.cursor(), Some(9));
}

// ---------------------------------------------------------------------------
// Suggestions and usage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_suggestions_follow_redirects() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("gamemode").then(literal("creative").executes(|_| Ok(1))))
        .unwrap();
    dispatcher
        .register(literal("gamerule").then(argument("enabled", ArgumentType::bool()).executes(|_| Ok(1))))
        .unwrap();
    let root = dispatcher.root();
    dispatcher.register(literal("execute").redirect(root)).unwrap();
    let cancel = CancellationToken::new();

    let suggestions = dispatcher.suggest_input("execute game", (), &cancel).await.unwrap();
    assert_eq!(suggestions.texts(), vec!["gamemode", "gamerule"]);
    assert_eq!(suggestions.range().start(), 8);

    let suggestions = dispatcher.suggest_input("gamerule t", (), &cancel).await.unwrap();
    assert_eq!(suggestions.texts(), vec!["true"]);
}

#[tokio::test]
async fn test_suggest_at_cursor_inside_input() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(literal("weather").then(literal("clear").executes(|_| Ok(1))))
        .unwrap();
    dispatcher.register(literal("whitelist").executes(|_| Ok(1))).unwrap();
    let cancel = CancellationToken::new();

    let parse = dispatcher.parse("weather clear", (), &cancel).await.unwrap();
    let suggestions = dispatcher.suggest(&parse, Some(1), &cancel).await.unwrap();
    assert_eq!(suggestions.texts(), vec!["weather", "whitelist"]);
    assert_eq!(suggestions.range().start(), 0);
}

#[tokio::test]
async fn test_suggest_literal_after_multibyte_argument() {
    let mut dispatcher: Dispatcher<()> = Dispatcher::new();
    dispatcher
        .register(
            literal("say").then(
                argument("who", ArgumentType::string())
                    .then(literal("foo").executes(|_| Ok(1)))
                    .then(literal("bar").executes(|_| Ok(2))),
            ),
        )
        .unwrap();
    let cancel = CancellationToken::new();

    let suggestions = dispatcher
        .suggest_input("say \"İ\" Fo", (), &cancel)
        .await
        .unwrap();
    assert_eq!(suggestions.texts(), vec!["foo"]);
    assert_eq!(suggestions.range().start(), "say \"İ\" ".len());
}

#[tokio::test]
async fn test_usage_hides_restricted_commands() {
    let mut dispatcher: Dispatcher<u8> = Dispatcher::new();
    dispatcher.register(literal("help").executes(|_| Ok(1))).unwrap();
    dispatcher
        .register(literal("ban").requires(|level| *level >= 3).then(argument("player", ArgumentType::word()).executes(|_| Ok(1))))
        .unwrap();
    let cancel = CancellationToken::new();
    let root = dispatcher.root();

    let guest = dispatcher.get_all_usage(root, &0, true, &cancel).await.unwrap();
    assert_eq!(guest, vec!["help"]);

    let admin = dispatcher.get_all_usage(root, &3, true, &cancel).await.unwrap();
    assert_eq!(admin, vec!["help", "ban <player>"]);

    let smart = dispatcher.get_smart_usage(root, &0, &cancel).await.unwrap();
    assert_eq!(smart.len(), 1);
}
