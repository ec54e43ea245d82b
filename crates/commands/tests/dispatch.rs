//! End-to-end dispatch through the public API with in-memory collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    regnum_channels::{
        AllPermissions, Author, ChannelOutbound, InboundMessage, NoPermissions,
        PermissionContext, StaticInformationProvider,
    },
    regnum_commands::{
        Command, CommandClient, CommandEvent, CommandHandler, CommandListener, DispatchOutcome,
        IgnoreReason, InvocationContext, PermissionGate, PermissionPolicy,
    },
    regnum_common::types::{ChannelId, GuildId, MessageId, UserId},
    regnum_config::CommandsConfig,
    tokio::sync::{broadcast, mpsc},
};

const GUILD: GuildId = GuildId(1);
const CHANNEL: ChannelId = ChannelId(10);
const ALICE: UserId = UserId(100);
const OWNER: UserId = UserId(900);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Text(ChannelId, String),
    Direct(UserId, String),
    Typing(ChannelId),
}

struct Recorder(mpsc::UnboundedSender<Sent>);

#[async_trait]
impl ChannelOutbound for Recorder {
    async fn send_text(&self, channel: ChannelId, text: &str) -> regnum_channels::Result<()> {
        let _ = self.0.send(Sent::Text(channel, text.to_string()));
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> regnum_channels::Result<()> {
        let _ = self.0.send(Sent::Direct(user, text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, channel: ChannelId) -> regnum_channels::Result<()> {
        let _ = self.0.send(Sent::Typing(channel));
        Ok(())
    }
}

struct Harness {
    client: CommandClient,
    sent: mpsc::UnboundedReceiver<Sent>,
    events: broadcast::Receiver<CommandEvent>,
}

impl Harness {
    async fn next_sent(&mut self) -> Sent {
        tokio::time::timeout(Duration::from_secs(5), self.sent.recv())
            .await
            .expect("timed out waiting for outbound message")
            .expect("outbound channel closed")
    }

    async fn next_text(&mut self) -> String {
        loop {
            match self.next_sent().await {
                Sent::Text(_, text) => return text,
                Sent::Typing(_) => continue,
                other => panic!("expected a channel message, got {other:?}"),
            }
        }
    }

    async fn next_event(&mut self) -> CommandEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event bus closed")
    }

    fn send(&self, content: &str) -> DispatchOutcome {
        self.client.dispatch(message(content, ALICE))
    }
}

fn quiet_config() -> CommandsConfig {
    CommandsConfig {
        send_typing: false,
        owners: vec![OWNER.get()],
        ..Default::default()
    }
}

fn message(content: &str, user: UserId) -> InboundMessage {
    InboundMessage::new(
        MessageId(1),
        content,
        Author::user(user, "alice"),
        Some(GUILD),
        CHANNEL,
    )
}

fn echo() -> Arc<Command> {
    Command::builder("Echo")
        .aliases(["echo", "say"])
        .description("Repeat the arguments")
        .run(|ctx: Arc<InvocationContext>| async move {
            ctx.respond(&ctx.args().join()).await?;
            anyhow::Ok(())
        })
        .build()
}

/// Replies with the resolved command's name and its arguments.
fn reporter(name: &str) -> Arc<Command> {
    Command::builder(name)
        .run(|ctx: Arc<InvocationContext>| async move {
            let reply = format!("{}:{}", ctx.command().name(), ctx.args().join());
            ctx.respond(&reply).await?;
            anyhow::Ok(())
        })
        .build()
}

fn build(
    config: CommandsConfig,
    info: StaticInformationProvider,
    permissions: Arc<dyn PermissionContext>,
) -> Harness {
    let (tx, sent) = mpsc::unbounded_channel();
    let client = CommandClient::builder()
        .config(&config)
        .outbound(Arc::new(Recorder(tx)))
        .information_provider(Arc::new(info))
        .permission_context(permissions)
        .bot_user_id(UserId(123))
        .command(echo())
        .build()
        .unwrap();
    let events = client.event_bus().unwrap().subscribe();
    Harness {
        client,
        sent,
        events,
    }
}

fn harness() -> Harness {
    build(
        quiet_config(),
        StaticInformationProvider::new(),
        Arc::new(NoPermissions),
    )
}

#[tokio::test]
async fn default_prefix_runs_command_with_arguments() {
    let mut h = harness();
    assert_eq!(h.send("!echo Hi I am cool"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "Hi I am cool");
}

#[tokio::test]
async fn aliases_ignore_case() {
    let mut h = harness();
    for text in ["!SAY one", "!Echo two", "!eChO three"] {
        assert_eq!(h.send(text), DispatchOutcome::Submitted);
    }
    let mut replies = vec![
        h.next_text().await,
        h.next_text().await,
        h.next_text().await,
    ];
    replies.sort();
    assert_eq!(replies, ["one", "three", "two"]);
}

#[tokio::test]
async fn guild_prefix_override() {
    let mut h = build(
        quiet_config(),
        StaticInformationProvider::new().with_prefix(GUILD, "?"),
        Arc::new(NoPermissions),
    );
    assert_eq!(h.send("!echo x"), DispatchOutcome::Ignored(IgnoreReason::NoPrefix));
    assert_eq!(h.send("?echo y"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "y");
    assert_eq!(h.client.effective_prefix(Some(GUILD)), "?");
}

#[tokio::test]
async fn always_default_prefix_beats_override() {
    let mut h = build(
        CommandsConfig {
            always_default_prefix: true,
            ..quiet_config()
        },
        StaticInformationProvider::new().with_prefix(GUILD, "?"),
        Arc::new(NoPermissions),
    );
    assert_eq!(h.send("!echo a"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "a");
    assert_eq!(h.send("?echo b"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "b");
}

#[tokio::test]
async fn mention_prefix() {
    let mut h = harness();
    assert_eq!(h.send("<@123> echo hey"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "hey");

    let off = build(
        CommandsConfig {
            accept_mention_prefix: false,
            ..quiet_config()
        },
        StaticInformationProvider::new(),
        Arc::new(NoPermissions),
    );
    assert_eq!(
        off.send("<@123> echo hey"),
        DispatchOutcome::Ignored(IgnoreReason::NoPrefix)
    );
}

#[tokio::test]
async fn non_commands_are_ignored_silently() {
    let mut h = harness();
    assert_eq!(h.send("hello"), DispatchOutcome::Ignored(IgnoreReason::NoPrefix));
    assert_eq!(h.send("!   "), DispatchOutcome::Ignored(IgnoreReason::NoTokens));
    assert_eq!(
        h.send("!nothing here"),
        DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
    );
    assert!(h.sent.try_recv().is_err());
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn automated_authors_are_ignored() {
    let h = harness();
    for flag in 0..3 {
        let mut msg = message("!echo bot", ALICE);
        match flag {
            0 => msg.author.bot = true,
            1 => msg.author.webhook = true,
            _ => msg.author.system = true,
        }
        assert_eq!(
            h.client.dispatch(msg),
            DispatchOutcome::Ignored(IgnoreReason::AutomatedAuthor)
        );
    }
}

#[tokio::test]
async fn edits_are_dispatched_only_when_enabled() {
    let h = harness();
    assert_eq!(
        h.client.dispatch(message("!echo edited", ALICE).edited()),
        DispatchOutcome::Ignored(IgnoreReason::EditedMessage)
    );

    let mut on = build(
        CommandsConfig {
            dispatch_edits: true,
            ..quiet_config()
        },
        StaticInformationProvider::new(),
        Arc::new(NoPermissions),
    );
    assert_eq!(
        on.client.dispatch(message("!echo edited", ALICE).edited()),
        DispatchOutcome::Submitted
    );
    assert_eq!(on.next_text().await, "edited");
}

#[tokio::test]
async fn deepest_subcommand_receives_remaining_tokens() {
    let mut h = harness();
    let test = reporter("test");
    let hi = reporter("hi");
    let i = reporter("i");
    hi.register_subcommand(i);
    test.register_subcommand(hi);
    h.client.register_command(test);

    h.send("!test hi i extra");
    assert_eq!(h.next_text().await, "i:extra");

    h.send("!test hi unknown");
    assert_eq!(h.next_text().await, "hi:unknown");

    h.send("!TEST HI");
    assert_eq!(h.next_text().await, "hi:");
}

#[tokio::test]
async fn group_without_body_replies_with_usage() {
    let mut h = harness();
    let about = Command::builder("About")
        .alias("about")
        .description("Bot information")
        .build();
    about.register_subcommand(reporter("version"));
    h.client.register_command(about);

    h.send("!about");
    let usage = h.next_text().await;
    assert!(usage.starts_with("**About** - Help"), "{usage}");
    assert!(usage.contains("Subcommands:"), "{usage}");
    assert!(usage.contains("!about version"), "{usage}");
}

#[tokio::test]
async fn typing_indicator_when_enabled() {
    let mut h = build(
        CommandsConfig {
            send_typing: true,
            ..quiet_config()
        },
        StaticInformationProvider::new(),
        Arc::new(NoPermissions),
    );
    h.send("!echo typed");

    let mut seen = vec![h.next_sent().await, h.next_sent().await];
    seen.sort_by_key(|s| matches!(s, Sent::Text(..)));
    assert_eq!(seen, [
        Sent::Typing(CHANNEL),
        Sent::Text(CHANNEL, "typed".into())
    ]);
}

fn shutdown() -> Arc<Command> {
    Command::builder("shutdown")
        .permission(PermissionPolicy::OwnerExclusive)
        .run(|ctx: Arc<InvocationContext>| async move {
            ctx.respond("bye").await?;
            anyhow::Ok(())
        })
        .build()
}

#[tokio::test]
async fn denied_invocation_publishes_violation_and_notifies() {
    let mut h = harness();
    let cmd = shutdown();
    h.client.register_command(Arc::clone(&cmd));

    assert_eq!(h.send("!shutdown now"), DispatchOutcome::Denied);

    match h.next_event().await {
        CommandEvent::PermissionViolation {
            command, principal, ..
        } => {
            assert!(Arc::ptr_eq(&command, &cmd));
            assert_eq!(principal.id, ALICE);
        },
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        h.next_sent().await,
        Sent::Direct(ALICE, "Sorry alice, you are not allowed to run `shutdown`.".into())
    );
}

/// Delivers channel messages but fails every typing indicator and direct
/// message.
struct NoDirectMessages(mpsc::UnboundedSender<Sent>);

#[async_trait]
impl ChannelOutbound for NoDirectMessages {
    async fn send_text(&self, channel: ChannelId, text: &str) -> regnum_channels::Result<()> {
        let _ = self.0.send(Sent::Text(channel, text.to_string()));
        Ok(())
    }

    async fn send_direct(&self, _user: UserId, _text: &str) -> regnum_channels::Result<()> {
        Err(regnum_channels::Error::unavailable("direct messages are closed"))
    }

    async fn send_typing(&self, _channel: ChannelId) -> regnum_channels::Result<()> {
        Err(regnum_channels::Error::unavailable("typing is rate limited"))
    }
}

#[tokio::test]
async fn outbound_failures_around_denial_are_swallowed() {
    let (tx, sent) = mpsc::unbounded_channel();
    let client = CommandClient::builder()
        .config(&CommandsConfig {
            send_typing: true,
            ..quiet_config()
        })
        .outbound(Arc::new(NoDirectMessages(tx)))
        .permission_context(Arc::new(NoPermissions))
        .command(echo())
        .command(shutdown())
        .build()
        .unwrap();
    let events = client.event_bus().unwrap().subscribe();
    let mut h = Harness {
        client,
        sent,
        events,
    };

    assert_eq!(h.send("!shutdown"), DispatchOutcome::Denied);
    assert!(matches!(
        h.next_event().await,
        CommandEvent::PermissionViolation { .. }
    ));

    assert_eq!(h.send("!echo fine"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "fine");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.events.try_recv().is_err(), "exactly one violation event");
}

#[tokio::test]
async fn owners_bypass_policies_when_enabled() {
    let mut h = harness();
    h.client.register_command(shutdown());
    h.client.register_command(
        Command::builder("ban")
            .permission(PermissionPolicy::DiscordPermissionNode("BAN_MEMBERS".into()))
            .run(|ctx: Arc<InvocationContext>| async move {
                ctx.respond("banned").await?;
                anyhow::Ok(())
            })
            .build(),
    );

    assert_eq!(
        h.client.dispatch(message("!ban someone", OWNER)),
        DispatchOutcome::Submitted
    );
    assert_eq!(h.next_text().await, "banned");

    let strict = build(
        CommandsConfig {
            owner_bypass: false,
            ..quiet_config()
        },
        StaticInformationProvider::new(),
        Arc::new(NoPermissions),
    );
    strict.client.register_command(shutdown());
    strict.client.register_command(
        Command::builder("ban")
            .permission(PermissionPolicy::DiscordPermissionNode("BAN_MEMBERS".into()))
            .build(),
    );
    assert_eq!(
        strict.client.dispatch(message("!ban someone", OWNER)),
        DispatchOutcome::Denied
    );
    // OwnerExclusive still admits owners without the bypass.
    assert_eq!(
        strict.client.dispatch(message("!shutdown", OWNER)),
        DispatchOutcome::Submitted
    );
}

#[tokio::test]
async fn information_provider_can_name_owners() {
    let mut h = build(
        quiet_config(),
        StaticInformationProvider::new().with_owner(ALICE),
        Arc::new(NoPermissions),
    );
    h.client.register_command(shutdown());
    assert_eq!(h.send("!shutdown"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "bye");
}

#[tokio::test]
async fn platform_permissions_are_consulted() {
    let mut h = build(
        quiet_config(),
        StaticInformationProvider::new(),
        Arc::new(AllPermissions),
    );
    h.client.register_command(
        Command::builder("purge")
            .permission(PermissionPolicy::parse("discord:manage_messages"))
            .run(|ctx: Arc<InvocationContext>| async move {
                ctx.respond("purged").await?;
                anyhow::Ok(())
            })
            .build(),
    );
    h.client.register_command(
        Command::builder("weird")
            .permission(PermissionPolicy::parse("moderators"))
            .build(),
    );

    assert_eq!(h.send("!purge 10"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "purged");
    assert_eq!(h.send("!weird"), DispatchOutcome::Denied);
}

#[tokio::test]
async fn custom_gate_and_message_factory() {
    struct OnlyEcho;
    impl PermissionGate for OnlyEcho {
        fn is_allowed(&self, ctx: &InvocationContext) -> bool {
            ctx.command().name() == "Echo"
        }
    }

    let (tx, mut sent) = mpsc::unbounded_channel();
    let client = CommandClient::builder()
        .config(&quiet_config())
        .outbound(Arc::new(Recorder(tx)))
        .permission_gate(Arc::new(OnlyEcho))
        .permission_error_message(Arc::new(|ctx: &InvocationContext| {
            format!("no {} for you", ctx.command().primary_alias())
        }))
        .commands([echo(), reporter("other")])
        .build()
        .unwrap();

    assert_eq!(
        client.dispatch(message("!other", ALICE)),
        DispatchOutcome::Denied
    );
    let notice = tokio::time::timeout(Duration::from_secs(5), sent.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notice, Sent::Direct(ALICE, "no other for you".into()));
}

#[tokio::test]
async fn failures_are_isolated() {
    let mut h = harness();
    let broken = Command::builder("broken")
        .run(|_ctx: Arc<InvocationContext>| async move {
            Err::<(), _>(anyhow::anyhow!("database unreachable"))
        })
        .build();
    h.client.register_command(Arc::clone(&broken));

    assert_eq!(h.send("!broken"), DispatchOutcome::Submitted);
    match h.next_event().await {
        CommandEvent::CommandFailure {
            command, error, ..
        } => {
            assert!(Arc::ptr_eq(&command, &broken));
            assert_eq!(error.to_string(), "database unreachable");
        },
        other => panic!("unexpected event {other:?}"),
    }

    assert_eq!(h.send("!echo still alive"), DispatchOutcome::Submitted);
    assert_eq!(h.next_text().await, "still alive");
    assert!(h.events.try_recv().is_err(), "exactly one failure event");
}

#[tokio::test]
async fn panics_become_failures() {
    let mut h = harness();
    h.client.register_command(
        Command::builder("explode")
            .run(|_ctx: Arc<InvocationContext>| async move {
                if true {
                    panic!("kaboom");
                }
                anyhow::Ok(())
            })
            .build(),
    );

    h.send("!explode");
    match h.next_event().await {
        CommandEvent::CommandFailure { error, .. } => {
            assert!(error.to_string().contains("kaboom"), "{error}");
        },
        other => panic!("unexpected event {other:?}"),
    }

    h.send("!echo fine");
    assert_eq!(h.next_text().await, "fine");
}

/// Panics while building its future instead of while running it.
struct EagerPanic;

impl CommandHandler for EagerPanic {
    fn execute<'life0, 'async_trait>(
        &'life0 self,
        _ctx: Arc<InvocationContext>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        Self: 'async_trait,
    {
        panic!("no future for you");
    }
}

#[tokio::test]
async fn handler_panicking_before_first_poll_becomes_failure() {
    let mut h = harness();
    let eager = Command::builder("eager")
        .handler(Arc::new(EagerPanic))
        .build();
    h.client.register_command(Arc::clone(&eager));

    assert_eq!(h.send("!eager"), DispatchOutcome::Submitted);
    match h.next_event().await {
        CommandEvent::CommandFailure { command, error, .. } => {
            assert!(Arc::ptr_eq(&command, &eager));
            assert_eq!(error.to_string(), "command panicked: no future for you");
        },
        other => panic!("unexpected event {other:?}"),
    }

    h.send("!echo fine");
    assert_eq!(h.next_text().await, "fine");
}

#[tokio::test]
async fn listener_adapter_receives_failures() {
    #[derive(Default)]
    struct Failures(Arc<AtomicUsize>);

    #[async_trait]
    impl CommandListener for Failures {
        async fn on_command_failure(&self, _event: &CommandEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut h = harness();
    let listener = Failures::default();
    let count = Arc::clone(&listener.0);
    h.client
        .event_bus()
        .unwrap()
        .spawn_listener(listener);
    h.client.register_command(
        Command::builder("fail")
            .run(|_ctx: Arc<InvocationContext>| async move {
                Err::<(), _>(anyhow::anyhow!("nope"))
            })
            .build(),
    );

    h.send("!fail");
    h.next_event().await;
    // The harness receiver and the listener see the same event.
    for _ in 0..100 {
        if count.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unregister_keeps_aliases_taken_over_by_others() {
    let h = harness();
    let a = Command::builder("A").aliases(["shared", "a"]).build();
    let b = Command::builder("B").aliases(["shared", "b"]).build();
    h.client.register_command(Arc::clone(&a));
    h.client.register_command(Arc::clone(&b));

    assert_eq!(h.client.unregister_command(&a), 1);
    let owner = h.client.find_command(&["shared"]).unwrap();
    assert!(Arc::ptr_eq(&owner, &b));
    assert_eq!(
        h.send("!a"),
        DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
    );

    assert!(h.client.unregister_alias("SHARED").is_some());
    assert!(h.client.find_command(&["shared"]).is_none());
    assert!(h.client.find_command(&["b"]).is_some());
}

#[tokio::test]
async fn commands_lists_each_command_once() {
    let h = harness();
    h.client.register_commands([reporter("zeta"), shutdown()]);
    let names: Vec<String> = h
        .client
        .commands()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, ["Echo", "shutdown", "zeta"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registry_mutation_during_dispatch() {
    let h = harness();
    let client = h.client.clone();
    let stop = Arc::new(AtomicBool::new(false));

    let flipper = {
        let client = client.clone();
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            let flip = reporter("flip");
            while !stop.load(Ordering::SeqCst) {
                client.register_command(Arc::clone(&flip));
                tokio::task::yield_now().await;
                client.unregister_command(&flip);
                tokio::task::yield_now().await;
            }
        })
    };

    let dispatchers: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                for _ in 0..250 {
                    let outcome = client.dispatch(message("!flip now", ALICE));
                    assert!(matches!(
                        outcome,
                        DispatchOutcome::Submitted
                            | DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
                    ));
                    assert_eq!(
                        client.dispatch(message("!echo ok", ALICE)),
                        DispatchOutcome::Submitted
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for task in dispatchers {
        task.await.unwrap();
    }
    stop.store(true, Ordering::SeqCst);
    flipper.await.unwrap();

    // The flipper always ends on an unregister.
    assert_eq!(
        client.dispatch(message("!flip", ALICE)),
        DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
    );
    assert!(client.find_command(&["flip"]).is_none());
    drop(h);
}
