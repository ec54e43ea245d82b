//! Commands available in the console.

use std::sync::Arc;

use {
    regnum_commands::{
        Command, InvocationContext, PermissionPolicy,
        format::{format_command, format_overview},
    },
    tokio::sync::Notify,
};

pub fn commands(shutdown: Arc<Notify>) -> Vec<Arc<Command>> {
    vec![ping(), echo(), help(), about(), shutdown_command(shutdown)]
}

fn ping() -> Arc<Command> {
    Command::builder("Ping")
        .alias("ping")
        .description("Check that the bot is listening")
        .run(|ctx: Arc<InvocationContext>| async move {
            ctx.respond("Pong!").await?;
            anyhow::Ok(())
        })
        .build()
}

fn echo() -> Arc<Command> {
    Command::builder("Echo")
        .aliases(["echo", "say"])
        .description("Repeat the given text")
        .usage("<text>")
        .example_usage("hello world")
        .run(|ctx: Arc<InvocationContext>| async move {
            if ctx.args().is_empty() {
                ctx.send_usage().await?;
            } else {
                ctx.respond(&ctx.args().join()).await?;
            }
            anyhow::Ok(())
        })
        .build()
}

fn help() -> Arc<Command> {
    Command::builder("Help")
        .aliases(["help", "h", "?"])
        .description("List commands or show help for one")
        .usage("[command] [subcommand]")
        .example_usage("about version")
        .run(|ctx: Arc<InvocationContext>| async move {
            let client = ctx
                .client()
                .ok_or_else(|| anyhow::anyhow!("command client is gone"))?;
            let prefix = client.effective_prefix(ctx.guild_id());

            let reply = if ctx.args().is_empty() {
                format_overview(&prefix, &client.commands())
            } else {
                match client.find_command(ctx.args().as_slice()) {
                    Some(command) => format_command(&prefix, &command),
                    None => format!("No command named `{}`.", ctx.args().join()),
                }
            };
            ctx.respond(&reply).await?;
            anyhow::Ok(())
        })
        .build()
}

fn about() -> Arc<Command> {
    let about = Command::builder("About")
        .aliases(["about", "info"])
        .description("Information about this bot")
        .run(|ctx: Arc<InvocationContext>| async move {
            let reply = format!(
                "regnum command console. Try `{}help`.",
                ctx.client()
                    .map(|c| c.effective_prefix(ctx.guild_id()))
                    .unwrap_or_else(|| ctx.prefix().to_string())
            );
            ctx.respond(&reply).await?;
            anyhow::Ok(())
        })
        .build();

    let version = Command::builder("Version")
        .alias("version")
        .description("Show the running version")
        .run(|ctx: Arc<InvocationContext>| async move {
            ctx.respond(concat!("regnum ", env!("CARGO_PKG_VERSION")))
                .await?;
            anyhow::Ok(())
        })
        .build();

    about.register_subcommand(version);
    about
}

fn shutdown_command(shutdown: Arc<Notify>) -> Arc<Command> {
    Command::builder("Shutdown")
        .aliases(["shutdown", "exit"])
        .description("Stop the console")
        .permission(PermissionPolicy::OwnerExclusive)
        .run(move |ctx: Arc<InvocationContext>| {
            let shutdown = Arc::clone(&shutdown);
            async move {
                ctx.respond("Shutting down.").await?;
                shutdown.notify_one();
                anyhow::Ok(())
            }
        })
        .build()
}
