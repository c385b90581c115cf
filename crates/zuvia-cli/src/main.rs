mod bootstrap_helpers;
mod cli_args;
mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use zuvia_ai::{CompletionBackend, ProxyClient, ProxyClientConfig};
use zuvia_chat::{
    ConversationSession, EscalationConfig, FileKeyValueStore, KeyValueStore,
    TranscriptPersistence, Visibility, WidgetConfig,
};
use zuvia_proxy::{run_completion_proxy, ProxyConfig};

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::{ChatArgs, Cli, CliCommand, ProxyArgs};
use crate::terminal::{parse_repl_command, render_turn, ReplCommand, TerminalPresenter, HELP_TEXT};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(cli.state_dir.clone()));

    match &cli.command {
        CliCommand::Chat(args) => run_chat(&cli, args, store).await,
        CliCommand::Proxy(args) => run_completion_proxy(proxy_config_from_args(args)).await,
        CliCommand::History => print_history(&cli, store),
        CliCommand::Reset => {
            store
                .remove(&cli.storage_key)
                .with_context(|| format!("failed to clear '{}'", cli.storage_key))?;
            println!("cleared stored conversation '{}'", cli.storage_key);
            Ok(())
        }
    }
}

fn proxy_config_from_args(args: &ProxyArgs) -> ProxyConfig {
    ProxyConfig {
        bind: args.bind.clone(),
        upstream_base_url: args.upstream_base_url.clone(),
        api_key: args
            .openai_api_key
            .clone()
            .filter(|key| !key.trim().is_empty()),
        model: args.model.clone(),
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        request_timeout_ms: args.upstream_timeout_ms,
    }
}

fn build_backend(args: &ChatArgs) -> Result<Option<Arc<dyn CompletionBackend>>> {
    let Some(endpoint) = args
        .chat_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
    else {
        return Ok(None);
    };

    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: endpoint.to_string(),
        request_timeout_ms: args.request_timeout_ms,
        max_retries: args.max_retries,
    })
    .context("failed to build completion proxy client")?;
    Ok(Some(Arc::new(client)))
}

async fn run_chat(cli: &Cli, args: &ChatArgs, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let config = WidgetConfig {
        storage_key: cli.storage_key.clone(),
        escalation: EscalationConfig {
            whatsapp_number: args.whatsapp_number.clone(),
            ..EscalationConfig::default()
        },
        ..WidgetConfig::default()
    };
    let mut session = ConversationSession::new(config, build_backend(args)?, store);

    let presenter = Arc::new(TerminalPresenter::new());
    let sink = presenter.clone();
    session.subscribe(move |event| {
        for line in sink.render(event) {
            println!("{line}");
        }
    });

    tracing::debug!(
        completion_enabled = session.completion_enabled(),
        state_dir = %cli.state_dir.display(),
        "starting terminal chat"
    );
    session.boot();
    session.open();
    println!("{HELP_TEXT}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_repl_command(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP_TEXT}"),
            ReplCommand::Toggle => session.toggle(),
            ReplCommand::Reset => session.reset(),
            ReplCommand::Unknown(command) => println!("unknown command {command}; {HELP_TEXT}"),
            ReplCommand::QuickAction(index) => match presenter.offered_action(index) {
                Some(action) if session.visibility() == Visibility::Open => {
                    session.activate_quick_action(&action).await;
                }
                Some(_) => println!("chat is closed; /toggle to open it"),
                None => println!("no quick action /{index} on offer"),
            },
            ReplCommand::Message(text) => {
                if session.visibility() == Visibility::Closed {
                    println!("chat is closed; /toggle to open it");
                    continue;
                }
                session.handle_user_input(&text).await;
            }
        }
    }

    session.close();
    Ok(())
}

fn print_history(cli: &Cli, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let persistence = TranscriptPersistence::new(store, cli.storage_key.clone());
    let Some(turns) = persistence
        .try_load()
        .with_context(|| format!("failed to read stored conversation '{}'", cli.storage_key))?
    else {
        println!("no stored conversation");
        return Ok(());
    };

    for turn in &turns {
        println!("{}", render_turn(turn));
    }
    Ok(())
}
