// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! chatspan main entry point - CLI, startup wiring, and REPL.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing::warn;

use chatspan::agent::ChatNode;
use chatspan::config::{MonitorConfig, OtlpConfig};
use chatspan::monitor::{bootstrap_monitoring, LogReportingAgent};
use chatspan::providers::create_provider_from_env;
use chatspan::telemetry::{init_telemetry, TelemetryConfig};
use chatspan::types::ChatState;

/// chatspan version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// chatspan - a traced conversational agent.
#[derive(Parser)]
#[command(name = "chatspan")]
#[command(author, version, about = "A traced conversational agent", long_about = None)]
struct Cli {
    /// Model to use
    #[arg(short, long, env = "CHATSPAN_MODEL")]
    model: Option<String>,

    /// Run a single prompt and exit
    #[arg(short = 'P', long)]
    prompt: Option<String>,

    /// Suppress the startup banner
    #[arg(short, long)]
    quiet: bool,

    /// Show verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let monitor_config = MonitorConfig::from_env();
    let mut otlp_config = OtlpConfig::from_env();

    // When both backends are configured, the agent owns trace export; a
    // second OTLP pipeline would double-report every span.
    let otlp_shadowed = monitor_config.is_some() && otlp_config.is_some();
    if otlp_shadowed {
        otlp_config = None;
    }

    let telemetry_config = if cli.verbose {
        TelemetryConfig::development()
    } else {
        TelemetryConfig::default()
    };
    let (_guard, tracing_state) = init_telemetry(&telemetry_config, otlp_config.as_ref())?;

    if otlp_shadowed {
        warn!("monitoring agent and OTLP export both configured, skipping direct OTLP export");
    }

    let monitoring = bootstrap_monitoring(monitor_config, Arc::new(LogReportingAgent::new()));

    let provider = create_provider_from_env(cli.model.as_deref());
    let node = ChatNode::new(provider, tracing_state, monitoring.hook());

    if let Some(prompt) = cli.prompt {
        return handle_prompt(&node, &prompt).await;
    }

    run_repl(&node, cli.quiet).await
}

/// Run a single prompt and print the response.
async fn handle_prompt(node: &ChatNode, prompt: &str) -> anyhow::Result<()> {
    let state = node.invoke(ChatState::from_user(prompt)).await?;

    if let Some(reply) = state.last() {
        println!("{}", reply.content);
    }

    Ok(())
}

/// Interactive read-eval-print loop over stdin.
async fn run_repl(node: &ChatNode, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("{} {}", "chatspan".bold().cyan(), VERSION.dimmed());
        println!("{} {}", "model:".dimmed(), node.model());
        println!("{}", "Type a message, or 'exit' to quit.".dimmed());
        println!();
    }

    let stdin = io::stdin();
    let mut state = ChatState::new();

    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        state.push(chatspan::types::Message::user(input));
        match node.invoke(state.clone()).await {
            Ok(next) => {
                if let Some(reply) = next.last() {
                    println!("{}", reply.content);
                }
                state = next;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
            }
        }
        println!();
    }

    Ok(())
}
