//! Thin terminal shell over the conversation engine. All state and rules
//! live in `conversation_manager`; this binary only wires input and output.

use std::io::{self, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use conversation_manager::{
    ConversationManager, Role, SessionConfig, SessionOptions,
};
use history_store::{default_history_dir, FileHistoryStore, HistoryStorage};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Chat sessions with personas, token budgets, and saved history")]
#[command(version)]
struct Cli {
    /// Model to use for completions
    #[arg(long)]
    model: Option<String>,

    /// Token budget ceiling for the transcript
    #[arg(long)]
    budget: Option<usize>,

    /// Directory holding saved chats (default: ~/.parley/history)
    #[arg(long)]
    history_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Persona to start with
        #[arg(long)]
        persona: Option<String>,
        /// Resume a saved chat by name
        #[arg(long)]
        history: Option<String>,
    },
    /// Send a single message and print the reply
    Send {
        message: String,
        #[arg(long)]
        persona: Option<String>,
    },
    /// List saved chats
    List,
    /// List available personas
    Personas,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let mut config = SessionConfig::from_env().context("session configuration")?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(budget) = cli.budget {
        config = config.with_token_budget(budget);
    }
    if let Some(dir) = &cli.history_dir {
        config = config.with_history_dir(dir);
    }

    match cli.command {
        Commands::Chat { persona, history } => {
            let options = SessionOptions {
                persona,
                history_name: history,
                ..Default::default()
            };
            let manager = ConversationManager::open(config, options).await?;
            run_repl(manager).await
        }
        Commands::Send { message, persona } => {
            let options = SessionOptions {
                persona,
                ..Default::default()
            };
            let mut manager = ConversationManager::open(config, options).await?;
            let reply = manager.completion(&message).await?;
            println!("{reply}");
            Ok(())
        }
        Commands::List => {
            let dir = cli
                .history_dir
                .unwrap_or_else(default_history_dir);
            let store = FileHistoryStore::new(dir);
            for name in store.list().await? {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Personas => {
            let manager =
                ConversationManager::open(config, SessionOptions::default()).await?;
            for name in manager.persona_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn run_repl(mut manager: ConversationManager) -> anyhow::Result<()> {
    render_transcript(&manager);
    println!(
        "{}",
        "Type a message, or /persona NAME, /custom PROMPT, /tokens, /quit".dimmed()
    );

    let stdin = io::stdin();
    loop {
        print!("{} ", "you:".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(rest) = input.strip_prefix("/persona ") {
            match manager.set_persona(rest.trim()).await {
                Ok(()) => println!("{}", format!("[persona switched to {}]", rest.trim()).dimmed()),
                Err(err) => eprintln!("{}", err.to_string().red()),
            }
            continue;
        }
        if let Some(rest) = input.strip_prefix("/custom ") {
            match manager.set_custom_system_message(rest).await {
                Ok(()) => println!("{}", "[custom persona applied]".dimmed()),
                Err(err) => eprintln!("{}", err.to_string().red()),
            }
            continue;
        }
        if input == "/tokens" {
            println!("{}", format!("transcript: {} tokens", manager.transcript_tokens()).dimmed());
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }

        match manager.completion(input).await {
            Ok(reply) => println!("{} {reply}\n", "assistant:".blue().bold()),
            Err(err) => eprintln!("{}", format!("turn failed: {err}").red()),
        }
    }

    println!("{}", format!("saved as {}", manager.history_name()).dimmed());
    Ok(())
}

fn render_transcript(manager: &ConversationManager) {
    for message in manager.messages() {
        match message.role {
            Role::System => println!("{} {}\n", "system:".dimmed(), message.content.dimmed()),
            Role::User => println!("{} {}\n", "you:".green().bold(), message.content),
            Role::Assistant => println!("{} {}\n", "assistant:".blue().bold(), message.content),
        }
    }
}
