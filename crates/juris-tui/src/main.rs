use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use juris_core::{
    AnswerClient, ChatResult, Config, Conversation, HttpAnswerClient, Message, Mode, Source,
};

mod app;
mod handler;
mod logger;
mod tui;
mod ui;

use app::App;
use logger::LogTarget;
use tui::{EventHandler, Tui, TICK_RATE};

#[derive(Parser)]
#[command(name = "juris")]
#[command(version, about = "Chat with a consumer-law answering service from the terminal")]
struct Cli {
    /// Base URL of the answering service (overrides JURIS_API_URL and config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer mode: naive, advanced or compare
    #[arg(short, long, global = true)]
    mode: Option<Mode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };

    let level = match logger::parse_level(config.log_level()) {
        Ok(_) => config.log_level().to_string(),
        Err(_) => juris_core::config::DEFAULT_LOG_LEVEL.to_string(),
    };
    let target = match cli.command {
        None => LogTarget::File(logger::log_file_path()?),
        Some(_) => LogTarget::Stderr,
    };
    logger::init(&level, target)?;

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "could not load config, using defaults");
    }

    let api_url = config.api_url(cli.api_url.as_deref());
    let mode = config.mode(cli.mode);

    match cli.command {
        None => run_tui(&config, api_url, mode).await,
        Some(Commands::Ask { question }) => ask_once(&config, &api_url, mode, &question).await,
        Some(Commands::Config) => show_config(&config, &api_url, mode),
    }
}

async fn run_tui(config: &Config, api_url: String, mode: Mode) -> Result<()> {
    let client = HttpAnswerClient::from_config(config, &api_url)?;
    let mut app = App::new(Arc::new(client), api_url, mode);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    tracing::info!(api_url = %app.api_url, %mode, "chat session started");
    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

async fn ask_once(config: &Config, api_url: &str, mode: Mode, question: &str) -> Result<()> {
    let client = HttpAnswerClient::from_config(config, api_url)?;
    let mut conversation = Conversation::new();
    conversation.set_mode(mode);

    let Some(dispatch) = conversation.submit(question) else {
        return Err(anyhow!("Question is empty"));
    };

    println!("🔍 Asking {} in {} mode...\n", api_url.cyan(), mode.as_str().bold().magenta());

    let outcome = client.send(&dispatch.query, dispatch.mode).await;
    let elapsed = outcome.as_ref().ok().and_then(|r| r.processing_time());
    let failure = outcome.as_ref().err().map(|e| e.to_string());
    conversation.complete(outcome);

    if let Some(answer) = conversation.last() {
        print_answer(answer, elapsed);
    }

    match failure {
        Some(cause) => {
            eprintln!("{}: {}", "Request failed".red(), cause);
            eprintln!("Make sure the answering service is running at {}", api_url.bold());
            Err(anyhow!("answering service request failed"))
        }
        None => Ok(()),
    }
}

fn print_answer(message: &Message, elapsed: Option<f64>) {
    if let Some(comparison) = message.comparison() {
        print_result("Naive", &comparison.naive);
        println!("{}", "=".repeat(50).dimmed());
        print_result("Advanced", &comparison.advanced);
    } else {
        println!("{}", "Answer:".bold().green());
        println!("{}", message.content().unwrap_or_default());

        if let Some(sources) = message.sources().filter(|s| !s.is_empty()) {
            print_sources(sources);
        }
    }

    if let Some(secs) = elapsed {
        println!("\n{}", format!("Answered in {:.2}s", secs).dimmed());
    }
}

fn print_result(title: &str, result: &ChatResult) {
    println!(
        "{} {}",
        format!("{}:", title).bold().green(),
        format!("({:.2}s)", result.processing_time).dimmed()
    );
    println!("{}", result.answer);
    if !result.sources.is_empty() {
        print_sources(&result.sources);
    }
    println!();
}

fn print_sources(sources: &[Source]) {
    println!("\n{}", "Sources:".bold().blue());
    for (i, source) in sources.iter().enumerate() {
        println!(
            "{}. {} {}",
            (i + 1).to_string().bold().blue(),
            format!("Article {}", source.article_number).bold().yellow(),
            format!("(score {:.3})", source.score).dimmed()
        );
        println!("   {}\n", source.content);
    }
}

fn show_config(config: &Config, api_url: &str, mode: Mode) -> Result<()> {
    println!("\n{}", "⚙ juris configuration".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    let path = Config::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unavailable".to_string());
    let timeout = config
        .request_timeout()
        .map(|t| format!("{}s", t.as_secs()))
        .unwrap_or_else(|| "none".to_string());

    println!("  • config file: {}", path.dimmed());
    println!("  • api url:     {}", api_url.green());
    println!("  • mode:        {}", mode.as_str().green());
    println!("  • timeout:     {}", timeout.green());
    println!("  • log level:   {}", config.log_level().green());

    Ok(())
}
