use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod app;
mod backend;
mod chat;
mod config;
mod handler;
mod intent;
mod rank;
mod seller;
mod tui;
mod ui;

use app::App;
use backend::DirectoryClient;
use chat::ChatEngine;
use config::Config;
use seller::SellerDirectory;

#[derive(Parser)]
#[command(name = "tasknest")]
#[command(about = "Terminal assistant for the TaskNest service marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat assistant (default)
    Chat,
    /// Ask the assistant a single question and print the reply
    Ask {
        /// Your message
        text: String,
    },
    /// List service categories
    Categories,
    /// List sellers, optionally filtered by category
    Sellers {
        /// Category to filter by
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show the top rated sellers
    Top,
    /// Show the most affordable sellers
    Cheapest,
    /// Find sellers by name
    Search {
        /// Name (or part of a name) to look for
        name: String,
    },
    /// Point the assistant at a marketplace backend URL
    Backend {
        /// Base URL, e.g. http://localhost:4000
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    if let Some(Commands::Backend { url }) = &cli.command {
        Config::save_backend_url(url)?;
        println!("Backend set to {}", url.bold());
        return Ok(());
    }

    let (directory, load_error) = load_directory(&config).await;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(directory, load_error).await?,
        Commands::Ask { text } => ask(directory, load_error, &text),
        Commands::Categories => list_categories(&directory, load_error),
        Commands::Sellers { category } => list_sellers(&directory, load_error, category.as_deref()),
        Commands::Top => print_ranked("Top rated sellers", rank::top_rated(directory.sellers()), load_error),
        Commands::Cheapest => print_ranked("Most affordable sellers", rank::cheapest(directory.sellers()), load_error),
        Commands::Search { name } => search(&directory, load_error, &name),
        Commands::Backend { .. } => unreachable!(),
    }

    Ok(())
}

/// Build the session snapshot: try the backend once, then the local file.
/// Neither failing is fatal; the assistant degrades to an empty directory
/// and reports the problem as a chat message.
async fn load_directory(config: &Config) -> (SellerDirectory, Option<String>) {
    let mut first_error = None;

    if let Some(url) = &config.backend_url {
        match DirectoryClient::new(url).fetch_sellers().await {
            Ok(sellers) => return (SellerDirectory::from_sellers(sellers), None),
            Err(e) => first_error = Some(format!("backend fetch failed: {}", e)),
        }
    }

    if let Some(path) = &config.sellers_path {
        let mut directory = SellerDirectory::new();
        match directory.load_from_json(path).await {
            Ok(()) => return (directory, None),
            Err(e) => {
                let msg = format!("could not read {}: {}", path, e);
                first_error = Some(first_error.map_or(msg.clone(), |f| format!("{}; {}", f, msg)));
            }
        }
    }

    let error = first_error.unwrap_or_else(|| "no seller source configured".to_string());
    (SellerDirectory::new(), Some(error))
}

async fn run_chat(directory: SellerDirectory, load_error: Option<String>) -> Result<()> {
    let engine = ChatEngine::new(directory);
    let mut app = App::new(engine, load_error.is_some());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    tui::restore()?;
    Ok(())
}

fn warn_if_offline(load_error: &Option<String>) {
    if let Some(error) = load_error {
        eprintln!("{} {}", "warning:".yellow().bold(), error);
    }
}

fn ask(directory: SellerDirectory, load_error: Option<String>, text: &str) {
    warn_if_offline(&load_error);

    let mut engine = ChatEngine::new(directory);
    let reply = engine.respond(text);

    println!("{}", reply.text);
    if !reply.quick_replies.is_empty() {
        println!("\n{} {}", "try:".dimmed(), reply.quick_replies.join(" | ").dimmed());
    }
}

fn list_categories(directory: &SellerDirectory, load_error: Option<String>) {
    warn_if_offline(&load_error);

    println!("\n{}", "Service categories".bold().blue());
    for category in directory.categories() {
        let count = directory
            .sellers()
            .iter()
            .filter(|s| s.category.eq_ignore_ascii_case(category))
            .count();
        println!("  • {} ({} sellers)", category.green(), count);
    }
}

fn list_sellers(directory: &SellerDirectory, load_error: Option<String>, category: Option<&str>) {
    warn_if_offline(&load_error);

    let sellers: Vec<_> = match category {
        Some(cat) => directory
            .sellers()
            .iter()
            .filter(|s| s.category.eq_ignore_ascii_case(cat))
            .cloned()
            .collect(),
        None => directory.sellers().to_vec(),
    };

    if sellers.is_empty() {
        println!("{}", "No sellers found".red());
        return;
    }

    for seller in &sellers {
        println!(
            "{} — {} ({}, {})",
            seller.name.bold().yellow(),
            seller.category.green(),
            rank::display_rating(seller),
            rank::display_price(seller).dimmed()
        );
        println!("   {} — {}, {}", seller.service, seller.address.dimmed(), seller.city.dimmed());
    }
}

fn print_ranked(title: &str, ranked: Vec<seller::Seller>, load_error: Option<String>) {
    warn_if_offline(&load_error);

    println!("\n{}", title.bold().blue());
    if ranked.is_empty() {
        println!("{}", "No sellers found".red());
        return;
    }
    for (i, seller) in ranked.iter().enumerate() {
        println!("{}. {}", (i + 1).to_string().bold(), rank::summary_line(seller));
    }
}

fn search(directory: &SellerDirectory, load_error: Option<String>, name: &str) {
    warn_if_offline(&load_error);

    let matched = rank::by_name(directory.sellers(), name);
    if matched.is_empty() {
        println!("{} {}", "No seller matching".red(), name.bold());
        return;
    }

    for seller in &matched {
        println!("{}\n", rank::seller_card(seller));
    }
}
