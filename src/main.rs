mod db;
mod llm;
mod notion;
mod parser;
mod settings;

use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use parser::format::{Format, RelatedLayout};
use parser::mapper::WordRecord;
use parser::Engine;
use settings::Settings;

#[derive(Parser)]
#[command(name = "wordbook", about = "Turn model-written vocabulary notes into Notion pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model about a word and file it in the Notion database
    Add {
        word: String,
        /// Print the record as JSON instead of writing to Notion
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse a passage from a file (or stdin) and print the record
    Parse {
        path: Option<PathBuf>,
        /// Print the recovered sections instead of the record
        #[arg(long)]
        sections: bool,
    },
    /// Re-parse the most recent journaled passage for a word
    Reparse {
        word: String,
    },
    /// Show recent lookups
    History {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// List the Notion database's properties
    Properties,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let engine = build_engine(&settings)?;

    let result = match cli.command {
        Commands::Add { word, dry_run } => add_word(&settings, &engine, &word, dry_run).await,
        Commands::Parse { path, sections } => {
            let passage = match path {
                Some(p) => std::fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read {}", p.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if sections {
                println!("{}", serde_json::to_string_pretty(&engine.sections(&passage))?);
                Ok(())
            } else {
                print_record(&engine.process(&passage)?)
            }
        }
        Commands::Reparse { word } => {
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;
            match db::fetch_latest_passage(&conn, &word)? {
                Some(passage) => print_record(&engine.process(&passage)?),
                None => {
                    println!("No journaled passage for '{}'. Run 'add' first.", word);
                    Ok(())
                }
            }
        }
        Commands::History { limit } => {
            let conn = db::connect(&settings.database_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_history(&conn, limit)?;
            if rows.is_empty() {
                println!("No lookups yet.");
                return Ok(());
            }
            println!("{:>4} | {:<20} | {:<12} | {:<19} | {}", "#", "Word", "Model", "When", "Page");
            println!("{}", "-".repeat(90));
            for r in &rows {
                println!(
                    "{:>4} | {:<20} | {:<12} | {:<19} | {}",
                    r.id,
                    truncate(&r.word, 20),
                    truncate(&r.model, 12),
                    r.created_at.format("%Y-%m-%d %H:%M:%S"),
                    r.page_id.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }
        Commands::Properties => {
            let api_key = Settings::require(&settings.notion_api_key, "notion_api_key")?;
            let database_id = Settings::require(&settings.notion_database_id, "notion_database_id")?;
            let client = notion::NotionClient::new(&settings.notion_base_url, api_key, &settings.notion_version);
            let props = client.database_properties(database_id).await?;
            println!("{:<20} | {:<14} | {}", "Name", "Type", "Id");
            println!("{}", "-".repeat(50));
            for p in &props {
                println!("{:<20} | {:<14} | {}", p.name, p.kind, p.id);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_engine(settings: &Settings) -> Result<Engine> {
    let layout = if settings.combined_related {
        RelatedLayout::Combined
    } else {
        RelatedLayout::Split
    };
    Ok(Engine::new(Format::japanese().with_related_layout(layout))?)
}

async fn add_word(settings: &Settings, engine: &Engine, word: &str, dry_run: bool) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let word = word.trim();
    anyhow::ensure!(!word.is_empty(), "word must not be empty");

    let openai_key = Settings::require(&settings.openai_api_key, "openai_api_key")?;
    // Check Notion credentials before spending a model call.
    let notion_target = if dry_run {
        None
    } else {
        let api_key = Settings::require(&settings.notion_api_key, "notion_api_key")?;
        let database_id = Settings::require(&settings.notion_database_id, "notion_database_id")?;
        Some((api_key, database_id))
    };

    let chat = llm::ChatClient::new(&settings.openai_base_url, openai_key, &settings.openai_model);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Asking {} about '{}'...", chat.model(), word));
    pb.enable_steady_tick(Duration::from_millis(100));
    let passage = chat.ask_about(word).await;
    pb.finish_and_clear();
    let passage = passage?;

    let conn = db::connect(&settings.database_path)?;
    db::init_schema(&conn)?;
    let lookup_id = db::record_lookup(&conn, word, chat.model(), &passage)?;

    let record = engine.process(&passage)?;
    info!(
        word,
        properties = record.properties.len(),
        blocks = record.blocks.len(),
        "Parsed passage"
    );

    let Some((api_key, database_id)) = notion_target else {
        return print_record(&record);
    };

    let client = notion::NotionClient::new(&settings.notion_base_url, api_key, &settings.notion_version);
    let page_id = client
        .create_page(database_id, &settings.title_property, word)
        .await?;
    db::set_page_id(&conn, lookup_id, &page_id)?;
    client.update_properties(&page_id, &record).await?;
    client.append_blocks(&page_id, &record).await?;

    println!("Added '{}' to Notion ({} properties, {} callouts).", word, record.properties.len(), record.blocks.len());
    Ok(())
}

fn print_record(record: &WordRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
