use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use stockcore_config::Settings;
use stockcore_query::{CategoryFilter, HistoryStore, MemoryStore};
use stockd::{Frame, JsonFileCatalog, JsonFileStore, SearchSession};
use tracing_subscriber::EnvFilter;

/// Search a product catalog file and print the visible result window.
#[derive(Debug, Parser)]
#[command(name = "stockfind", version)]
struct Args {
    /// JSON array of catalog entries.
    #[arg(long)]
    catalog: PathBuf,
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// Scroll offset in pixels.
    #[arg(long, default_value_t = 0.0)]
    scroll: f32,
    #[arg(long, default_value_t = 800.0)]
    viewport: f32,
    #[arg(long, default_value_t = 1)]
    columns: usize,
    #[arg(long)]
    item_size: Option<f32>,
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep search history in memory only.
    #[arg(long)]
    no_history: bool,
    /// Print the frame as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("STOCKFIND_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(item_size) = args.item_size {
        settings.item_size = item_size;
    }

    let mut session = SearchSession::new(&settings, history_store(args.no_history))
        .context("invalid settings")?;
    let loaded = session
        .load_catalog(&JsonFileCatalog::new(&args.catalog))
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    tracing::info!(entries = loaded, "catalog loaded");

    let now = Instant::now();
    session.on_resize(args.viewport, args.columns);
    if let Some(query) = &args.query {
        session.on_query_change(query.as_str(), now);
        session.flush();
    }
    if let Some(category) = &args.category {
        session.on_category_change(CategoryFilter::parse(category));
    }
    session.on_scroll(args.scroll);
    let frame = session.on_frame(now);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        print_frame(&frame, loaded);
    }
    Ok(())
}

fn history_store(memory_only: bool) -> Box<dyn HistoryStore> {
    if memory_only {
        return Box::new(MemoryStore::new());
    }
    match JsonFileStore::in_data_dir() {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(error = %err, "history kept in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn print_frame(frame: &Frame, catalog_size: usize) {
    println!(
        "{} of {} entries match, showing {} (extent {:.0}px)",
        frame.result_count,
        catalog_size,
        frame.visible.len(),
        frame.total_extent
    );
    for product in &frame.visible {
        let matched: Vec<String> = product
            .matched
            .iter()
            .map(|field| format!("{:?}", field).to_lowercase())
            .collect();
        println!(
            "{:>5} {:>9.1} c{} {:>7.1}  {}  [{}] {}",
            product.index,
            product.offset,
            product.column,
            product.score,
            product.entry.name,
            product.entry.category.as_deref().unwrap_or("-"),
            matched.join(",")
        );
    }
    if !frame.suggestions.is_empty() {
        println!("suggestions: {}", frame.suggestions.join(" | "));
    }
    if !frame.history.is_empty() {
        println!("recent: {}", frame.history.join(" | "));
    }
}
