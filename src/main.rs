use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

use visa_tracker::{temporal, Config, StageCatalog, TimelineService, VisaRecord, VisaStore};

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    let config = Config::load()?;
    let store = VisaStore::new(&config.record_path, &config.history_path);

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(&store, args.iter().any(|a| a == "--force")),
        Some("history") => run_history(&store),
        Some("timeline") => run_timeline(&config),
        Some("status") | None => run_status(&store),
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!("Usage: visa-tracker [status | seed [--force] | history | timeline]");
            std::process::exit(2);
        }
    }
}

fn run_seed(store: &VisaStore, force: bool) -> Result<()> {
    let record = VisaRecord::seed(Utc::now())?;

    if store.seed(&record, force)? {
        println!("✓ Seed record written to {}", store.record_path().display());
    } else {
        println!(
            "Record already exists at {} (use --force to overwrite)",
            store.record_path().display()
        );
    }

    Ok(())
}

fn run_status(store: &VisaStore) -> Result<()> {
    let record = store.read().context("Failed to read visa record")?;
    let visa = &record.current_visa;

    let expiration = temporal::parse_date(&visa.expiration_date)?;
    let days = temporal::days_remaining(expiration, Utc::now());
    let live = temporal::status_for_days(days);

    println!("Visa:        {}", visa.visa_type);
    if let Some(country) = &visa.country {
        println!("Country:     {country}");
    }
    println!("Valid:       {} → {}", visa.start_date, visa.expiration_date);
    println!("Days left:   {days}");
    println!("Status:      {} (stored: {})", live, visa.status);
    println!("Next stages: {}", record.next_stages.join(" → "));

    Ok(())
}

fn run_history(store: &VisaStore) -> Result<()> {
    let history = store.history().context("Failed to read history log")?;

    if history.is_empty() {
        println!("No updates recorded yet");
        return Ok(());
    }

    for entry in &history {
        let visa = &entry.data.current_visa;
        println!(
            "{}  {:<6} {} → {}  {}",
            temporal::format_instant(entry.timestamp),
            visa.visa_type,
            visa.start_date,
            visa.expiration_date,
            visa.status
        );
    }
    println!("\n{} entries", history.len());

    Ok(())
}

fn run_timeline(config: &Config) -> Result<()> {
    let catalog = match &config.timeline_path {
        Some(path) => StageCatalog::from_path(path)?,
        None => StageCatalog::default(),
    };
    let timeline = TimelineService::new(catalog);

    let today = Utc::now();
    let mut elapsed = 0i64;
    for stage in timeline.list_stages() {
        elapsed += i64::from(stage.average_days);
        println!(
            "{:<8} avg {:>4} days ({}-{})  est. done {}",
            stage.stage_name,
            stage.average_days,
            stage.min_days,
            stage.max_days,
            temporal::format_date(temporal::add_days(today, elapsed))
        );
    }
    println!("\nTotal expected: {} days", timeline.total_expected_duration());

    Ok(())
}
