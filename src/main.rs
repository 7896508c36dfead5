use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use wisata_scraper::config::Settings;
use wisata_scraper::driver::SpiderDriver;
use wisata_scraper::{process, scrape, store};

#[derive(Parser)]
#[command(name = "wisata_scraper", about = "Maps tourism place/review scraper and processor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the seed list into the raw place store
    Places {
        /// Seed CSV (id,name,locality)
        #[arg(long)]
        seeds: Option<PathBuf>,
        /// Raw place store to append to
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fetch reviews for every place in the raw place store
    Reviews {
        /// Raw place store to read
        #[arg(long)]
        places: Option<PathBuf>,
        /// Review document directory to write
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Clean and join the raw stores into the processed datasets
    Process {
        /// Raw place store to read
        #[arg(long)]
        places: Option<PathBuf>,
        /// Review document directory to read
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Processed output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Places + reviews + process in one pipeline
    Run,
    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Places { seeds, out } => {
            if let Some(p) = seeds {
                settings.seeds_path = p;
            }
            if let Some(p) = out {
                settings.places_path = p;
            }
            let driver = SpiderDriver::from_env(&settings)?;
            let stats = scrape::places::run(&driver, &settings).await?;
            stats.print("Places");
            Ok(())
        }
        Commands::Reviews { places, out } => {
            if let Some(p) = places {
                settings.places_path = p;
            }
            if let Some(p) = out {
                settings.reviews_dir = p;
            }
            let driver = SpiderDriver::from_env(&settings)?;
            let stats = scrape::reviews::run(&driver, &settings).await?;
            stats.print("Reviews");
            Ok(())
        }
        Commands::Process { places, reviews, out } => {
            if let Some(p) = places {
                settings.places_path = p;
            }
            if let Some(p) = reviews {
                settings.reviews_dir = p;
            }
            if let Some(p) = out {
                settings.processed_dir = p;
            }
            let outcome = process::run(&settings)?;
            outcome.print();
            Ok(())
        }
        Commands::Run => {
            let driver = SpiderDriver::from_env(&settings)?;

            println!("Pipeline: resolving seeds...");
            let stats = scrape::places::run(&driver, &settings).await?;
            stats.print("Places");

            println!("Pipeline: fetching reviews...");
            let stats = scrape::reviews::run(&driver, &settings).await?;
            stats.print("Reviews");

            println!("Pipeline: processing...");
            let outcome = process::run(&settings)?;
            outcome.print();
            Ok(())
        }
        Commands::Stats => print_stats(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_stats(settings: &Settings) -> anyhow::Result<()> {
    let seeds = match store::seeds::load(&settings.seeds_path) {
        Ok(seeds) => seeds.len(),
        Err(_) => 0,
    };
    let place_ids = store::places::existing_ids(&settings.places_path)?;
    let (docs, unreadable) = store::reviews::load_all(&settings.reviews_dir)?;
    let raw_reviews: usize = docs.iter().map(|d| d.reviews.len()).sum();
    let failures = store::failures::load(&settings.failures_path)?;

    println!("Seeds:            {}", seeds);
    println!("Places scraped:   {}", place_ids.len());
    println!("Review documents: {} ({} unreadable)", docs.len(), unreadable.len());
    println!("Raw reviews:      {}", raw_reviews);
    println!("Failures logged:  {}", failures.len());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
