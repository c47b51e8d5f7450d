use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};

use property_valuation::config::AppConfig;
use property_valuation::matching::PreferenceVector;
use property_valuation::monitoring::logger;
use property_valuation::narrative::{NarrativeService, TemplateNarrator};
use property_valuation::property::{InMemoryRepository, PropertyFilter, PropertyRepository};
use property_valuation::valuation::{ValuationEngine, ValuationRequest};

/// Comparable-market valuation and buyer match scoring
#[derive(Parser)]
#[command(name = "property-valuation")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VALUATION_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// JSON array of property records
    #[arg(short, long, env = "VALUATION_PROPERTIES", default_value = "data/properties.json")]
    properties: PathBuf,

    /// Year ages are measured from (defaults to the current year)
    #[arg(long)]
    reference_year: Option<i32>,

    /// Print a plain-language summary after the JSON result
    #[arg(long)]
    narrate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Value a property against comparables from the same county and type
    Value {
        /// Subject property id
        id: String,

        /// Number of comparables (defaults to the configured value)
        #[arg(short)]
        k: Option<usize>,
    },
    /// Rank properties against a buyer preference file
    Recommend {
        /// JSON preference vector
        preferences: PathBuf,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    logger::init_logging(&config.monitoring)?;

    let reference_year = cli
        .reference_year
        .unwrap_or_else(|| chrono::Utc::now().year());
    tracing::info!(
        config = %cli.config.display(),
        properties = %cli.properties.display(),
        reference_year,
        "Property valuation starting"
    );

    let engine = ValuationEngine::new(config.engine).context("Invalid engine configuration")?;
    let repository = InMemoryRepository::from_json_file(&cli.properties)?;
    if repository.is_empty() {
        tracing::warn!(path = %cli.properties.display(), "Property file holds no records");
    }
    let narrator: Option<Box<dyn NarrativeService>> = cli
        .narrate
        .then(|| Box::new(TemplateNarrator) as Box<dyn NarrativeService>);

    match cli.command {
        Command::Value { id, k } => {
            run_value(&engine, &repository, narrator.as_deref(), &id, k, reference_year).await
        }
        Command::Recommend { preferences, limit } => {
            run_recommend(
                &engine,
                &repository,
                narrator.as_deref(),
                &preferences,
                limit,
                reference_year,
            )
            .await
        }
    }
}

async fn run_value(
    engine: &ValuationEngine,
    repository: &dyn PropertyRepository,
    narrator: Option<&dyn NarrativeService>,
    id: &str,
    k: Option<usize>,
    reference_year: i32,
) -> Result<()> {
    let Some(subject) = repository.get(id)? else {
        bail!("Property not found: {id}");
    };
    let pool = repository.query(&PropertyFilter::comparables_for(&subject))?;

    let result = engine
        .value(&ValuationRequest {
            subject: &subject,
            pool: &pool,
            k,
            reference_year,
        })
        .with_context(|| format!("Valuation failed for {id}"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(narrator) = narrator {
        println!("\n{}", narrator.narrate_valuation(&result).await?);
    }

    Ok(())
}

async fn run_recommend(
    engine: &ValuationEngine,
    repository: &dyn PropertyRepository,
    narrator: Option<&dyn NarrativeService>,
    preferences_path: &Path,
    limit: Option<usize>,
    reference_year: i32,
) -> Result<()> {
    let contents = std::fs::read_to_string(preferences_path).with_context(|| {
        format!("Failed to read preference file: {}", preferences_path.display())
    })?;
    let preferences: PreferenceVector = serde_json::from_str(&contents).with_context(|| {
        format!("Failed to parse preference file: {}", preferences_path.display())
    })?;
    if preferences.is_empty() {
        tracing::warn!("Preference file states nothing; every score will be 0");
    }

    let records = repository.query(&PropertyFilter::default())?;
    let feed = engine
        .recommend(&records, &preferences, reference_year, limit)
        .context("Recommendation failed")?;

    println!("{}", serde_json::to_string_pretty(&feed)?);

    if let Some(narrator) = narrator {
        println!();
        for result in &feed {
            println!("{}", narrator.narrate_match(result).await?);
        }
    }

    Ok(())
}
