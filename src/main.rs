use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use lazy_extract::cli::{extract_to_ndjson, load_connection_uri, load_reader_settings};
use lazy_extract::{SourceDescriptor, SourceReader};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Instant;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Stream records out of CSV files, JSON files and MongoDB collections as NDJSON
#[derive(Parser)]
#[command(name = "extract", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the rows of a CSV file
    Csv {
        /// Path to a .csv file with a header row
        path: PathBuf,

        /// NDJSON file to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read the records of a JSON file (array, single value, or NDJSON)
    Json {
        /// Path to a .json file
        path: PathBuf,

        /// NDJSON file to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read every document of a MongoDB collection
    Mongo {
        /// Name of the collection to read
        collection: String,

        /// mongodb:// connection string; defaults to MONGODB_URI
        #[arg(short, long)]
        uri: Option<String>,

        /// NDJSON file to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let reader = SourceReader::new().with_settings(load_reader_settings()?);

    let (descriptor, output) = match cli.command {
        Commands::Csv { path, output } => (SourceDescriptor::csv(path), output),
        Commands::Json { path, output } => (SourceDescriptor::json(path), output),
        Commands::Mongo {
            collection,
            uri,
            output,
        } => (
            SourceDescriptor::mongodb(load_connection_uri(uri)?, collection),
            output,
        ),
    };

    let source = descriptor.resource_name();
    log::info!("Extracting from {}", source.bright_black());

    let started = Instant::now();
    let count = extract_to_ndjson(&reader, descriptor, output.as_deref()).await?;

    log::info!(
        "✓ Wrote {} record(s) from {} to {} in {:.2?}",
        count.cyan(),
        source.bright_black(),
        output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string())
            .bright_black(),
        started.elapsed()
    );

    Ok(())
}
