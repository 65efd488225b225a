use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use inkstamp::{
    ConfigStore, OutputMode, Pipeline, WatermarkHandle,
    app::{DEFAULT_CONFIG_PATH, default_output_dir},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Directory generated images are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark an image and print the path of the result
    Apply {
        /// Image to watermark
        input: PathBuf,
    },
    /// Watermark an image under a fresh name and print its preview URL
    Preview {
        /// Image to watermark
        input: PathBuf,
    },
    /// Normalize a watermark handle given as JSON and print it
    Parse {
        /// JSON object with text, size, dpi, color, x, y, position and angle
        json: String,
    },
    /// Print the watermark handle from the config file
    Show,
    /// Replace the config file with the given JSON document
    Save {
        /// Full config document
        json: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = ConfigStore::new(cli.config);
    let output_dir = cli.output_dir.unwrap_or_else(default_output_dir);

    match cli.command {
        Commands::Apply { input } => {
            let pipeline = Pipeline::startup(store, output_dir)?;
            let saved = pipeline.watermark_by_path(&input, OutputMode::Final)?;
            println!("{}", saved.display());
        }
        Commands::Preview { input } => {
            let pipeline = Pipeline::startup(store, output_dir)?;
            println!("{}", pipeline.preview(&input)?);
        }
        Commands::Parse { json } => {
            let handle = WatermarkHandle::construct(json)?;
            println!("{}", handle);
        }
        Commands::Show => {
            let config = store.load()?;
            match config.watermark {
                Some(handle) => println!("{}", serde_json::to_string_pretty(&handle)?),
                None => info!("No watermark configured in {:?}", store.path()),
            }
        }
        Commands::Save { json } => {
            store.save_raw(&json)?;
            info!("Saved config to {:?}", store.path());
        }
    }

    Ok(())
}
