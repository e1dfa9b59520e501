//! Weather map renderer.
//!
//! Renders one configured product to PNG per invocation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wx_common::time::parse_iso8601;
use wx_common::WxError;
use wxmap::{find_product, load_config, load_product_configs, run, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "wxmap")]
#[command(about = "Render weather map products to PNG")]
struct Args {
    /// Global configuration file
    #[arg(short, long, env = "WXMAP_CONFIG", default_value = "config/wxmap.yaml")]
    config: PathBuf,

    /// Directory of product YAML files
    #[arg(long, env = "WXMAP_PRODUCTS_DIR", default_value = "config/products")]
    products_dir: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one product
    Render {
        product: String,

        /// Output PNG path (default: output.dir joined with the product file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render time, ISO8601 (default: now)
        #[arg(long)]
        time: Option<String>,
    },
    /// List configured products
    List,
    /// Print a product configuration as parsed
    Describe {
        product: String,

        /// JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::from(1);
    }

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<WxError>())
                .map(WxError::exit_code)
                .unwrap_or(1);
            error!(error = %format!("{e:#}"), exit_code = code, "Run failed");
            ExitCode::from(code as u8)
        }
    }
}

fn config_error(e: anyhow::Error) -> anyhow::Error {
    anyhow::Error::new(WxError::InvalidConfig(format!("{e:#}")))
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::List => {
            let products = load_product_configs(&args.products_dir).map_err(config_error)?;
            for (id, product) in &products {
                println!("{id:<24} {:<20} {}", product.output, product.title);
            }
        }
        Command::Describe { product, json } => {
            let product = find_product(&args.products_dir, &product).map_err(config_error)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&product)?);
            } else {
                print!("{}", serde_yaml::to_string(&product)?);
            }
        }
        Command::Render { product, output, time } => {
            let config = load_config(&args.config).map_err(config_error)?;
            let product = find_product(&args.products_dir, &product).map_err(config_error)?;
            let now = match time {
                Some(t) => parse_iso8601(&t)
                    .map_err(|e| WxError::InvalidConfig(e.to_string()))
                    .context("--time")?,
                None => chrono::Utc::now(),
            };
            let options = RunOptions { now, output };

            netcdf_parser::silence_hdf5_errors();
            info!(product = %product.id, time = %now, "Starting wxmap");

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start tokio runtime")?;
            let report = runtime.block_on(run(&config, &product, &options))?;

            for status in &report.overlays {
                info!(overlay = %status.name, outcome = %status.outcome, "Overlay");
            }
            println!("{}", report.output.display());
        }
    }
    Ok(())
}
