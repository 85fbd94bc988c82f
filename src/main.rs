use anyhow::{bail, Context, Result};
use debtdesk::{
    config::Config,
    engine::engine::{Engine, Upload},
    error::IngestError,
    read_upload,
    store::LocalStore,
};

use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

struct Args {
    file: String,
    institution_id: String,
    portfolio_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = parse_args()?;
    let config = Config::load()?;
    info!("startup, data dir {}", config.data_dir.display());

    ingest_file(args, config).await
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        3 | 4 => Ok(Args {
            file: args[1].clone(),
            institution_id: args[2].clone(),
            portfolio_name: args.get(3).cloned(),
        }),
        _ => {
            eprintln!("Usage: {} <file> <institution-id> [portfolio-name]", args[0]);
            eprintln!("  file: debtor base in .csv or .xlsx format");
            bail!("invalid arguments");
        }
    }
}

async fn ingest_file(args: Args, config: Config) -> Result<()> {
    let path = Path::new(&args.file);
    if !path.is_file() {
        bail!("File '{}' does not exist", args.file);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| args.file.clone());
    let bytes = read_upload(path, config.max_file_mb)
        .await
        .with_context(|| format!("Failed to read '{}'", args.file))?;

    let store = LocalStore::new(&config.data_dir);
    let engine = Engine::new(store.clone(), store, config.engine_config());

    let upload = Upload {
        file_name,
        bytes,
        owner_id: args.institution_id,
        portfolio_name: args.portfolio_name,
    };

    let progress = |percentage: u8| println!("[{:>3}%]", percentage);

    match engine.ingest(&upload, &progress).await {
        Ok(outcome) => {
            println!("portfolio: {}", outcome.portfolio_id);
            println!("stored as: {}", outcome.storage_path);
            println!("debtors:   {}", outcome.summary.debtor_count);
            println!("total:     {}", outcome.summary.total_value);
            for rejection in &outcome.rejected {
                println!("skipped line {}: {}", rejection.row, rejection.reason);
            }
            Ok(())
        }
        Err(IngestError::NoValidRecords { rejected }) => {
            for rejection in &rejected {
                eprintln!("line {}: {}", rejection.row, rejection.reason);
            }
            bail!("No valid debtors found in '{}'", args.file)
        }
        Err(e) => Err(e.into()),
    }
}
