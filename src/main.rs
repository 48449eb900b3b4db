use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fs::File, path::PathBuf, sync::Arc, sync::Mutex, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use ventas_loader::{
    config::Config,
    pipeline,
    storage::{GcsStore, ObjectStore},
    warehouse::BigQueryWarehouse,
};

/// Upload the sales report workbooks to GCS and append their sheets to
/// BigQuery.
#[derive(Parser, Debug)]
struct Args {
    /// YAML configuration file
    #[arg(long, default_value = "ventas.yaml")]
    config: PathBuf,

    /// Write debug_<sheet>.csv copies into this directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if args.debug_dir.is_some() {
        cfg.debug_dir = args.debug_dir;
    }

    // ─── 1) init logging ─────────────────────────────────────────────
    let log_file = File::create(&cfg.log_file)
        .with_context(|| format!("creating log file {}", cfg.log_file.display()))?;
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .init();
    info!(config = %args.config.display(), "startup");

    // ─── 2) clients ──────────────────────────────────────────────────
    if let Some(path) = &cfg.credentials {
        env::set_var("GOOGLE_APPLICATION_CREDENTIALS", path);
    }
    let (store, warehouse) = match connect(&cfg).await {
        Ok(clients) => clients,
        Err(e) => {
            error!(error = %format!("{:#}", e), "could not initialise Google Cloud clients");
            return Err(e);
        }
    };
    info!("Google Cloud clients ready");

    // ─── 3) run ──────────────────────────────────────────────────────
    if let Err(e) = pipeline::run(&cfg, store.as_ref(), &warehouse).await {
        error!(error = %format!("{:#}", e), "run aborted");
        return Err(e);
    }

    info!("Proceso completado.");
    Ok(())
}

async fn connect(cfg: &Config) -> Result<(Arc<dyn ObjectStore>, BigQueryWarehouse)> {
    let store: Arc<dyn ObjectStore> = Arc::new(GcsStore::new().await?);
    let warehouse = BigQueryWarehouse::new(
        store.clone(),
        &cfg.bucket,
        &cfg.staging_prefix,
        Duration::from_millis(cfg.poll_interval_ms),
    )
    .await?;
    Ok((store, warehouse))
}
