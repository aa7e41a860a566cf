//! `vellum-server`: the JSON API over a single SQLite file.
//!
//! Settings come from [`ServerConfig::load`]: built-in defaults, then the TOML
//! file named by `--config`, then `VELLUM_*` environment variables. Pass
//! `--hash-password` to turn a password read from stdin into the value for
//! `auth_password_hash`.

use std::{io::BufRead as _, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vellum_api::{AppState, ServerConfig, auth};
use vellum_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vellum document store server")]
struct Cli {
  /// TOML settings file; missing is fine.
  #[arg(short, long, default_value = "vellum.toml")]
  config: PathBuf,

  /// Hash the first line of stdin for `auth_password_hash` and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  if cli.hash_password {
    return print_password_hash();
  }

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("invalid settings (file {})", cli.config.display()))?;
  serve(cfg).await
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {}", cfg.store_path.display()))?;

  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!(
    %address,
    store = %cfg.store_path.display(),
    auth = cfg.auth().is_some(),
    "serving"
  );

  let app = vellum_api::router(AppState::new(Arc::new(store), cfg));
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
      }
    })
    .await
    .context("server error")
}

fn print_password_hash() -> anyhow::Result<()> {
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);
  anyhow::ensure!(!password.is_empty(), "no password on stdin");

  let hash = auth::hash_password(password).map_err(|e| anyhow::anyhow!("argon2: {e}"))?;
  println!("{hash}");
  Ok(())
}
