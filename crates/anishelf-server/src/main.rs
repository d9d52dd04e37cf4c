//! anishelf server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `ANISHELF_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.
//!
//! # Provisioning users
//!
//! Accounts are normally created by the external auth layer. To seed one
//! directly into the store:
//!
//! ```
//! cargo run -p anishelf-server --bin server -- --add-user alice --role admin
//! ```

use std::{path::PathBuf, sync::Arc};

use anishelf_core::{
  store::CatalogStore,
  user::{NewUser, Role},
};
use anishelf_server::ServerConfig;
use anishelf_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "anishelf catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert a user with this name into the store and exit.
  #[arg(long, value_name = "USERNAME")]
  add_user: Option<String>,

  /// Role for `--add-user`: user, moderator or admin.
  #[arg(long, default_value = "user", requires = "add_user")]
  role: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ANISHELF"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: provision a user and exit.
  if let Some(username) = cli.add_user {
    let role: Role = cli.role.parse().context("invalid --role")?;
    let user = store
      .add_user(NewUser::new(username.as_str(), role))
      .await
      .with_context(|| format!("failed to add user {username:?}"))?;
    tracing::info!(user_id = user.user_id, role = role.as_str(), "added user {}", user.username);
    println!("{}", user.user_id);
    return Ok(());
  }

  let app = anishelf_server::app(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
