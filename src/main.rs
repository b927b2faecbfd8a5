// entity derives address the JSON crate by its registry name
extern crate json as serde_json;

mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::env;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{cron, server},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "commission=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;
  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:commissions.db?mode=rwc".into());

  info!("Starting Commission Server v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, config).await?);

  if app.config.seed_demo {
    sv::seed::demo(&app.db).await?;
  }

  plugins::Plugins::default()
    .with(server::Http)
    .with(cron::MonthlySnapshot)
    .start(&app)
    .await?;

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
