use std::env;

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

use crate::{prelude::*, sv};

#[derive(Debug, Clone)]
pub struct Config {
  pub port: u16,
  /// Key for the payment webhook HMAC.
  pub webhook_secret: String,
  pub admin_token: String,
  /// Delay after midnight on the 1st before the monthly snapshot runs.
  pub snapshot_offset: Duration,
  pub seed_demo: bool,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    use anyhow::Context;

    let port = match env::var("PORT") {
      Ok(port) => port.parse().context("PORT must be a port number")?,
      Err(_) => 3000,
    };

    let webhook_secret =
      env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET not set")?;
    let admin_token = env::var("ADMIN_TOKEN").context("ADMIN_TOKEN not set")?;

    let snapshot_offset = match env::var("SNAPSHOT_OFFSET") {
      Ok(offset) => humantime::parse_duration(&offset)
        .context("SNAPSHOT_OFFSET must be a duration like `5m`")?,
      Err(_) => Duration::from_secs(5 * 60),
    };

    let seed_demo = env::var("SEED_DEMO")
      .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
      .unwrap_or(false);

    Ok(Self { port, webhook_secret, admin_token, snapshot_offset, seed_demo })
  }
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

/// Services borrowed from the shared connection.
pub struct Services<'a> {
  pub agent: sv::Agent<'a>,
  pub promo: sv::Promo<'a>,
  pub subscription: sv::Subscription<'a>,
  pub commission: sv::Commission<'a>,
  pub payout: sv::Payout<'a>,
  pub payment: sv::Payment<'a>,
}

impl AppState {
  pub async fn new(db_url: &str, config: Config) -> Result<Self> {
    let db = Database::connect(db_url).await?;
    Migrator::up(&db, None).await?;
    Ok(Self { db, config })
  }

  #[cfg(test)]
  pub fn with_db(db: DatabaseConnection, config: Config) -> Self {
    Self { db, config }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      agent: sv::Agent::new(&self.db),
      promo: sv::Promo::new(&self.db),
      subscription: sv::Subscription::new(&self.db),
      commission: sv::Commission::new(&self.db),
      payout: sv::Payout::new(&self.db),
      payment: sv::Payment::new(&self.db),
    }
  }
}
