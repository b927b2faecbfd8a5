use std::sync::Arc;

use async_trait::async_trait;

use crate::{
  plugins::Plugin, prelude::*, state::AppState, sv::payout::MonthRange, utils,
};

/// Writes last month's payout snapshot shortly after the month turns (UTC).
pub struct MonthlySnapshot;

#[async_trait]
impl Plugin for MonthlySnapshot {
  fn name(&self) -> &'static str {
    "monthly-snapshot"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let offset = app.config.snapshot_offset;
    // fail at boot rather than inside the loop
    next_run(utils::now(), offset)?;

    tokio::spawn(async move {
      loop {
        let now = utils::now();
        let at = match next_run(now, offset) {
          Ok(at) => at,
          Err(err) => {
            error!("Cannot schedule monthly snapshot: {err}");
            return;
          }
        };

        let sleep = (at - now).to_std().unwrap_or(Duration::from_secs(60));
        info!("Monthly payout snapshot scheduled at {at} UTC");
        tokio::time::sleep(sleep).await;

        match app.sv().payout.snapshot_previous_month(utils::now()).await {
          Ok(snapshot) => info!(
            "Monthly snapshot {} written ({} agents)",
            snapshot.month,
            snapshot.by_agent.0.len()
          ),
          Err(err) => error!("Monthly snapshot failed: {err}"),
        }
      }
    });

    Ok(())
  }
}

/// First instant after `now` that is the 1st of a month plus `offset`.
pub fn next_run(now: DateTime, offset: Duration) -> Result<DateTime> {
  let offset = TimeDelta::from_std(offset)
    .map_err(|_| Error::InvalidArgs("snapshot offset out of range".into()))?;

  let current = MonthRange::containing(now)?;
  let this_month = current.start + offset;
  if now < this_month {
    return Ok(this_month);
  }

  Ok(current.next_start() + offset)
}
