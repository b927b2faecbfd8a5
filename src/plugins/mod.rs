//! Long-running parts of the service, started once the database is migrated.

pub mod cron;
pub mod server;

use std::sync::Arc;

use anyhow::Context;

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  /// Label used in start-up logs and errors.
  fn name(&self) -> &'static str;

  /// Spawns the plugin's background work. Returning an error aborts boot.
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Plugins in start order.
#[derive(Default)]
pub struct Plugins(Vec<Box<dyn Plugin>>);

impl Plugins {
  pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
    self.0.push(Box::new(plugin));
    self
  }

  /// Starts every plugin in turn and stops at the first failure, so the
  /// service never runs with a missing HTTP listener or scheduler.
  pub async fn start(self, app: &Arc<AppState>) -> anyhow::Result<()> {
    for plugin in self.0 {
      let name = plugin.name();
      plugin
        .start(app.clone())
        .await
        .with_context(|| format!("failed to start `{name}`"))?;
      tracing::info!("started `{name}`");
    }
    Ok(())
  }
}
