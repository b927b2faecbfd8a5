pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_agents;
mod m20261001_000002_create_promocodes;
mod m20261001_000003_create_subscriptions;
mod m20261001_000004_create_commissions;
mod m20261001_000005_create_monthly_payouts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261001_000001_create_agents::Migration),
      Box::new(m20261001_000002_create_promocodes::Migration),
      Box::new(m20261001_000003_create_subscriptions::Migration),
      Box::new(m20261001_000004_create_commissions::Migration),
      Box::new(m20261001_000005_create_monthly_payouts::Migration),
    ]
  }
}
