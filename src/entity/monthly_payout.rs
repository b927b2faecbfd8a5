use std::collections::BTreeMap;

use sea_orm::{FromJsonQueryResult, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Amounts are cents in memory and decimal amounts in the stored JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTotals {
  #[serde(with = "crate::utils::cents")]
  pub unpaid: i64,
  #[serde(with = "crate::utils::cents")]
  pub paid: i64,
  pub ids: Vec<String>,
}

/// Per-agent totals keyed by agent id. Ordered so that serializing the same
/// commissions twice yields the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, FromJsonQueryResult)]
pub struct ByAgent(pub BTreeMap<String, AgentTotals>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_payouts")]
pub struct Model {
  /// `YYYY-MM` of the period start.
  #[sea_orm(primary_key, auto_increment = false)]
  pub month: String,
  pub range_start: DateTime,
  pub range_end: DateTime,
  #[sea_orm(column_type = "Json")]
  pub by_agent: ByAgent,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
