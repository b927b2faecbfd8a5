use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "unpaid")]
  #[default]
  Unpaid,
  #[sea_orm(string_value = "paid")]
  Paid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agent_promocode_commissions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub agent_id: String,
  pub promocode_id: String,
  #[sea_orm(unique)]
  pub subscription_id: String,
  pub commission_status: CommissionStatus,
  /// Cents, fixed at creation. Rendered as a decimal amount.
  #[serde(with = "crate::utils::cents")]
  pub amount: i64,
  pub currency: String,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
