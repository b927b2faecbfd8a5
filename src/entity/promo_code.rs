use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::agent;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
  #[sea_orm(string_value = "fixed")]
  Fixed,
  #[sea_orm(string_value = "percentage")]
  #[default]
  Percentage,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PromoStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "inactive")]
  Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promocodes")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  #[sea_orm(unique)]
  pub code: String,
  pub assigned_agent_id: Option<String>,
  pub discount_type: DiscountType,
  /// Amount in cents for `fixed`, whole percent for `percentage`.
  pub discount_value: i64,
  pub valid_from: Option<DateTime>,
  pub valid_to: Option<DateTime>,
  pub redemption_count: i32,
  pub status: PromoStatus,
  /// First subscription that redeemed this code. Set once.
  pub linked_subscription_id: Option<String>,
  pub created_by_admin_id: Option<String>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "agent::Entity",
    from = "Column::AssignedAgentId",
    to = "agent::Column::Id"
  )]
  Agent,
}

impl Related<agent::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Agent.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
