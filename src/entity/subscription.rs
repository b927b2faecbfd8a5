use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "inactive")]
  Inactive,
  #[sea_orm(string_value = "expired")]
  Expired,
}

impl SubscriptionStatus {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "active" => Some(Self::Active),
      "inactive" => Some(Self::Inactive),
      "expired" => Some(Self::Expired),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub primary_email: String,
  /// Kept as free text: plans outside the price table are priced at zero.
  pub plan_type: String,
  pub promocode_id: Option<String>,
  pub status: SubscriptionStatus,
  pub start_date: DateTime,
  pub end_date: Option<DateTime>,
  pub payment_method: Option<String>,
  pub transaction_record: Option<String>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

/// `promocode_id` may point at a code that no longer exists, so it is not a
/// foreign key.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
