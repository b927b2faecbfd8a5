use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::promo_code;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agents")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub display_name: String,
  pub email: String,
  pub user_id: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "promo_code::Entity")]
  PromoCodes,
}

impl Related<promo_code::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::PromoCodes.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
