use serde::Deserialize;

use crate::{
  entity::{agent, promo_code},
  prelude::*,
  utils,
};

pub struct Agent<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAgent {
  pub display_name: String,
  pub email: String,
  #[serde(default)]
  pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentChanges {
  pub display_name: Option<String>,
  pub email: Option<String>,
  pub user_id: Option<String>,
}

impl<'a> Agent<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, input: NewAgent) -> Result<agent::Model> {
    self.create_with_id(utils::new_id("ag"), input).await
  }

  pub async fn create_with_id(
    &self,
    id: String,
    input: NewAgent,
  ) -> Result<agent::Model> {
    if input.display_name.trim().is_empty() {
      return Err(Error::InvalidArgs("display_name must not be empty".into()));
    }

    let agent = agent::ActiveModel {
      id: Set(id),
      display_name: Set(input.display_name),
      email: Set(input.email),
      user_id: Set(input.user_id),
      created_at: Set(utils::now()),
    };

    Ok(agent.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<agent::Model>> {
    Ok(agent::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<agent::Model>> {
    Ok(
      agent::Entity::find()
        .order_by_asc(agent::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn update(
    &self,
    id: &str,
    changes: AgentChanges,
  ) -> Result<agent::Model> {
    let agent = self.by_id(id).await?.ok_or(Error::AgentNotFound)?;

    let mut model: agent::ActiveModel = agent.into();
    if let Some(name) = changes.display_name {
      if name.trim().is_empty() {
        return Err(Error::InvalidArgs("display_name must not be empty".into()));
      }
      model.display_name = Set(name);
    }
    if let Some(email) = changes.email {
      model.email = Set(email);
    }
    if let Some(user_id) = changes.user_id {
      model.user_id = Set(Some(user_id));
    }

    Ok(model.update(self.db).await?)
  }

  /// Removes the agent and unassigns its promo codes. Commissions already
  /// earned keep their `agent_id` for payout history.
  pub async fn delete(&self, id: &str) -> Result<()> {
    use sea_orm::sea_query::Expr;

    let txn = self.db.begin().await?;

    let unassigned = promo_code::Entity::update_many()
      .col_expr(
        promo_code::Column::AssignedAgentId,
        Expr::value(Option::<String>::None),
      )
      .col_expr(promo_code::Column::UpdatedAt, Expr::value(utils::now()))
      .filter(promo_code::Column::AssignedAgentId.eq(id))
      .exec(&txn)
      .await?;

    let res = agent::Entity::delete_by_id(id).exec(&txn).await?;
    if res.rows_affected == 0 {
      return Err(Error::AgentNotFound);
    }

    txn.commit().await?;

    info!(
      "agent {id} deleted, {} promo code(s) unassigned",
      unassigned.rows_affected
    );
    Ok(())
  }
}
