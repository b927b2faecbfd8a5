use sea_orm::sea_query::Expr;
use serde::Deserialize;

use crate::{
  entity::{DiscountType, PromoStatus, agent, promo_code},
  prelude::*,
  utils,
};

pub struct Promo<'a> {
  db: &'a DatabaseConnection,
}

fn check_terms(
  code: &str,
  discount_type: DiscountType,
  discount_value: i64,
  valid_from: Option<DateTime>,
  valid_to: Option<DateTime>,
) -> Result<()> {
  if code.is_empty() {
    return Err(Error::InvalidArgs("code must not be empty".into()));
  }
  if discount_value < 0 {
    return Err(Error::InvalidArgs("negative discount_value".into()));
  }
  if discount_type == DiscountType::Percentage && discount_value > 100 {
    return Err(Error::InvalidArgs("percentage discount above 100".into()));
  }
  if let (Some(from), Some(to)) = (valid_from, valid_to)
    && from > to
  {
    return Err(Error::InvalidArgs("valid_from is after valid_to".into()));
  }
  Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPromo {
  pub code: String,
  #[serde(default)]
  pub assigned_agent_id: Option<String>,
  pub discount_type: DiscountType,
  pub discount_value: i64,
  #[serde(default)]
  pub valid_from: Option<DateTime>,
  #[serde(default)]
  pub valid_to: Option<DateTime>,
  #[serde(default)]
  pub status: Option<PromoStatus>,
  #[serde(default)]
  pub linked_subscription_id: Option<String>,
  #[serde(default)]
  pub created_by_admin_id: Option<String>,
}

/// Admin edit of a promo code. Absent fields stay as they are. The
/// redemption counter and first-subscription link are not editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromoChanges {
  pub code: Option<String>,
  pub assigned_agent_id: Option<String>,
  pub discount_type: Option<DiscountType>,
  pub discount_value: Option<i64>,
  pub valid_from: Option<DateTime>,
  pub valid_to: Option<DateTime>,
  pub status: Option<PromoStatus>,
}

impl<'a> Promo<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, input: NewPromo) -> Result<promo_code::Model> {
    self.create_with_id(utils::new_id("pc"), input).await
  }

  pub async fn create_with_id(
    &self,
    id: String,
    input: NewPromo,
  ) -> Result<promo_code::Model> {
    let code = input.code.trim().to_string();
    check_terms(
      &code,
      input.discount_type,
      input.discount_value,
      input.valid_from,
      input.valid_to,
    )?;

    if let Some(agent_id) = &input.assigned_agent_id {
      self.ensure_agent(agent_id).await?;
    }

    if self.by_code(&code).await?.is_some() {
      return Err(Error::PromoExists(code));
    }

    let now = utils::now();
    let promo = promo_code::ActiveModel {
      id: Set(id),
      code: Set(code),
      assigned_agent_id: Set(input.assigned_agent_id),
      discount_type: Set(input.discount_type),
      discount_value: Set(input.discount_value),
      valid_from: Set(input.valid_from),
      valid_to: Set(input.valid_to),
      redemption_count: Set(0),
      status: Set(input.status.unwrap_or_default()),
      linked_subscription_id: Set(input.linked_subscription_id),
      created_by_admin_id: Set(input.created_by_admin_id),
      created_at: Set(now),
      updated_at: Set(now),
    };

    Ok(promo.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<promo_code::Model>> {
    Ok(promo_code::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<promo_code::Model>> {
    Ok(
      promo_code::Entity::find()
        .filter(promo_code::Column::Code.eq(code))
        .one(self.db)
        .await?,
    )
  }

  pub async fn all(&self) -> Result<Vec<promo_code::Model>> {
    Ok(
      promo_code::Entity::find()
        .order_by_desc(promo_code::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn set_status(&self, id: &str, status: PromoStatus) -> Result<()> {
    self
      .update(id, PromoChanges { status: Some(status), ..Default::default() })
      .await?;
    Ok(())
  }

  pub async fn update(
    &self,
    id: &str,
    changes: PromoChanges,
  ) -> Result<promo_code::Model> {
    let promo = self.by_id(id).await?.ok_or(Error::PromoNotFound)?;

    let code = changes
      .code
      .map(|code| code.trim().to_string())
      .unwrap_or_else(|| promo.code.clone());
    let discount_type = changes.discount_type.unwrap_or(promo.discount_type);
    let discount_value = changes.discount_value.unwrap_or(promo.discount_value);
    let valid_from = changes.valid_from.or(promo.valid_from);
    let valid_to = changes.valid_to.or(promo.valid_to);
    check_terms(&code, discount_type, discount_value, valid_from, valid_to)?;

    if let Some(agent_id) = &changes.assigned_agent_id {
      self.ensure_agent(agent_id).await?;
    }
    if code != promo.code && self.by_code(&code).await?.is_some() {
      return Err(Error::PromoExists(code));
    }

    let mut model: promo_code::ActiveModel = promo.into();
    model.code = Set(code);
    model.discount_type = Set(discount_type);
    model.discount_value = Set(discount_value);
    model.valid_from = Set(valid_from);
    model.valid_to = Set(valid_to);
    if let Some(agent_id) = changes.assigned_agent_id {
      model.assigned_agent_id = Set(Some(agent_id));
    }
    if let Some(status) = changes.status {
      model.status = Set(status);
    }
    model.updated_at = Set(utils::now());

    Ok(model.update(self.db).await?)
  }

  /// Subscriptions keep their `promocode_id` and commissions stay as they
  /// are.
  pub async fn delete(&self, id: &str) -> Result<()> {
    let res = promo_code::Entity::delete_by_id(id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::PromoNotFound);
    }

    info!("promo code {id} deleted");
    Ok(())
  }

  async fn ensure_agent(&self, agent_id: &str) -> Result<()> {
    match agent::Entity::find_by_id(agent_id).one(self.db).await? {
      Some(_) => Ok(()),
      None => Err(Error::AgentNotFound),
    }
  }
}

/// Record one redemption of `promo_id` by `subscription_id`.
///
/// The counter is bumped in place (`count = count + 1`) so concurrent
/// redemptions never lose an increment. The first-redemption link is a
/// conditional write on `linked_subscription_id IS NULL`: whichever
/// subscription lands first keeps it.
///
/// Returns the updated promo code, or `None` when it does not exist.
pub async fn redeem<C: ConnectionTrait>(
  conn: &C,
  promo_id: &str,
  subscription_id: &str,
) -> Result<Option<promo_code::Model>> {
  use promo_code::Column;

  let bumped = promo_code::Entity::update_many()
    .col_expr(
      Column::RedemptionCount,
      Expr::col(Column::RedemptionCount).add(1),
    )
    .col_expr(Column::UpdatedAt, Expr::value(utils::now()))
    .filter(Column::Id.eq(promo_id))
    .exec(conn)
    .await?;

  if bumped.rows_affected == 0 {
    return Ok(None);
  }

  promo_code::Entity::update_many()
    .col_expr(Column::LinkedSubscriptionId, Expr::value(subscription_id))
    .filter(Column::Id.eq(promo_id))
    .filter(Column::LinkedSubscriptionId.is_null())
    .exec(conn)
    .await?;

  Ok(promo_code::Entity::find_by_id(promo_id).one(conn).await?)
}
