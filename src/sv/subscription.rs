use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{SubscriptionStatus, commission, promo_code, subscription},
  prelude::*,
  sv, utils,
};

pub const DEFAULT_PAYMENT_METHOD: &str = "flouci";

pub struct Subscription<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewSubscription {
  pub primary_email: String,
  pub plan_type: String,
  pub promocode_id: Option<String>,
  pub status: Option<SubscriptionStatus>,
  pub start_date: Option<DateTime>,
  pub end_date: Option<DateTime>,
  pub payment_method: Option<String>,
  pub transaction_record: Option<String>,
}

/// Admin edit of a subscription. The promo code is fixed at onboarding and
/// a plan change does not touch the commission already earned.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscriptionChanges {
  pub primary_email: Option<String>,
  pub plan_type: Option<String>,
  pub status: Option<SubscriptionStatus>,
  pub end_date: Option<DateTime>,
  pub payment_method: Option<String>,
  pub transaction_record: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Onboarded {
  pub subscription: subscription::Model,
  pub commission: Option<commission::Model>,
}

impl<'a> Subscription<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn onboard(&self, input: NewSubscription) -> Result<Onboarded> {
    self.onboard_with_id(utils::new_id("sub"), input).await
  }

  /// Creates the subscription and evaluates its commission in one
  /// transaction, so a subscription never exists without its redemption
  /// having been recorded.
  pub async fn onboard_with_id(
    &self,
    id: String,
    input: NewSubscription,
  ) -> Result<Onboarded> {
    if !input.primary_email.contains('@') {
      return Err(Error::InvalidArgs("primary_email is not an email".into()));
    }
    if input.plan_type.trim().is_empty() {
      return Err(Error::InvalidArgs("plan_type must not be empty".into()));
    }
    if sv::commission::Plan::parse(&input.plan_type).is_none() {
      warn!("unknown plan type `{}`, priced at zero", input.plan_type);
    }

    let now = utils::now();
    let model = subscription::ActiveModel {
      id: Set(id),
      primary_email: Set(input.primary_email),
      plan_type: Set(input.plan_type),
      promocode_id: Set(input.promocode_id),
      status: Set(input.status.unwrap_or_default()),
      start_date: Set(input.start_date.unwrap_or(now)),
      end_date: Set(input.end_date),
      payment_method: Set(Some(
        input.payment_method.unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.into()),
      )),
      transaction_record: Set(input.transaction_record),
      created_at: Set(now),
      updated_at: Set(now),
    };

    let txn = self.db.begin().await?;

    let subscription = model.insert(&txn).await?;
    let commission =
      sv::commission::on_subscription_created(&txn, &subscription).await?;

    txn.commit().await?;

    info!(
      "onboarded subscription {} ({}, promo: {:?})",
      subscription.id, subscription.plan_type, subscription.promocode_id
    );

    Ok(Onboarded { subscription, commission })
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<subscription::Model>> {
    Ok(subscription::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<subscription::Model>> {
    Ok(
      subscription::Entity::find()
        .order_by_desc(subscription::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Count of subscriptions that redeemed `promo_id`.
  pub async fn redemptions(&self, promo_id: &str) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    Ok(
      subscription::Entity::find()
        .filter(subscription::Column::PromocodeId.eq(promo_id))
        .count(self.db)
        .await?,
    )
  }

  pub async fn update(
    &self,
    id: &str,
    changes: SubscriptionChanges,
  ) -> Result<subscription::Model> {
    let sub = self.by_id(id).await?.ok_or(Error::SubscriptionNotFound)?;

    let mut model: subscription::ActiveModel = sub.into();
    if let Some(email) = changes.primary_email {
      if !email.contains('@') {
        return Err(Error::InvalidArgs("primary_email is not an email".into()));
      }
      model.primary_email = Set(email);
    }
    if let Some(plan) = changes.plan_type {
      if plan.trim().is_empty() {
        return Err(Error::InvalidArgs("plan_type must not be empty".into()));
      }
      model.plan_type = Set(plan);
    }
    if let Some(status) = changes.status {
      model.status = Set(status);
    }
    if let Some(end_date) = changes.end_date {
      model.end_date = Set(Some(end_date));
    }
    if let Some(method) = changes.payment_method {
      model.payment_method = Set(Some(method));
    }
    if let Some(record) = changes.transaction_record {
      model.transaction_record = Set(Some(record));
    }
    model.updated_at = Set(utils::now());

    Ok(model.update(self.db).await?)
  }

  /// Deletes the subscription and gives its redemption back to the promo
  /// code. The first-subscription link and any commission are kept.
  pub async fn delete(&self, id: &str) -> Result<()> {
    use promo_code::Column;

    let txn = self.db.begin().await?;

    let sub = subscription::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::SubscriptionNotFound)?;
    subscription::Entity::delete_by_id(id).exec(&txn).await?;

    if let Some(promo_id) = &sub.promocode_id {
      promo_code::Entity::update_many()
        .col_expr(
          Column::RedemptionCount,
          Expr::col(Column::RedemptionCount).sub(1),
        )
        .col_expr(Column::UpdatedAt, Expr::value(utils::now()))
        .filter(Column::Id.eq(promo_id.as_str()))
        .filter(Column::RedemptionCount.gt(0))
        .exec(&txn)
        .await?;
    }

    txn.commit().await?;

    info!("subscription {id} deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn input(plan: &str) -> NewSubscription {
    NewSubscription {
      primary_email: "clinic.one@example.com".into(),
      plan_type: plan.into(),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn test_onboard_defaults() {
    let db = test_db::setup().await;

    let onboarded = Subscription::new(&db).onboard(input("pro")).await.unwrap();
    let sub = onboarded.subscription;

    assert!(sub.id.starts_with("sub_"));
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.payment_method.as_deref(), Some("flouci"));
    assert_eq!(sub.start_date, sub.created_at);
    assert!(onboarded.commission.is_none());
  }

  #[tokio::test]
  async fn test_onboard_rejects_bad_email() {
    let db = test_db::setup().await;

    let result = Subscription::new(&db)
      .onboard(NewSubscription { primary_email: "nope".into(), ..input("pro") })
      .await;

    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_duplicate_id_rolls_back() {
    let db = test_db::setup().await;
    let sv = Subscription::new(&db);

    sv.onboard_with_id("sub_1".into(), input("pro")).await.unwrap();
    let result = sv.onboard_with_id("sub_1".into(), input("basic")).await;

    assert!(matches!(result, Err(Error::Db(_))));
    assert_eq!(sv.all().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_redemptions_match_promo_counter() {
    let db = test_db::setup().await;
    let promo = sv::Promo::new(&db)
      .create(sv::promo::NewPromo {
        code: "ALICE20".into(),
        assigned_agent_id: None,
        discount_type: crate::entity::DiscountType::Percentage,
        discount_value: 20,
        valid_from: None,
        valid_to: None,
        status: None,
        linked_subscription_id: None,
        created_by_admin_id: None,
      })
      .await
      .unwrap();
    let sv = Subscription::new(&db);

    for plan in ["basic", "pro", "enterprise"] {
      sv.onboard(NewSubscription {
        promocode_id: Some(promo.id.clone()),
        ..input(plan)
      })
      .await
      .unwrap();
    }

    let promo = sv::Promo::new(&db).by_id(&promo.id).await.unwrap().unwrap();
    assert_eq!(promo.redemption_count as u64, 3);
    assert_eq!(sv.redemptions(&promo.id).await.unwrap(), 3);
  }

  #[tokio::test]
  async fn test_update_subscription() {
    let db = test_db::setup().await;
    let sv = Subscription::new(&db);
    sv.onboard_with_id("sub_1".into(), input("pro")).await.unwrap();

    let updated = sv
      .update(
        "sub_1",
        SubscriptionChanges {
          status: Some(SubscriptionStatus::Expired),
          payment_method: Some("card".into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.status, SubscriptionStatus::Expired);
    assert_eq!(updated.payment_method.as_deref(), Some("card"));
    assert_eq!(updated.plan_type, "pro");

    let bad = sv
      .update(
        "sub_1",
        SubscriptionChanges {
          primary_email: Some("nope".into()),
          ..Default::default()
        },
      )
      .await;
    assert!(matches!(bad, Err(Error::InvalidArgs(_))));

    let missing = sv.update("sub_404", SubscriptionChanges::default()).await;
    assert!(matches!(missing, Err(Error::SubscriptionNotFound)));
  }

  #[tokio::test]
  async fn test_plan_change_keeps_commission_amount() {
    let db = test_db::setup().await;
    let promo = agent_promo(&db).await;
    let sv = Subscription::new(&db);
    let onboarded = sv
      .onboard(NewSubscription {
        promocode_id: Some(promo.id.clone()),
        ..input("pro")
      })
      .await
      .unwrap();
    let sub_id = onboarded.subscription.id;

    sv.update(
      &sub_id,
      SubscriptionChanges {
        plan_type: Some("enterprise".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    let commission =
      sv::Commission::new(&db).by_subscription(&sub_id).await.unwrap().unwrap();
    assert_eq!(commission.amount, 19_80);
  }

  #[tokio::test]
  async fn test_delete_returns_redemption() {
    let db = test_db::setup().await;
    let promo = agent_promo(&db).await;
    let sv = Subscription::new(&db);

    for id in ["sub_1", "sub_2"] {
      sv.onboard_with_id(
        id.into(),
        NewSubscription {
          promocode_id: Some(promo.id.clone()),
          ..input("pro")
        },
      )
      .await
      .unwrap();
    }

    sv.delete("sub_1").await.unwrap();

    assert!(sv.by_id("sub_1").await.unwrap().is_none());
    let promo = sv::Promo::new(&db).by_id(&promo.id).await.unwrap().unwrap();
    assert_eq!(promo.redemption_count, 1);
    assert_eq!(sv.redemptions(&promo.id).await.unwrap(), 1);
    assert_eq!(promo.linked_subscription_id.as_deref(), Some("sub_1"));

    let kept = sv::Commission::new(&db).by_subscription("sub_1").await.unwrap();
    assert_eq!(kept.map(|c| c.amount), Some(19_80));

    let again = sv.delete("sub_1").await;
    assert!(matches!(again, Err(Error::SubscriptionNotFound)));
  }

  async fn agent_promo(db: &DatabaseConnection) -> promo_code::Model {
    sv::Agent::new(db)
      .create_with_id(
        "ag_1".into(),
        sv::agent::NewAgent {
          display_name: "Alice Sales".into(),
          email: "alice@agency.com".into(),
          user_id: None,
        },
      )
      .await
      .unwrap();

    sv::Promo::new(db)
      .create(sv::promo::NewPromo {
        code: "ALICE20".into(),
        assigned_agent_id: Some("ag_1".into()),
        discount_type: crate::entity::DiscountType::Percentage,
        discount_value: 20,
        valid_from: None,
        valid_to: None,
        status: None,
        linked_subscription_id: None,
        created_by_admin_id: None,
      })
      .await
      .unwrap()
  }
}
