use sea_orm::sea_query::OnConflict;
use serde::Serialize;

use crate::{
  entity::{CommissionStatus, commission, subscription},
  prelude::*,
  sv::{payout::MonthRange, promo},
  utils,
};

/// Share of the plan price owed to the agent, in percent.
pub const COMMISSION_RATE: i64 = 20;
pub const CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
  Basic,
  Pro,
  Enterprise,
}

impl Plan {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "basic" => Some(Self::Basic),
      "pro" => Some(Self::Pro),
      "enterprise" => Some(Self::Enterprise),
      _ => None,
    }
  }

  /// List price in cents.
  pub fn price(self) -> i64 {
    match self {
      Plan::Basic => 49_00,
      Plan::Pro => 99_00,
      Plan::Enterprise => 199_00,
    }
  }
}

/// Unknown plan types price as zero.
pub fn plan_price(plan_type: &str) -> i64 {
  Plan::parse(plan_type).map_or(0, Plan::price)
}

/// `round2(price * rate)` carried out in cents, half rounded up.
pub fn commission_amount(plan_type: &str) -> i64 {
  (plan_price(plan_type) * COMMISSION_RATE + 50) / 100
}

/// Runs once for a freshly created subscription.
///
/// Records the promo code redemption and, when the code belongs to an agent,
/// creates that agent's unpaid commission. A subscription without a promo
/// code, or pointing at a code that does not exist, is skipped.
pub async fn on_subscription_created<C: ConnectionTrait>(
  conn: &C,
  sub: &subscription::Model,
) -> Result<Option<commission::Model>> {
  let Some(promo_id) = sub.promocode_id.as_deref() else {
    return Ok(None);
  };

  let Some(promo) = promo::redeem(conn, promo_id, &sub.id).await? else {
    debug!("subscription {} references unknown promo {promo_id}", sub.id);
    return Ok(None);
  };

  let Some(agent_id) = promo.assigned_agent_id else {
    debug!("promo {} has no agent, no commission", promo.code);
    return Ok(None);
  };

  let amount = commission_amount(&sub.plan_type);
  let model = commission::ActiveModel {
    id: Set(utils::new_id("cm")),
    agent_id: Set(agent_id.clone()),
    promocode_id: Set(promo.id),
    subscription_id: Set(sub.id.clone()),
    commission_status: Set(CommissionStatus::Unpaid),
    amount: Set(amount),
    currency: Set(CURRENCY.to_string()),
    created_at: Set(sub.start_date),
    updated_at: Set(utils::now()),
  };

  // one commission per subscription, a repeated call keeps the first
  let inserted = commission::Entity::insert(model)
    .on_conflict(
      OnConflict::column(commission::Column::SubscriptionId)
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

  if inserted == 0 {
    warn!("commission for subscription {} already exists", sub.id);
  } else {
    info!(
      "commission {} {CURRENCY} for agent {agent_id} (subscription {})",
      utils::format_amount(amount),
      sub.id
    );
  }

  Ok(
    commission::Entity::find()
      .filter(commission::Column::SubscriptionId.eq(sub.id.as_str()))
      .one(conn)
      .await?,
  )
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
  #[serde(with = "utils::cents")]
  pub unpaid: i64,
  #[serde(with = "utils::cents")]
  pub paid: i64,
  pub count: u64,
}

pub struct Commission<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Commission<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn all(&self) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .order_by_desc(commission::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  pub async fn by_subscription(
    &self,
    subscription_id: &str,
  ) -> Result<Option<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::SubscriptionId.eq(subscription_id))
        .one(self.db)
        .await?,
    )
  }

  /// Commissions created inside `range`, oldest first.
  pub async fn in_range(
    &self,
    range: &MonthRange,
  ) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::CreatedAt.gte(range.start))
        .filter(commission::Column::CreatedAt.lt(range.next_start()))
        .order_by_asc(commission::Column::CreatedAt)
        .order_by_asc(commission::Column::Id)
        .all(self.db)
        .await?,
    )
  }

  /// Moves the given commissions from unpaid to paid. Already paid ones are
  /// left alone. Returns how many rows changed.
  pub async fn mark_paid(&self, ids: &[String]) -> Result<u64> {
    if ids.is_empty() {
      return Ok(0);
    }

    let result = commission::Entity::update_many()
      .set(commission::ActiveModel {
        commission_status: Set(CommissionStatus::Paid),
        updated_at: Set(utils::now()),
        ..Default::default()
      })
      .filter(commission::Column::Id.is_in(ids.iter().cloned()))
      .filter(
        commission::Column::CommissionStatus.eq(CommissionStatus::Unpaid),
      )
      .exec(self.db)
      .await?;

    Ok(result.rows_affected)
  }

  pub async fn totals_for_month(
    &self,
    year: i32,
    month: u32,
  ) -> Result<MonthTotals> {
    let range = MonthRange::month(year, month)?;
    let commissions = self.in_range(&range).await?;

    Ok(commissions.iter().fold(MonthTotals::default(), |mut acc, c| {
      match c.commission_status {
        CommissionStatus::Paid => acc.paid += c.amount,
        CommissionStatus::Unpaid => acc.unpaid += c.amount,
      }
      acc.count += 1;
      acc
    }))
  }
}
