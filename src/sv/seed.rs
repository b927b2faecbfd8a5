//! Demo data for local runs against a scratch database.

use crate::{
  entity::DiscountType,
  prelude::*,
  sv::{
    Agent, Commission, Promo, Subscription, agent::NewAgent, promo::NewPromo,
    subscription::NewSubscription,
  },
  utils,
};

/// Two agents with one promo code each and one subscription per code. The
/// second agent's commission is already paid. Does nothing when the data is
/// already there.
pub async fn demo(db: &DatabaseConnection) -> Result<()> {
  if Agent::new(db).by_id("ag_1").await?.is_some() {
    debug!("demo data already present");
    return Ok(());
  }

  let now = utils::now();
  let days = |n| now - TimeDelta::days(n);

  for (id, name, email) in [
    ("ag_1", "Alice Sales", "alice@agency.com"),
    ("ag_2", "Bob Sales", "bob@agency.com"),
  ] {
    Agent::new(db)
      .create_with_id(
        id.into(),
        NewAgent {
          display_name: name.into(),
          email: email.into(),
          user_id: None,
        },
      )
      .await?;
  }

  for (id, code, agent, discount_type, discount_value) in [
    ("pc_1", "ALICE20", "ag_1", DiscountType::Percentage, 20),
    ("pc_2", "BOB10", "ag_2", DiscountType::Fixed, 10_00),
  ] {
    Promo::new(db)
      .create_with_id(
        id.into(),
        NewPromo {
          code: code.into(),
          assigned_agent_id: Some(agent.into()),
          discount_type,
          discount_value,
          valid_from: None,
          valid_to: None,
          status: None,
          linked_subscription_id: None,
          created_by_admin_id: None,
        },
      )
      .await?;
  }

  let mut paid = Vec::new();
  for (id, email, plan, promo, start) in [
    ("sub_1", "clinic.one@example.com", "pro", "pc_1", days(14)),
    ("sub_2", "clinic.two@example.com", "basic", "pc_2", days(3)),
  ] {
    let onboarded = Subscription::new(db)
      .onboard_with_id(
        id.into(),
        NewSubscription {
          primary_email: email.into(),
          plan_type: plan.into(),
          promocode_id: Some(promo.into()),
          start_date: Some(start),
          ..Default::default()
        },
      )
      .await?;

    if id == "sub_2"
      && let Some(commission) = onboarded.commission
    {
      paid.push(commission.id);
    }
  }

  Commission::new(db).mark_paid(&paid).await?;

  info!("seeded demo data: 2 agents, 2 promo codes, 2 subscriptions");
  Ok(())
}
