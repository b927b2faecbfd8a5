use axum::{
  Json,
  body::Bytes,
  extract::{FromRequestParts, Path, State},
  http::{HeaderMap, StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{PromoStatus, agent, commission, promo_code, subscription},
  prelude::*,
  state::AppState,
  sv::{
    agent::{AgentChanges, NewAgent},
    commission::MonthTotals,
    payment::{self, Outcome, PaymentUpdate},
    payout::{MonthRange, Snapshot},
    promo::{NewPromo, PromoChanges},
    subscription::{NewSubscription, Onboarded, SubscriptionChanges},
  },
  utils,
};

type App = State<Arc<AppState>>;

pub const ADMIN_HEADER: &str = "x-admin-token";

/// Requests carrying the configured admin token.
pub struct Admin;

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts.headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok());

    match token {
      Some(token) if utils::secret_matches(&app.config.admin_token, token) => {
        Ok(Admin)
      }
      _ => Err(Error::Unauthorized),
    }
  }
}

#[derive(Serialize)]
pub struct Health {
  status: &'static str,
  version: &'static str,
}

pub async fn health() -> Json<Health> {
  Json(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Serialize)]
pub struct Ack {
  ok: bool,
}

/// Gateway callback. Unsigned or mis-signed requests are refused, malformed
/// but authentic ones are acknowledged so the gateway stops retrying.
pub async fn payment_webhook(
  State(app): App,
  headers: HeaderMap,
  body: Bytes,
) -> (StatusCode, Json<Ack>) {
  let signature = headers
    .get(payment::SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();

  if !payment::verify_signature(&app.config.webhook_secret, &body, signature) {
    warn!("payment callback with bad signature rejected");
    return (StatusCode::UNAUTHORIZED, Json(Ack { ok: false }));
  }

  let update: PaymentUpdate = match json::from_slice(&body) {
    Ok(update) => update,
    Err(err) => {
      debug!("malformed payment callback ignored: {err}");
      return (StatusCode::OK, Json(Ack { ok: true }));
    }
  };

  match app.sv().payment.apply(update).await {
    Ok(Outcome::Updated(sub)) => {
      info!(
        "subscription {} is {:?} (transaction {:?})",
        sub.id, sub.status, sub.transaction_record
      );
      (StatusCode::OK, Json(Ack { ok: true }))
    }
    Ok(Outcome::Ignored) => (StatusCode::OK, Json(Ack { ok: true })),
    Err(err) => {
      error!("payment callback failed: {err}");
      (StatusCode::INTERNAL_SERVER_ERROR, Json(Ack { ok: false }))
    }
  }
}

pub async fn list_agents(
  _: Admin,
  State(app): App,
) -> Result<Json<Vec<agent::Model>>> {
  Ok(Json(app.sv().agent.all().await?))
}

pub async fn create_agent(
  _: Admin,
  State(app): App,
  Json(input): Json<NewAgent>,
) -> Result<(StatusCode, Json<agent::Model>)> {
  let agent = app.sv().agent.create(input).await?;
  Ok((StatusCode::CREATED, Json(agent)))
}

pub async fn list_promos(
  _: Admin,
  State(app): App,
) -> Result<Json<Vec<promo_code::Model>>> {
  Ok(Json(app.sv().promo.all().await?))
}

pub async fn create_promo(
  _: Admin,
  State(app): App,
  Json(input): Json<NewPromo>,
) -> Result<(StatusCode, Json<promo_code::Model>)> {
  let promo = app.sv().promo.create(input).await?;
  Ok((StatusCode::CREATED, Json(promo)))
}

pub async fn update_agent(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
  Json(changes): Json<AgentChanges>,
) -> Result<Json<agent::Model>> {
  Ok(Json(app.sv().agent.update(&id, changes).await?))
}

pub async fn delete_agent(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
) -> Result<StatusCode> {
  app.sv().agent.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct PromoDetails {
  #[serde(flatten)]
  promo: promo_code::Model,
  /// Subscriptions currently referencing the code.
  subscriptions: u64,
}

pub async fn get_promo(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
) -> Result<Json<PromoDetails>> {
  let sv = app.sv();
  let promo = sv.promo.by_id(&id).await?.ok_or(Error::PromoNotFound)?;
  let subscriptions = sv.subscription.redemptions(&id).await?;
  Ok(Json(PromoDetails { promo, subscriptions }))
}

pub async fn update_promo(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
  Json(changes): Json<PromoChanges>,
) -> Result<Json<promo_code::Model>> {
  Ok(Json(app.sv().promo.update(&id, changes).await?))
}

pub async fn delete_promo(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
) -> Result<StatusCode> {
  app.sv().promo.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SetStatus {
  status: PromoStatus,
}

pub async fn set_promo_status(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
  Json(req): Json<SetStatus>,
) -> Result<StatusCode> {
  app.sv().promo.set_status(&id, req.status).await?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscriptions(
  _: Admin,
  State(app): App,
) -> Result<Json<Vec<subscription::Model>>> {
  Ok(Json(app.sv().subscription.all().await?))
}

pub async fn onboard_subscription(
  _: Admin,
  State(app): App,
  Json(input): Json<NewSubscription>,
) -> Result<(StatusCode, Json<Onboarded>)> {
  let onboarded = app.sv().subscription.onboard(input).await?;
  Ok((StatusCode::CREATED, Json(onboarded)))
}

pub async fn get_subscription(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
) -> Result<Json<Onboarded>> {
  let sv = app.sv();
  let subscription =
    sv.subscription.by_id(&id).await?.ok_or(Error::SubscriptionNotFound)?;
  let commission = sv.commission.by_subscription(&id).await?;
  Ok(Json(Onboarded { subscription, commission }))
}

pub async fn update_subscription(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
  Json(changes): Json<SubscriptionChanges>,
) -> Result<Json<subscription::Model>> {
  Ok(Json(app.sv().subscription.update(&id, changes).await?))
}

pub async fn delete_subscription(
  _: Admin,
  State(app): App,
  Path(id): Path<String>,
) -> Result<StatusCode> {
  app.sv().subscription.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn list_commissions(
  _: Admin,
  State(app): App,
) -> Result<Json<Vec<commission::Model>>> {
  Ok(Json(app.sv().commission.all().await?))
}

#[derive(Deserialize)]
pub struct MarkPaid {
  ids: Vec<String>,
}

#[derive(Serialize)]
pub struct Updated {
  updated: u64,
}

pub async fn mark_paid(
  _: Admin,
  State(app): App,
  Json(req): Json<MarkPaid>,
) -> Result<Json<Updated>> {
  let updated = app.sv().commission.mark_paid(&req.ids).await?;
  Ok(Json(Updated { updated }))
}

pub async fn month_totals(
  _: Admin,
  State(app): App,
  Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthTotals>> {
  Ok(Json(app.sv().commission.totals_for_month(year, month).await?))
}

pub async fn get_snapshot(
  _: Admin,
  State(app): App,
  Path(month): Path<String>,
) -> Result<Json<Snapshot>> {
  let range = MonthRange::parse(&month)?;
  let snapshot = app.sv().payout.by_month(&range.key()).await?;
  Ok(Json(snapshot.ok_or(Error::SnapshotNotFound)?))
}

pub async fn recompute_snapshot(
  _: Admin,
  State(app): App,
  Path(month): Path<String>,
) -> Result<Json<Snapshot>> {
  let range = MonthRange::parse(&month)?;
  Ok(Json(app.sv().payout.snapshot(range).await?))
}
