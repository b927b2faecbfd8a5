//! Payment gateway callbacks.
//!
//! The gateway posts `{subscriptionId, transactionId?, status?}` and signs the
//! raw body with HMAC-SHA256 keyed by the shared webhook secret. The hex
//! digest travels in the `X-Signature` header.
//!
//! Gateway outcomes (`success`, `failed`) are folded into subscription
//! statuses. Anything else, `pending` included, keeps the current status but
//! still records the transaction.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::{
  entity::{SubscriptionStatus, subscription},
  prelude::*,
  utils,
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";
/// Stored when the gateway omits the transaction id.
pub const TRANSACTION_PLACEHOLDER: &str = "mock";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentUpdate {
  pub subscription_id: Option<String>,
  pub transaction_id: Option<String>,
  pub status: Option<String>,
}

#[derive(Debug)]
pub enum Outcome {
  /// Acknowledged without touching anything.
  Ignored,
  Updated(subscription::Model),
}

/// Status carried by a callback, in gateway or subscription terms.
pub fn callback_status(raw: &str) -> Option<SubscriptionStatus> {
  match raw {
    "success" => Some(SubscriptionStatus::Active),
    "failed" => Some(SubscriptionStatus::Inactive),
    _ => SubscriptionStatus::parse(raw),
  }
}

#[cfg(test)]
pub fn sign(secret: &str, body: &[u8]) -> String {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC can take key of any size");
  mac.update(body);
  hex::encode(mac.finalize().into_bytes())
}

pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
  let signature = signature.trim();
  let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

  let Ok(expected) = hex::decode(signature) else {
    return false;
  };

  let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
    return false;
  };
  mac.update(body);
  mac.verify_slice(&expected).is_ok()
}

pub struct Payment<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn apply(&self, update: PaymentUpdate) -> Result<Outcome> {
    let Some(subscription_id) =
      update.subscription_id.filter(|id| !id.is_empty())
    else {
      debug!("payment callback without subscriptionId, ignoring");
      return Ok(Outcome::Ignored);
    };

    let Some(sub) =
      subscription::Entity::find_by_id(&subscription_id).one(self.db).await?
    else {
      warn!("payment callback for unknown subscription {subscription_id}");
      return Ok(Outcome::Ignored);
    };

    let status = match update.status.as_deref().filter(|s| !s.is_empty()) {
      None => SubscriptionStatus::Active,
      Some(raw) => callback_status(raw).unwrap_or_else(|| {
        debug!("payment callback for {subscription_id}: status `{raw}` kept");
        sub.status
      }),
    };

    let transaction = update
      .transaction_id
      .filter(|id| !id.is_empty())
      .unwrap_or_else(|| TRANSACTION_PLACEHOLDER.into());

    let updated = subscription::ActiveModel {
      transaction_record: Set(Some(transaction)),
      status: Set(status),
      updated_at: Set(utils::now()),
      ..sub.into()
    }
    .update(self.db)
    .await?;

    Ok(Outcome::Updated(updated))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{
    Subscription, subscription::NewSubscription, test_utils::test_db,
  };

  async fn seed(db: &DatabaseConnection) {
    Subscription::new(db)
      .onboard_with_id(
        "sub_1".into(),
        NewSubscription {
          primary_email: "clinic.one@example.com".into(),
          plan_type: "pro".into(),
          status: Some(SubscriptionStatus::Inactive),
          ..Default::default()
        },
      )
      .await
      .unwrap();
  }

  fn update(
    sub: Option<&str>,
    tx: Option<&str>,
    status: Option<&str>,
  ) -> PaymentUpdate {
    PaymentUpdate {
      subscription_id: sub.map(Into::into),
      transaction_id: tx.map(Into::into),
      status: status.map(Into::into),
    }
  }

  #[test]
  fn test_signature_roundtrip() {
    let body = br#"{"subscriptionId":"sub_1"}"#;
    let sig = sign("secret", body);

    assert!(verify_signature("secret", body, &sig));
    assert!(verify_signature("secret", body, &format!("sha256={sig}")));
    assert!(!verify_signature("other", body, &sig));
    assert!(!verify_signature("secret", b"{}", &sig));
    assert!(!verify_signature("secret", body, "not-hex"));
    assert!(!verify_signature("secret", body, ""));
  }

  #[test]
  fn test_parse_camel_case_body() {
    let body = r#"{"subscriptionId":"sub_1","transactionId":"tx_99"}"#;
    let parsed: PaymentUpdate = json::from_str(body).unwrap();

    assert_eq!(parsed.subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(parsed.transaction_id.as_deref(), Some("tx_99"));
    assert!(parsed.status.is_none());
  }

  #[tokio::test]
  async fn test_apply_updates_subscription() {
    let db = test_db::setup().await;
    seed(&db).await;

    let outcome = Payment::new(&db)
      .apply(update(Some("sub_1"), Some("tx_99"), Some("active")))
      .await
      .unwrap();

    let Outcome::Updated(sub) = outcome else { panic!("expected update") };
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.transaction_record.as_deref(), Some("tx_99"));
  }

  #[tokio::test]
  async fn test_apply_defaults() {
    let db = test_db::setup().await;
    seed(&db).await;

    let outcome =
      Payment::new(&db).apply(update(Some("sub_1"), None, None)).await.unwrap();

    let Outcome::Updated(sub) = outcome else { panic!("expected update") };
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(
      sub.transaction_record.as_deref(),
      Some(TRANSACTION_PLACEHOLDER)
    );
  }

  #[tokio::test]
  async fn test_apply_ignores_incomplete_callbacks() {
    let db = test_db::setup().await;
    seed(&db).await;
    let sv = Payment::new(&db);

    for u in [
      update(None, Some("tx_1"), None),
      update(Some(""), None, None),
      update(Some("sub_404"), None, None),
    ] {
      assert!(matches!(sv.apply(u).await.unwrap(), Outcome::Ignored));
    }

    let sub = Subscription::new(&db).by_id("sub_1").await.unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Inactive);
    assert!(sub.transaction_record.is_none());
  }

  #[tokio::test]
  async fn test_apply_gateway_success() {
    let db = test_db::setup().await;
    seed(&db).await;

    let outcome = Payment::new(&db)
      .apply(update(Some("sub_1"), Some("tx_42"), Some("success")))
      .await
      .unwrap();

    let Outcome::Updated(sub) = outcome else { panic!("expected update") };
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.transaction_record.as_deref(), Some("tx_42"));
  }

  #[tokio::test]
  async fn test_apply_gateway_failure_deactivates() {
    let db = test_db::setup().await;
    seed(&db).await;
    let sv = Payment::new(&db);

    sv.apply(update(Some("sub_1"), Some("tx_1"), None)).await.unwrap();
    let outcome = sv
      .apply(update(Some("sub_1"), Some("tx_2"), Some("failed")))
      .await
      .unwrap();

    let Outcome::Updated(sub) = outcome else { panic!("expected update") };
    assert_eq!(sub.status, SubscriptionStatus::Inactive);
    assert_eq!(sub.transaction_record.as_deref(), Some("tx_2"));
  }

  #[tokio::test]
  async fn test_apply_unmapped_status_keeps_status() {
    let db = test_db::setup().await;
    seed(&db).await;
    let sv = Payment::new(&db);

    for (tx, status) in [("tx_7", "pending"), ("tx_8", "refunded")] {
      let outcome =
        sv.apply(update(Some("sub_1"), Some(tx), Some(status))).await.unwrap();

      let Outcome::Updated(sub) = outcome else { panic!("expected update") };
      assert_eq!(sub.status, SubscriptionStatus::Inactive);
      assert_eq!(sub.transaction_record.as_deref(), Some(tx));
    }
  }

  #[test]
  fn test_callback_status() {
    use SubscriptionStatus::*;

    assert_eq!(callback_status("success"), Some(Active));
    assert_eq!(callback_status("failed"), Some(Inactive));
    assert_eq!(callback_status("expired"), Some(Expired));
    assert_eq!(callback_status("pending"), None);
  }
}
