use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::prelude::*;

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

/// Prefixed random identifier, e.g. `pc_3f2b...`.
pub fn new_id(prefix: &str) -> String {
  format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Cents rendered as a decimal amount.
pub fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let cents = cents.abs();
  format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

/// Compares a presented secret against the configured one in constant time.
///
/// Both sides go through HMAC keyed by `expected`, so lengths never leak
/// either and the tag check is `verify_slice`'s.
pub fn secret_matches(expected: &str, given: &str) -> bool {
  let mac = || Hmac::<Sha256>::new_from_slice(expected.as_bytes()).ok();

  let (Some(mut want), Some(mut got)) = (mac(), mac()) else {
    return false;
  };
  want.update(expected.as_bytes());
  got.update(given.as_bytes());
  got.verify_slice(&want.finalize().into_bytes()).is_ok()
}

/// Serde adapter exposing cents as a decimal amount (`1980` <-> `19.8`).
pub mod cents {
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    cents: &i64,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(*cents as f64 / 100.0)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<i64, D::Error> {
    let amount = f64::deserialize(deserializer)?;
    Ok((amount * 100.0).round() as i64)
  }
}
