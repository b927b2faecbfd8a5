use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] DbErr),
  #[error("agent not found")]
  AgentNotFound,
  #[error("promo code not found")]
  PromoNotFound,
  #[error("promo code `{0}` already exists")]
  PromoExists(String),
  #[error("subscription not found")]
  SubscriptionNotFound,
  #[error("snapshot not found")]
  SnapshotNotFound,
  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
  #[error("unauthorized")]
  Unauthorized,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::AgentNotFound
      | Error::PromoNotFound
      | Error::SubscriptionNotFound
      | Error::SnapshotNotFound => StatusCode::NOT_FOUND,
      Error::PromoExists(_) => StatusCode::CONFLICT,
      Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("request failed: {self}");
    }

    let msg = if status.is_server_error() {
      "internal error".to_string()
    } else {
      self.to_string()
    };

    (status, Json(json::json!({ "ok": false, "error": msg }))).into_response()
  }
}
