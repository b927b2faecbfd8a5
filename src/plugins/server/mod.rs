mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

/// Public HTTP API: payment webhook and admin routes.
pub struct Http;

#[async_trait]
impl super::Plugin for Http {
  fn name(&self) -> &'static str {
    "http"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let port = app.config.port;
    let router = router(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP Server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, router).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}

/// All routes without rate limiting.
pub fn router(app: Arc<AppState>) -> Router {
  let admin = Router::new()
    .route(
      "/agents",
      get(handlers::list_agents).post(handlers::create_agent),
    )
    .route(
      "/agents/{id}",
      put(handlers::update_agent).delete(handlers::delete_agent),
    )
    .route(
      "/promocodes",
      get(handlers::list_promos).post(handlers::create_promo),
    )
    .route(
      "/promocodes/{id}",
      get(handlers::get_promo)
        .put(handlers::update_promo)
        .delete(handlers::delete_promo),
    )
    .route("/promocodes/{id}/status", put(handlers::set_promo_status))
    .route(
      "/subscriptions",
      get(handlers::list_subscriptions).post(handlers::onboard_subscription),
    )
    .route(
      "/subscriptions/{id}",
      get(handlers::get_subscription)
        .put(handlers::update_subscription)
        .delete(handlers::delete_subscription),
    )
    .route("/commissions", get(handlers::list_commissions))
    .route("/commissions/paid", post(handlers::mark_paid))
    .route("/totals/{year}/{month}", get(handlers::month_totals))
    .route(
      "/payouts/{month}",
      get(handlers::get_snapshot).post(handlers::recompute_snapshot),
    );

  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/webhooks/payment", post(handlers::payment_webhook))
    .nest("/api/admin", admin)
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
          .allow_origin(Any)
          .allow_methods(Any)
          .allow_headers(Any),
      ),
    )
    .with_state(app)
}
