// Route exports
pub mod auth;
pub mod dating;
pub mod extract;
pub mod users;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::config::LimitSettings;
use crate::core::{Clock, DailyLimit, FeedSelector, Subscriptions, SwipeEngine};
use crate::models::HealthResponse;
use crate::services::{DatingStore, StoreError, TokenService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DatingStore>,
    pub tokens: TokenService,
    pub swipes: SwipeEngine,
    pub feed: FeedSelector,
    pub limits: DailyLimit,
    pub subscriptions: Subscriptions,
}

impl AppState {
    /// Wire every service to the same backing store and clock
    pub fn new<S: DatingStore + 'static>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        tokens: TokenService,
        limits: &LimitSettings,
    ) -> Self {
        let subscriptions = Subscriptions::new(store.clone(), clock.clone(), limits.subscription_months);
        let daily_limit = DailyLimit::new(subscriptions.clone(), store.clone(), clock.clone(), limits.daily_view_limit);

        Self {
            swipes: SwipeEngine::new(store.clone(), store.clone(), clock.clone()),
            feed: FeedSelector::new(store.clone(), daily_limit.clone(), clock),
            limits: daily_limit,
            subscriptions,
            tokens,
            store,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(auth::configure)
            .configure(users::configure)
            .configure(dating::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = health_status(state.store.health_check().await);

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn health_status(check: Result<bool, StoreError>) -> &'static str {
    match check {
        Ok(true) => "healthy",
        Ok(false) => "degraded",
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            "degraded"
        }
    }
}
