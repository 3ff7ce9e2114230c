//! JSON API over the ledger services.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::services::WorkshopServices;
use crate::Error;

use handlers as h;

pub fn router(services: Arc<WorkshopServices>) -> Router {
    Router::new()
        .route("/api/register", post(h::register))
        .route("/api/login", post(h::login))
        .route("/api/login/admin", post(h::login_admin))
        .route("/api/login/guest", post(h::login_guest))
        .route("/api/accounts", get(h::list_accounts))
        .route("/api/accounts/{id}", get(h::get_account).delete(h::delete_account))
        .route("/api/accounts/{id}/approve", post(h::approve_account))
        .route("/api/accounts/{id}/points", post(h::grant_points))
        .route("/api/accounts/{id}/rank", get(h::account_rank))
        .route("/api/accounts/{id}/encouragement", get(h::encouragement))
        .route("/api/accounts/{id}/daily-mission", get(h::daily_mission))
        .route("/api/accounts/{id}/completed-today", get(h::completed_today))
        .route("/api/accounts/{id}/wish-cooldown", get(h::wish_cooldown))
        .route("/api/products", get(h::list_products).post(h::add_product))
        .route("/api/products/{id}", axum::routing::put(h::update_product).delete(h::delete_product))
        .route("/api/products/{id}/stock", post(h::set_stock))
        .route("/api/categories", get(h::list_categories).post(h::add_category))
        .route("/api/categories/{id}", axum::routing::delete(h::delete_category))
        .route("/api/redemptions", get(h::list_redemptions).post(h::create_redemption))
        .route("/api/redemptions/code/{code}", get(h::lookup_redemption))
        .route("/api/redemptions/{id}/confirm", post(h::confirm_redemption))
        .route("/api/redemptions/{id}/cancel", post(h::cancel_redemption))
        .route("/api/missions", get(h::list_missions).post(h::create_mission))
        .route("/api/missions/{id}", axum::routing::put(h::update_mission).delete(h::delete_mission))
        .route("/api/missions/{id}/toggle", post(h::toggle_mission))
        .route("/api/missions/{id}/submit", post(h::submit_mission))
        .route("/api/submissions", get(h::list_submissions))
        .route("/api/submissions/{id}/approve", post(h::approve_submission))
        .route("/api/submissions/{id}/reject", post(h::reject_submission))
        .route("/api/wishes", get(h::list_wishes).post(h::post_wish))
        .route("/api/wishes/reset-cooldown", post(h::reset_cooldown))
        .route("/api/wishes/{id}", axum::routing::delete(h::delete_wish))
        .route("/api/wishes/{id}/like", post(h::like_wish))
        .route("/api/banners", get(h::list_banners).post(h::add_banner))
        .route("/api/banners/{id}", axum::routing::delete(h::delete_banner))
        .route("/api/banners/{id}/active", post(h::set_banner_active))
        .route("/api/point-reasons", get(h::list_point_reasons).post(h::add_point_reason))
        .route("/api/point-reasons/{id}", axum::routing::delete(h::delete_point_reason))
        .route("/api/subscribe/{collection}", get(h::subscribe))
        .with_state(services)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves the API until `shutdown` resolves. Open subscription streams are
/// closed at that point so the graceful drain can finish.
pub async fn serve<F>(services: Arc<WorkshopServices>, addr: SocketAddr, shutdown: F) -> Result<(), Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("Workshop API listening on http://{}", listener.local_addr()?);
    let store = services.store().clone();
    let drain = async move {
        shutdown.await;
        info!("Shutting down; closing live subscriptions");
        store.close_subscriptions();
    };
    axum::serve(listener, router(services))
        .with_graceful_shutdown(drain)
        .await?;
    Ok(())
}
