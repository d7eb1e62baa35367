pub mod handlers;
pub(crate) mod request_logging;
pub(crate) mod storage_traits;
pub(crate) mod util;

use std::sync::Arc;

use axum::Router;

use crate::checkout::{CheckoutGateway, StripeCheckout};
use crate::config::Settings;
use crate::content::{ContentStore, demo_catalog};
use crate::error::Result as AppResult;
use crate::lifecycle::LifecycleManager;
use crate::logging::Database;
use crate::server::storage_traits::RequestLogStore;
use crate::subscription::SubscriptionStore;
use crate::users::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub log_store: Arc<dyn RequestLogStore>,
    pub user_store: Arc<dyn UserStore>,
    pub subscription_store: Arc<dyn SubscriptionStore>,
    pub content_store: Arc<dyn ContentStore>,
    pub lifecycle: LifecycleManager,
    /// Present only when a payment processor is configured; absent
    /// means demo mode.
    pub checkout: Option<Arc<dyn CheckoutGateway>>,
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    let db = Arc::new(Database::new(&config.logging.database_path).await?);
    db.seed_content(&demo_catalog()).await?;

    let checkout: Option<Arc<dyn CheckoutGateway>> = config
        .checkout
        .clone()
        .map(|c| Arc::new(StripeCheckout::new(c)) as Arc<dyn CheckoutGateway>);
    if checkout.is_some() {
        tracing::info!("Hosted checkout configured; purchases redirect to the processor");
    } else {
        tracing::info!("No checkout processor configured; running in demo mode");
    }

    let app_state = AppState {
        config,
        log_store: db.clone(),
        user_store: db.clone(),
        subscription_store: db.clone(),
        content_store: db.clone(),
        lifecycle: LifecycleManager::new(db),
        checkout,
    };

    let mut app = handlers::routes().with_state(Arc::new(app_state));

    // CORS（开发环境便于前端联调；生产应收敛来源并仅 HTTPS）
    use axum::http::{Method, header};
    use tower_http::cors::{AllowOrigin, CorsLayer};
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true);
    app = app.layer(cors);

    Ok(app)
}
