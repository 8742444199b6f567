use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::services::{NotificationService, PendingWriteQueue, ReservationCoordinator};
use persistence::repositories::PgReservationStore;
use shared::jwt::JwtVerifier;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, ConfigValidationError};
use crate::extractors::AccountCache;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{
    admin_dashboard, admin_items, admin_settings, donations, health, letters, public_wishlist,
    reservations,
};
use crate::services::{EmailService, LetterClient};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub jwt: Arc<JwtVerifier>,
    pub reservations: ReservationCoordinator,
    pub notifier: Arc<dyn NotificationService>,
    pub letters: LetterClient,
    pub pending_writes: Arc<PendingWriteQueue>,
    pub accounts: Arc<AccountCache>,
}

impl AppState {
    /// Wires the services described by `config`. E-mail is the notifier.
    pub fn new(
        config: Config,
        pool: PgPool,
        pending_writes: Arc<PendingWriteQueue>,
    ) -> Result<Self, ConfigValidationError> {
        let jwt = config
            .auth
            .verifier()
            .map_err(|e| ConfigValidationError::InvalidValue(format!("auth: {}", e)))?;

        // A limit of 0 disables rate limiting.
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        let notifier: Arc<dyn NotificationService> =
            Arc::new(EmailService::new(config.email.clone()).with_pool(pool.clone()));
        let letters = LetterClient::new(config.letters.clone());

        Ok(Self {
            reservations: ReservationCoordinator::new(
                Arc::new(PgReservationStore::new(pool.clone())),
                notifier.clone(),
            ),
            pool,
            config: Arc::new(config),
            rate_limiter,
            jwt: Arc::new(jwt),
            notifier,
            letters,
            pending_writes,
            accounts: Arc::new(AccountCache::new()),
        })
    }

    /// Replaces the notifier used for reservations and donations.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationService>) -> Self {
        self.reservations = ReservationCoordinator::new(
            Arc::new(PgReservationStore::new(self.pool.clone())),
            notifier.clone(),
        );
        self.notifier = notifier;
        self
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Guests open share links from anywhere.
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Guest submissions, limited per client IP.
    let submission_routes = Router::new()
        .route("/api/v1/reservations", post(reservations::create_reservation))
        .route(
            "/api/v1/wishlists/:share_id/reservations",
            post(reservations::create_reservation_for_share),
        )
        .route("/api/v1/donations", post(donations::create_donation))
        .route(
            "/api/v1/wishlists/:share_id/donations",
            post(donations::create_donation_for_share),
        )
        .route("/api/v1/letters", post(letters::generate_letter))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route(
            "/api/v1/wishlists/:share_id",
            get(public_wishlist::get_public_wishlist),
        )
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Celebrant routes authenticate through the CelebrantAuth extractor.
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/settings",
            get(admin_settings::get_settings).put(admin_settings::update_settings),
        )
        .route(
            "/api/v1/admin/settings/share-id",
            post(admin_settings::regenerate_share_id),
        )
        .route(
            "/api/v1/admin/items",
            get(admin_items::list_items).post(admin_items::create_item),
        )
        .route(
            "/api/v1/admin/items/:item_id",
            patch(admin_items::update_item).delete(admin_items::delete_item),
        )
        .route(
            "/api/v1/admin/reservations",
            get(admin_dashboard::list_reservations),
        )
        .route("/api/v1/admin/donations", get(admin_dashboard::list_donations))
        .route("/api/v1/admin/dashboard", get(admin_dashboard::dashboard))
        .route("/api/v1/admin/export", get(admin_dashboard::export));

    Router::new()
        .merge(submission_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
