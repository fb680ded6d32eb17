pub mod auth;
pub mod booking;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod identity;
pub mod models;
pub mod openapi;
pub mod policy;
pub mod scheduling;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use handlers::{
    change_password, create_booking, create_class, current_user, delete_booking, delete_class,
    export_bookings, get_all_bookings, get_all_classes, get_all_trainers, get_class_bookings,
    get_single_class, get_user_bookings, healthz_live, healthz_ready, login, logout,
    refresh_token, register, root, update_class, update_role, update_user,
};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenService;
use crate::booking::BookingService;
use crate::ical::BookingExporter;
use crate::identity::IdentityService;
use crate::openapi::ApiDoc;
use crate::policy::CapacityPolicy;
use crate::scheduling::ScheduleService;
use crate::settings::Settings;
use crate::store::{EntityStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub tokens: Arc<TokenService>,
    pub identity: Arc<IdentityService>,
    pub scheduling: Arc<ScheduleService>,
    pub booking: Arc<BookingService>,
    pub exporter: Arc<BookingExporter>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let policy = CapacityPolicy::new(settings.class_capacity, settings.daily_class_limit);
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new(policy));
        let tokens = Arc::new(TokenService::new(&settings));

        Self {
            identity: Arc::new(IdentityService::new(store.clone(), tokens.clone())),
            scheduling: Arc::new(ScheduleService::new(
                store.clone(),
                settings.daily_class_limit,
            )),
            booking: Arc::new(BookingService::new(store)),
            exporter: Arc::new(BookingExporter::new()),
            tokens,
            settings,
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(settings);

    if let (Some(email), Some(password)) = (
        state.settings.admin_email.clone(),
        state.settings.admin_password.clone(),
    ) {
        if let Err(err) = state.identity.bootstrap_admin(&email, &password).await {
            warn!("bootstrap admin failed: {err}");
        }
    }

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Gym Class Scheduling API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/refresh-token", post(refresh_token))
        .route("/users/change-password", post(change_password))
        .route("/users/current-user", get(current_user))
        .route("/users/update-user", patch(update_user))
        .route("/users/update-role", patch(update_role))
        .route("/users/get-all-trainers", get(get_all_trainers))
        .route("/booking/create-booking", post(create_booking))
        .route("/booking/get-user-bookings", get(get_user_bookings))
        .route("/booking/get-class-bookings/{class_id}", get(get_class_bookings))
        .route("/booking/get-all-bookings", get(get_all_bookings))
        .route("/booking/export-bookings", get(export_bookings))
        .route("/booking/delete-booking/{booking_id}", delete(delete_booking))
        .route("/class/create-class", post(create_class))
        .route("/class/get-all-classes", get(get_all_classes))
        .route("/class/get-single-class/{id}", get(get_single_class))
        .route("/class/update-class/{id}", put(update_class))
        .route("/class/delete-class/{id}", delete(delete_class))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
