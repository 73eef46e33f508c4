//! HTTP API gateway for LeadsBox.
//!
//! Mounts the REST surface under `/api/*` prefixes, applies CORS for
//! the configured frontend origin, trace logging, and the session
//! cookie machinery. All dependencies (stores, integration clients,
//! authenticators) are injected at construction — no ambient
//! singletons.
//!
//! Built on Axum.

pub mod auth_api;
pub mod leads;
pub mod response;
pub mod session;
pub mod webhooks;
pub mod whatsapp_api;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use leadsbox_channels::{FacebookAuthenticator, GraphClient, TelegramClient, WhatsappService};
use leadsbox_config::AppConfig;
use leadsbox_core::auth::Authenticator;
use leadsbox_core::store::{ConnectionStore, LeadStore};

use session::SessionSigner;

/// Shared application state, injected into every handler.
pub struct AppState {
    pub config: AppConfig,
    pub leads: Arc<dyn LeadStore>,
    pub whatsapp: WhatsappService,
    pub telegram: TelegramClient,
    pub facebook: Arc<dyn Authenticator>,
    pub facebook_login_url: String,
    pub sessions: SessionSigner,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the state from config and store handles. The Graph client,
    /// WhatsApp service, and Facebook strategy are built here so the
    /// CLI stays thin.
    pub fn new(
        config: AppConfig,
        leads: Arc<dyn LeadStore>,
        connections: Arc<dyn ConnectionStore>,
    ) -> Self {
        let graph = GraphClient::with_base_url(&config.graph_api_base);
        let whatsapp = WhatsappService::new(graph, connections);
        let telegram = TelegramClient::new(config.telegram.bot_token.clone());

        let facebook = FacebookAuthenticator::with_base_url(
            config.facebook.app_id.clone(),
            config.facebook.app_secret.clone(),
            config.facebook.redirect_uri.clone(),
            &config.graph_api_base,
        );
        let facebook_login_url = facebook.login_url();

        let sessions = SessionSigner::new(config.session_secret.clone(), config.is_production());

        Self {
            config,
            leads,
            whatsapp,
            telegram,
            facebook: Arc::new(facebook),
            facebook_login_url,
            sessions,
        }
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let origin = state
        .config
        .client_url
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3010"));

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::exact(origin))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true);

    Router::new()
        .route("/", get(root_handler))
        // axum 0.8's nest matches the prefix without a trailing slash
        // (`/api/leads`) but not `/api/leads/`; register the collection
        // root's trailing-slash form explicitly so `GET /` (list leads)
        // is reachable either way.
        .route("/api/leads/", get(leads::list_leads))
        .nest("/api/leads", leads::router())
        .nest("/api/whatsapp", whatsapp_api::router())
        .nest("/api/auth", auth_api::router())
        .nest("/api/provider", webhooks::provider_router())
        .nest("/api/telegram", webhooks::telegram_router())
        .nest("/api/instagram", webhooks::instagram_router())
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "API is running..."
}

/// Bind and serve until shutdown.
pub async fn start(state: SharedState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
