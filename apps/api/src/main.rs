mod auth;
mod config;
mod db;
mod errors;
mod models;
mod plan;
mod routes;
mod skills;
mod state;
mod upload;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::hosted::HostedAuthenticator;
use crate::auth::oauth::{OAuthAuthenticator, OAuthEndpoints};
use crate::auth::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::auth::users::PgUserStore;
use crate::auth::Authenticator;
use crate::config::{AuthProvider, Config};
use crate::db::create_pool;
use crate::plan::{MemoryQuota, QuotaGate, RedisQuota};
use crate::routes::build_router;
use crate::skills::{SkillEngine, SkillTaxonomy};
use crate::state::AppState;
use crate::upload::PdfTextExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skills API v{}", env!("CARGO_PKG_VERSION"));

    // Skill taxonomy: built-in unless SKILL_TAXONOMY_PATH points at an override
    let taxonomy = SkillTaxonomy::load(config.skill_taxonomy_path.as_deref())
        .context("Failed to load skill taxonomy")?;
    info!(
        "Skill taxonomy loaded: {} terms in {} categories",
        taxonomy.term_count(),
        taxonomy.categories().len()
    );
    let engine = Arc::new(SkillEngine::new(taxonomy));

    // Redis backs sessions and quota when configured; otherwise everything stays in memory
    let redis = match config.redis_url.as_deref() {
        Some(url) => {
            let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
            info!("Redis client initialized");
            Some(client)
        }
        None => {
            info!("REDIS_URL not set, using in-memory sessions and quota");
            None
        }
    };

    let quota: Arc<dyn QuotaGate> = match &redis {
        Some(client) => Arc::new(RedisQuota::new(client.clone(), config.plan_upload_limit)),
        None => Arc::new(MemoryQuota::new(config.plan_upload_limit)),
    };

    let (authenticator, oauth) = build_authenticator(&config, redis).await?;
    info!("Auth provider: {:?}", config.auth_provider);

    let state = AppState {
        config: config.clone(),
        engine,
        authenticator,
        oauth,
        quota,
        text_extractor: Arc::new(PdfTextExtractor),
    };

    let cors = match config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION]),
        Err(_) => CorsLayer::permissive(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the authenticator selected by AUTH_PROVIDER.
/// OAuth mode also returns the concrete backend for the sign-in routes.
async fn build_authenticator(
    config: &Config,
    redis: Option<redis::Client>,
) -> Result<(Arc<dyn Authenticator>, Option<Arc<OAuthAuthenticator>>)> {
    match config.auth_provider {
        AuthProvider::Hosted => {
            let hosted = config
                .hosted
                .clone()
                .context("Hosted auth selected but not configured")?;
            let authenticator: Arc<dyn Authenticator> = Arc::new(HostedAuthenticator::new(hosted)?);
            Ok((authenticator, None))
        }
        AuthProvider::OAuth => {
            let google = config
                .google
                .clone()
                .context("OAuth selected but Google credentials are missing")?;
            let ttl = Duration::from_secs(config.session_ttl_secs);

            let sessions: Arc<dyn SessionStore> = match redis {
                Some(client) => Arc::new(RedisSessionStore::new(client, ttl)),
                None => Arc::new(MemorySessionStore::new(ttl)),
            };
            let pool = create_pool(&google.database_url).await?;
            let users = Arc::new(PgUserStore::new(pool));

            let oauth = Arc::new(OAuthAuthenticator::new(
                google,
                OAuthEndpoints::default(),
                sessions,
                users,
                ttl,
            )?);
            let authenticator: Arc<dyn Authenticator> = oauth.clone();
            Ok((authenticator, Some(oauth)))
        }
    }
}
