//! Shout - social feed backend
//! Authentication and session-state core: registration, login,
//! email-confirmation gating, the token verification gate, and logout
//! backed by a revocation denylist.

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shout_backend::{
    auth::{
        api, auth_middleware, revocation::RevocationStore, AuthCore, AuthState,
        JwtCodec, MemoryRevocationStore, UserStore,
    },
    models::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let users = Arc::new(UserStore::new(&config.database_path)?);
    let codec = Arc::new(JwtCodec::new(config.jwt_secret.clone()));
    let revocation: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let core = Arc::new(
        AuthCore::new(users.clone(), codec, revocation)
            .with_session_lifetime(chrono::Duration::days(config.token_lifetime_days)),
    );

    let state = AuthState { core, users };
    info!("Authentication initialized at: {}", config.database_path);

    // Routes behind the verification gate
    let protected = Router::new()
        .route("/api/auth/me", get(api::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/api/users", post(api::register))
        .route("/api/auth/login", post(api::login))
        .route("/api/auth/extend", post(api::extend))
        .route("/api/auth/logout", post(api::logout))
        .route("/api/auth/:key", get(api::confirm))
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Shout backend listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shout_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
