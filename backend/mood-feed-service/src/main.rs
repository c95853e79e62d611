use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use mood_feed_service::db::{PgCommentStore, PgPostStore, PgUserStore};
use mood_feed_service::handlers::{
    self, FeedHandlerState, PostHandlerState, UserHandlerState,
};
use mood_feed_service::middleware::{JwtAuthMiddleware, JwtValidator};
use mood_feed_service::services::{MoodFeedService, PostService};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: PgPool,
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "mood-feed-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "mood-feed-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Mood Feed Service
///
/// # Routes
///
/// - `/api/v1/feed` - Mood-ranked feed for the caller
/// - `/api/v1/posts/*` - Create, read, delete, like and unlike posts
/// - `/api/v1/users/me/mood` - Update the caller's mood
/// - `/api/v1/health`, `/api/v1/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = mood_feed_service::Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!("Starting mood-feed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Connected to database, migrations applied");

    let user_store = Arc::new(PgUserStore::new(db_pool.clone()));
    let post_store = Arc::new(PgPostStore::new(db_pool.clone()));
    let comment_store = Arc::new(PgCommentStore::new(db_pool.clone()));

    let feed = Arc::new(MoodFeedService::new(
        user_store.clone(),
        post_store.clone(),
        post_store.clone(),
        comment_store.clone(),
        config.feed.settings(),
    ));
    let posts = Arc::new(PostService::new(
        post_store,
        user_store.clone(),
        user_store.clone(),
        comment_store,
    ));

    let feed_state = web::Data::new(FeedHandlerState {
        feed,
        request_timeout: config.feed.request_timeout(),
    });
    let post_state = web::Data::new(PostHandlerState { posts });
    let user_state = web::Data::new(UserHandlerState { users: user_store });
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
    });
    let validator = Arc::new(JwtValidator::from_secret(&config.auth.jwt_secret));

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(feed_state.clone())
            .app_data(post_state.clone())
            .app_data(user_state.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(mood_feed_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(handlers::configure(JwtAuthMiddleware::new(validator.clone())))
    })
    .bind(&http_bind_address)
    .with_context(|| format!("Failed to bind {}", http_bind_address))?
    .run();

    let server_handle = server.handle();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tokio::select! {
        result = server => {
            result.context("HTTP server failed")?;
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    db_pool.close().await;
    tracing::info!("mood-feed-service stopped");
    Ok(())
}
