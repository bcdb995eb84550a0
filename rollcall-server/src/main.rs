use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use clap::Parser;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_core::{
    PostgresDatabase, RosterEventBus, RosterService,
    auth::AuthCrypto,
    database::infrastructure::postgres::{
        PostgresDismissalLogRepository, PostgresRosterRepository,
        PostgresStudentRepository, PostgresUserRepository,
    },
    database::ports::{StudentRepository, UserRepository},
};
use rollcall_model::Role;
use rollcall_server::{
    auth::jwt::JwtKeys,
    infra::{app_state::AppState, config::Config, websocket::ConnectionManager},
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "rollcall-server")]
#[command(about = "Dismissal tracking server with live dashboard synchronization")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Postgres connection URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall_server=info,rollcall_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }

    let database_url = config
        .database
        .url
        .clone()
        .context("no database URL configured (set DATABASE_URL or database.url)")?;
    let jwt_secret = config
        .auth
        .jwt_secret
        .clone()
        .context("no JWT secret configured (set JWT_SECRET or auth.jwt_secret)")?;

    let postgres =
        PostgresDatabase::connect(&database_url, config.database.max_connections).await?;
    postgres.migrate().await?;
    info!("Database ready");

    let pool = postgres.pool().clone();
    let students: Arc<dyn StudentRepository> =
        Arc::new(PostgresStudentRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let roster_repo = Arc::new(PostgresRosterRepository::new(pool.clone()));
    let logs = Arc::new(PostgresDismissalLogRepository::new(pool));

    let event_bus = Arc::new(RosterEventBus::new(config.broadcast.channel_capacity));
    let roster = Arc::new(RosterService::new(
        students.clone(),
        roster_repo,
        logs,
        event_bus.clone(),
    ));

    let auth_crypto = Arc::new(AuthCrypto);
    ensure_bootstrap_admin(&config, users.as_ref(), &auth_crypto).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        postgres: Arc::new(postgres),
        roster,
        students,
        users,
        auth_crypto,
        jwt_keys: Arc::new(JwtKeys::new(&jwt_secret, config.auth.token_ttl_hours)),
        event_bus,
        websocket_manager: Arc::new(ConnectionManager::new()),
    };

    let cors = build_cors_layer(&config)?;
    let app = Router::new()
        .nest("/api", routes::create_api_router(state.clone()))
        .with_state(state.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server host/port")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    Ok(())
}

/// Seed the first admin account when the users table is empty.
async fn ensure_bootstrap_admin(
    config: &Config,
    users: &dyn UserRepository,
    crypto: &AuthCrypto,
) -> anyhow::Result<()> {
    if users.count().await? > 0 {
        return Ok(());
    }

    let (Some(username), Some(password)) = (
        config.auth.bootstrap_admin_username.as_deref(),
        config.auth.bootstrap_admin_password.as_deref(),
    ) else {
        warn!(
            "users table is empty and no bootstrap admin configured; \
             set ROLLCALL_ADMIN_USERNAME / ROLLCALL_ADMIN_PASSWORD"
        );
        return Ok(());
    };

    let hash = crypto.hash_password(password)?;
    users.create(username, &hash, Role::Admin).await?;
    info!(username, "Created bootstrap admin account");
    Ok(())
}

fn build_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!(
        sessions = state.websocket_manager.session_count(),
        "Shutting down, dropping dashboard sessions"
    );
    state.websocket_manager.shutdown();
}
