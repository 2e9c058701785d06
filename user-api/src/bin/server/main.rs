use std::sync::Arc;

use auth::Authenticator;
use auth::HttpKeySetFetcher;
use auth::PasswordHasher;
use auth::RemoteTokenVerifier;
use auth::SigningKeyCache;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_api::config::AuthMode;
use user_api::config::Config;
use user_api::config::DatabaseBackend;
use user_api::domain::auth::ports::AuthStrategy;
use user_api::domain::auth::service::AuthService;
use user_api::domain::user::ports::CredentialStore;
use user_api::domain::user::ports::UserDirectory;
use user_api::domain::user::service::UserService;
use user_api::inbound::http::handlers::auth_config::AuthSummary;
use user_api::inbound::http::router::create_router;
use user_api::inbound::http::router::AppState;
use user_api::outbound::auth::LocalAuthStrategy;
use user_api::outbound::auth::RemoteAuthStrategy;
use user_api::outbound::identity_provider::HttpIdentityProvider;
use user_api::outbound::identity_provider::RemoteUserDirectory;
use user_api::repositories::InMemoryCredentialStore;
use user_api::repositories::PostgresCredentialStore;

type Components = (Arc<dyn AuthStrategy>, Arc<dyn UserDirectory>, AuthSummary);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_api=debug,auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "user-api",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        run_mode = %config.run_mode,
        auth_mode = ?config.auth.mode,
        database_backend = ?config.database.backend,
        http_port = config.server.http_port,
        "Configuration loaded"
    );

    let (strategy, user_directory, auth_summary) = match config.auth.mode {
        AuthMode::Local => local_components(&config).await?,
        AuthMode::Remote => remote_components(&config)?,
    };

    let state = AppState {
        auth_service: AuthService::new(strategy),
        user_directory,
        auth_summary,
        expose_error_details: !config.is_production(),
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");
    Ok(())
}

async fn local_components(config: &Config) -> Result<Components, anyhow::Error> {
    let authenticator = Arc::new(Authenticator::new(config.jwt_secret()?.as_bytes()));

    match config.database.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory credential store; users are lost on restart");
            let store = Arc::new(InMemoryCredentialStore::new());
            Ok(local_with_store(store, authenticator, config))
        }
        DatabaseBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.database.acquire_timeout())
                .connect_lazy(config.database.url()?)?;
            tracing::info!(
                max_connections = 5,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            Ok(local_with_store(store, authenticator, config))
        }
    }
}

fn local_with_store<CS: CredentialStore>(
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    config: &Config,
) -> Components {
    let strategy = LocalAuthStrategy::new(
        Arc::clone(&store),
        authenticator,
        config.token_lifetime(),
    );
    let directory = UserService::new(store, PasswordHasher::new());

    (Arc::new(strategy), Arc::new(directory), AuthSummary::local())
}

fn remote_components(config: &Config) -> Result<Components, anyhow::Error> {
    let provider_config = &config.identity_provider;
    let user_pool_id = provider_config.user_pool_id()?;
    let client_id = provider_config.client_id()?;

    let provider = Arc::new(HttpIdentityProvider::new(
        provider_config.endpoint()?,
        user_pool_id,
        client_id,
        provider_config.timeout(),
    )?);

    let jwks_url = provider_config.jwks_url()?;
    let fetcher = Arc::new(HttpKeySetFetcher::new(
        jwks_url.as_str(),
        provider_config.timeout(),
    )?);
    let keys = SigningKeyCache::new(fetcher)
        .with_fetch_timeout(provider_config.timeout())
        .with_min_refresh_interval(provider_config.min_key_refresh_interval());
    let verifier = Arc::new(RemoteTokenVerifier::new(
        keys,
        provider_config.issuer()?,
        client_id,
    ));

    tracing::info!(
        region = %provider_config.region,
        user_pool_id = %user_pool_id,
        jwks_url = %jwks_url,
        "Remote authentication configured"
    );

    let strategy = RemoteAuthStrategy::new(Arc::clone(&provider), verifier);
    let directory = RemoteUserDirectory::new(provider);

    Ok((
        Arc::new(strategy),
        Arc::new(directory),
        AuthSummary::remote(&provider_config.region, user_pool_id, client_id),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
