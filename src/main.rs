use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_service::{
    catalog::Catalog,
    config::{Backend, Config, FallbackSource},
    fallback::FallbackDataset,
    routes::{self, AppState},
    service::{DataService, Offline, PgService, RestClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catalog_service=info,axum=info".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let service = connect(&config).await?;
    let fallback = match config.fallback {
        FallbackSource::Builtin => FallbackDataset::builtin()?,
        FallbackSource::None => FallbackDataset::empty(),
    };

    let catalog = Catalog::new(service, Arc::new(fallback));
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(AppState::new(catalog, config.admin_token.clone())))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<Arc<dyn DataService>> {
    let service: Arc<dyn DataService> = match &config.backend {
        Backend::Rest { url, api_key } => {
            tracing::info!(%url, "using hosted REST data service");
            Arc::new(RestClient::new(url, api_key.clone(), config.timeout)?)
        }
        Backend::Postgres { database_url } => {
            let pg = PgService::connect(database_url).await?;
            pg.migrate().await?;
            tracing::info!("using direct postgres data service");
            Arc::new(pg)
        }
        Backend::Offline => {
            tracing::warn!("no data service configured, serving fallback dataset only");
            Arc::new(Offline)
        }
    };
    Ok(service)
}
