use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use gourmet_backend::{bootstrap, config, db, routes, state::AppState, swagger};
use tower_http::trace::TraceLayer;

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    let routes = routes::health::routes_with_openapi()
        .merge(routes::users::routes_with_openapi())
        .merge(routes::restaurants::routes_with_openapi())
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::payments::routes_with_openapi())
        .merge(routes::deliveries::routes_with_openapi());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Gourmet Express Backend API")
        .version("0.1.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database_url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database_url).await?;
    db::ping(&db_pool).await?;
    tracing::info!("Database connectivity verified");

    let cors = bootstrap::cors_layer(&config)?;
    let state = AppState::new(db_pool, config.clone());

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    bootstrap::serve(app, config.port).await
}
