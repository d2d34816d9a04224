//! The Bookshelf API server.

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookshelf::auth::TokenKeys;
use bookshelf::config::Config;
use bookshelf::db::Db;
use bookshelf::graphql::{build_schema, ApiSchema, AuthHeader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = Db::connect(&config).await?;
    let schema = build_schema(db, TokenKeys::from_secret(&config.jwt_secret));

    let app = Router::new()
        .route("/graphql", get(playground).post(execute))
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!(address = %config.bind_address, "starting server");
    axum::Server::bind(&config.bind_address)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn execute(
    Extension(schema): Extension<ApiSchema>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> Json<async_graphql::Response> {
    let auth_header = AuthHeader(
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    );

    Json(schema.execute(request.data(auth_header)).await)
}

async fn playground() -> Html<String> {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}
