mod app;
mod auth;
mod db;
mod errors;
mod models;
mod routes;
mod utils;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::google_login,
        routes::auth::current_session,
        routes::auth::logout,
        routes::setting::list_settings,
        routes::setting::create_setting,
        routes::setting::update_setting,
        routes::setting::delete_setting,
        routes::posts::list_posts,
        routes::posts::create_post,
        routes::posts::approve_post,
        routes::health::health
    ),
    components(
        schemas(
            auth::Role,
            auth::Principal,
            models::user::GoogleLoginRequest,
            models::user::SessionResponse,
            models::setting::Setting,
            models::setting::SettingUpsertRequest,
            models::setting::SettingsResponse,
            models::post::Post,
            models::post::PostCreateRequest,
            models::post::PostsResponse,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and session endpoints"),
        (name = "Settings", description = "Admin settings store"),
        (name = "Posts", description = "Post submission and approval"),
        (name = "Health", description = "Liveness probe")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let pool = db::init().await?;
    let app = app::create_app(pool).await?;

    let app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
