use cocar_api::{build_router, state::AppState};
use cocar_config::Settings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "cocar_api=debug,cocar_services=debug,cocar_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!(
        backend = ?settings.database.backend,
        "Starting CoCar API on {}:{}", settings.app.host, settings.app.port
    );

    let app_state = AppState::new(settings.clone()).await?;

    if settings.reminders.enabled {
        info!(interval_secs = settings.reminders.interval_secs, "Trip reminders enabled");
        app_state.reminders.clone().spawn();
    }

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
