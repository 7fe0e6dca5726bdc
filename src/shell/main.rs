use tracing_subscriber::{EnvFilter, fmt};

use tempo::config::Config;
use tempo::shell::http::router;
use tempo::shell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;
    let app = router(AppState::in_memory());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Tempo API listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
