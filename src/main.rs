use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ai_image_analyzer::config::Config;
use ai_image_analyzer::gemini::GeminiClient;
use ai_image_analyzer::routes;
use ai_image_analyzer::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ai_image_analyzer=info")),
        )
        .init();

    let config = Config::from_env()?;

    let backend = GeminiClient::new(
        config.api_key.clone(),
        config.model_override.clone(),
        config.request_timeout,
    )
    .context("failed to build Gemini client")?;

    let session = Arc::new(Session::new(Arc::new(backend)));
    let app = routes::router(session);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
