mod configuration;
mod error;
mod routes;
mod state;

use axum::http::HeaderValue;
use dotenv::dotenv;
use pumpmon::agent::{render_system_prompt, Agent};
use pumpmon::providers::base::Provider;
use pumpmon::providers::openai::OpenAiProvider;
use pumpmon::store::DataStore;
use pumpmon::suggestions::SuggestionGenerator;
use pumpmon::tools::ToolRegistry;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers mirror the preflight request
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;
    let agent_config = settings.chat.agent_config();

    let store = Arc::new(DataStore::sample());
    let registry = Arc::new(ToolRegistry::new(Arc::clone(&store))?);
    let system_prompt = render_system_prompt(
        registry.tools(),
        settings.chat.system_prompt_path.as_deref(),
    )?;

    let provider_config = settings.provider.into_config();
    info!(model = %provider_config.model, host = %provider_config.host, "using chat provider");
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(provider_config)?);

    let state = state::AppState {
        agent: Agent::new(Arc::clone(&provider), registry, system_prompt, agent_config),
        suggestions: Arc::new(SuggestionGenerator::new(provider, Arc::clone(&store))),
        store,
    };

    let app = routes::configure(state).layer(cors_layer(&settings.cors.origins()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
