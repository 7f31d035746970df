//! Wires the tool registry, LLM provider, ReAct engine, session manager,
//! persistence gateway, and HTTP/SSE surface into one running server.

use clap::Parser;
use reagent_engine::{EngineConfig, FileSessionRepository, SessionManager, SessionRepository};
use reagent_gateway::AppState;
use reagent_llm::{AnthropicProvider, RateLimiter};
use reagent_tools::{create_default_registry, ToolBackends};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reagent-server", about = "Agentic problem-solving server")]
struct Cli {
    #[arg(short, long, default_value = "8080")]
    port: u16,
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,
    #[arg(short, long)]
    workspace: Option<PathBuf>,
    /// Directory for the file-backed Persistence Gateway when
    /// `MONGODB_ENABLED` is unset or false.
    #[arg(long, default_value = "./sessions")]
    sessions_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));
    let registry = tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer());

    // Keep the non-blocking writer's flush guard alive for the process
    // lifetime when a log file is configured.
    let _log_guard = match &config.log_file {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().map(|n| n.to_owned()).unwrap_or_else(|| "reagent.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry.with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false)).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY not set"))?;
    let provider = Arc::new(AnthropicProvider::new(api_key));
    let limiter = Arc::new(RateLimiter::new());

    let workspace_root = cli
        .workspace
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let prompt_builder: Arc<dyn Fn(&str) -> String + Send + Sync> =
        Arc::new(reagent_engine::prompts::final_answer_prompt);
    let tools = Arc::new(create_default_registry(
        &workspace_root,
        ToolBackends::unavailable(),
        2025,
        config.code_execution_timeout.as_secs(),
        prompt_builder,
    )?);

    let repository: Arc<dyn SessionRepository> = if config.mongodb_enabled {
        tracing::warn!(
            "MONGODB_ENABLED is set but this build carries an in-process document-store \
             stand-in, not a real MongoDB client (see DESIGN.md); falling back to it anyway"
        );
        Arc::new(reagent_engine::DocumentSessionRepository::new())
    } else {
        Arc::new(FileSessionRepository::new(&cli.sessions_dir)?)
    };

    let state = AppState {
        provider,
        limiter,
        tools,
        config,
        manager: Arc::new(SessionManager::new()),
        repository,
    };

    let app = reagent_gateway::router(state);
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;

    tracing::info!(%addr, workspace = %workspace_root.display(), "reagent-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
