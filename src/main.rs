mod cli;

use anyhow::Context;
use cli::{output::Output, Cli, Commands};
use deepdive::{
    api,
    research::{ChannelStream, DataStream, ResearchCoordinator, ResearchState, StreamMessage},
    AppState, DeepDiveConfig,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deepdive={},tower_http=info", level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match DeepDiveConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            std::process::exit(1);
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    init_tracing(level, cli.json_logs);

    match cli.command {
        None => serve(config, None, None, &output).await,
        Some(Commands::Serve { host, port }) => serve(config, host, port, &output).await,
        Some(Commands::Run {
            topic,
            max_iterations,
        }) => run_once(config, topic, max_iterations, &output).await,
        Some(Commands::Config { validate }) => {
            show_config(&cli.config, &config, validate, &output);
            Ok(())
        }
    }
}

async fn serve(
    config: DeepDiveConfig,
    host: Option<String>,
    port: Option<u16>,
    output: &Output,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    output.banner();
    let app = api::build_app(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("deepdive listening on http://{}", addr);
    output.info(&format!("Listening on http://{}", addr));
    output.hint("POST /api/research with {\"topic\": \"...\"} to start a research");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_once(
    mut config: DeepDiveConfig,
    topic: String,
    max_iterations: Option<usize>,
    output: &Output,
) -> anyhow::Result<()> {
    if let Some(max_iterations) = max_iterations {
        config.research.max_iterations = max_iterations;
    }

    let state = AppState::from_config(config);
    let coordinator =
        ResearchCoordinator::new(state.steps.clone(), state.config.research.max_iterations);
    let mut research = ResearchState::new(topic.trim());

    let (channel, mut rx) = ChannelStream::new();
    let stream: Arc<dyn DataStream> = Arc::new(channel);

    output.header(&format!("Researching: {}", research.topic()));
    let handle = tokio::spawn(async move {
        let result = coordinator.run_streaming(&mut research, stream).await;
        (result, research)
    });

    while let Some(message) = rx.recv().await {
        match message {
            StreamMessage::Activity(event) => output.activity(&event),
            StreamMessage::Report(_) => output.success("Report ready"),
            StreamMessage::Error(e) => output.error(&e),
        }
    }

    let (result, research) = handle.await.context("Research task panicked")?;
    let run = result?;

    output.header("Summary");
    output.kv("iterations", &run.iterations.to_string());
    output.kv("termination", &run.termination.to_string());
    output.kv("findings", &research.findings.len().to_string());
    output.newline();
    println!("{}", run.report);

    Ok(())
}

fn show_config(path: &std::path::Path, config: &DeepDiveConfig, validate: bool, output: &Output) {
    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("server", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("provider", &config.provider.base_url);
    output.kv(
        "api key",
        if config.provider.api_key().is_some() {
            "set"
        } else {
            "missing"
        },
    );
    output.kv("max iterations", &config.research.max_iterations.to_string());
    output.kv("default model", &config.models.default);

    if validate {
        output.newline();
        if !path.exists() {
            output.warning("No configuration file found, defaults are in use");
        }
        match config.validate() {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                std::process::exit(1);
            }
        }
        if config.provider.api_key().is_none() {
            output.list_item(&format!(
                "set {} to enable model calls",
                config.provider.api_key_env
            ));
        }
    }
}
