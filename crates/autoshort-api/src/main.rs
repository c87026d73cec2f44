//! autoshort service binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autoshort_gen::{
    HttpImageSynthesizer, HttpPublisher, HttpScriptGenerator, HttpTrendScout, HttpVoiceSynthesizer,
};
use autoshort_media::AssemblySettings;
use autoshort_pipeline::{
    Collaborators, FfmpegAssembler, JsonlRunLog, PipelineConfig, ProductionPipeline, Scheduler,
    SystemClock,
};

use autoshort_api::{build_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("autoshort=info".parse().unwrap())
        .add_directive("tower_http=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting autoshort");

    let api_config = ApiConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", pipeline_config);

    // Collaborator clients
    let collaborators = match build_collaborators() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build collaborator clients: {}", e);
            std::process::exit(1);
        }
    };

    let assembler = Arc::new(FfmpegAssembler::new(AssemblySettings {
        frame: pipeline_config.frame,
        encoding: pipeline_config.encoding.clone(),
        timeout_secs: pipeline_config.assembly_timeout.as_secs(),
    }));
    let run_log = Arc::new(JsonlRunLog::new(api_config.run_log_path.clone()));

    let pipeline = Arc::new(ProductionPipeline::new(
        pipeline_config.clone(),
        collaborators,
        assembler,
        run_log,
    ));

    let scheduler = Arc::new(Scheduler::new(
        pipeline_config.clone(),
        Arc::clone(&pipeline),
        Arc::new(SystemClock),
    ));

    if pipeline_config.schedule.enabled {
        scheduler.start();
    } else {
        info!("Scheduler disabled by configuration");
    }

    let state = AppState::new(api_config.clone(), pipeline, Arc::clone(&scheduler));
    let router = build_router(state);

    let addr = api_config.bind_addr();
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
        })
        .await?;

    scheduler.stop();
    info!("autoshort shutdown complete");
    Ok(())
}

fn build_collaborators() -> Result<Collaborators, autoshort_gen::GenError> {
    Ok(Collaborators {
        trends: Arc::new(HttpTrendScout::from_env()?),
        scripts: Arc::new(HttpScriptGenerator::from_env()?),
        voice: Arc::new(HttpVoiceSynthesizer::from_env()?),
        images: Arc::new(HttpImageSynthesizer::from_env()?),
        publisher: Arc::new(HttpPublisher::from_env()?),
    })
}
