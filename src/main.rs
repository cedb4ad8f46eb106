use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use speechgate::application::services::{EngineSelector, SelectorOptions};
use speechgate::domain::TranscriptionRequest;
use speechgate::infrastructure::engines::SpeechEngineFactory;
use speechgate::infrastructure::observability::{TracingConfig, init_tracing};
use speechgate::presentation::config::{Environment, Settings};
use speechgate::presentation::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let environment = match cli.environment {
        Some(env) => env,
        None => std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(|e| anyhow::anyhow!("invalid APP_ENVIRONMENT: {}", e))?,
    };
    let settings = Settings::load_from(&cli.config_dir, environment)
        .with_context(|| format!("loading settings from {}", cli.config_dir.display()))?;

    init_tracing(&TracingConfig::from_settings(&settings.logging))?;
    tracing::info!(environment = %environment, "Configuration loaded");

    let engines = SpeechEngineFactory::create_all(&settings.selector, &settings.engines);
    let selector = EngineSelector::new(
        engines,
        SelectorOptions {
            timeout: settings.selector.timeout(),
        },
    )?;

    match cli.command {
        Command::Engines => {
            println!("{}", serde_json::to_string_pretty(&selector.descriptors())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let statuses = selector.get_all_engine_status().await;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
            let any_available = statuses.iter().any(|s| s.is_available);
            Ok(if any_available {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Transcribe {
            file,
            engine,
            language,
        } => {
            transcribe(
                &selector,
                environment,
                file,
                engine.or(settings.selector.preferred),
                language,
            )
            .await
        }
    }
}

async fn transcribe(
    selector: &EngineSelector,
    environment: Environment,
    file: std::path::PathBuf,
    preferred: Option<speechgate::domain::EngineId>,
    language: Option<String>,
) -> anyhow::Result<ExitCode> {
    let audio = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    if let Err(e) = selector.initialize(preferred).await {
        if e.is_configuration_error() {
            tracing::error!(environment = %environment, "Check engine credentials and model paths");
        }
        return Err(e.into());
    }

    let mut request = TranscriptionRequest::new(audio);
    if let Some(language) = language {
        request = request.with_language(language);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = selector.transcribe_with_cancellation(request, cancel).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
