use ares_research::cli::output::Output;
use ares_research::cli::{Cli, Commands};
use ares_research::persistence::{JsonFilePersistence, PersistenceClient};
use ares_research::utils::toml_config::{
    ConfigError, LoggingConfig, ResearchConfig, ResearchConfigManager,
};
use ares_research::{PipelineOrchestrator, PipelineRequest, StepRegistry};
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ares_research=debug")
        } else {
            EnvFilter::new(&config.level)
        }
    });

    // Logs go to stderr so stdout stays valid JSON.
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Load the config file; `run` and `results` fall back to defaults when it
/// does not exist.
fn load_config(
    path: &Path,
    out: &Output,
    require_file: bool,
) -> Result<ResearchConfig, ConfigError> {
    match ResearchConfigManager::new(path) {
        Ok(manager) => Ok(manager.config().as_ref().clone()),
        Err(ConfigError::FileNotFound(p)) if !require_file => {
            out.warning(&format!("{} not found, using default configuration", p.display()));
            Ok(ResearchConfig::default())
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let require_file = matches!(cli.command, Commands::Config { .. });
    let config = match load_config(&cli.config, &out, require_file) {
        Ok(config) => config,
        Err(e) => {
            out.error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Run {
            topic,
            scope,
            max_sources,
            mode,
            no_conversations,
            output,
            summary,
        } => {
            let mut request: PipelineRequest = config.pipeline.request(topic);
            if let Some(scope) = scope {
                request.research_scope = scope;
            }
            if let Some(max_sources) = max_sources {
                request.max_sources = max_sources;
            }
            if let Some(mode) = mode {
                request.synthesis_mode = mode;
            }
            if no_conversations {
                request.enable_agent_conversations = false;
            }

            let orchestrator = match PipelineOrchestrator::from_config(&config) {
                Ok(orchestrator) => orchestrator,
                Err(e) => {
                    out.error(&format!("Failed to set up pipeline: {e}"));
                    return ExitCode::FAILURE;
                }
            };

            info!(version = env!("CARGO_PKG_VERSION"), "Starting ares-research");
            let result = orchestrator.execute(request).await;

            let json = match serde_json::to_string_pretty(&result) {
                Ok(json) => json,
                Err(e) => {
                    out.error(&format!("Failed to serialize result: {e}"));
                    return ExitCode::FAILURE;
                }
            };
            match output {
                Some(path) => {
                    if let Err(e) = tokio::fs::write(&path, json).await {
                        out.error(&format!("Failed to write {}: {e}", path.display()));
                        return ExitCode::FAILURE;
                    }
                    out.success(&format!("Result written to {}", path.display()));
                }
                None if !summary => println!("{json}"),
                None => {}
            }
            if summary {
                out.pipeline_summary(&result);
            }

            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Config { validate, steps } => {
            out.banner();
            out.config_summary(&config);
            if steps {
                out.step_summary(&StepRegistry::standard());
            }
            if validate {
                match config.validate() {
                    Ok(()) => out.success("Configuration is valid"),
                    Err(e) => {
                        out.error(&e.to_string());
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Results => {
            let Some(persistence) = &config.persistence else {
                out.warning("Persistence is not configured");
                out.hint("Add a [persistence] section to research.toml to save results");
                return ExitCode::SUCCESS;
            };
            let store = JsonFilePersistence::new(&persistence.dir);
            match store.list().await {
                Ok(keys) if keys.is_empty() => out.info("No saved results"),
                Ok(keys) => {
                    out.header(&format!("Saved results in {}", store.dir().display()));
                    for key in keys {
                        out.list_item(&key);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to list results");
                    out.error(&e.to_string());
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
    }
}
