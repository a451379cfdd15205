use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{str::FromStr, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voxel_relay::{
    Session, config,
    config::{Config, LogFormat},
    exchange::{InferenceExchange, SubmissionOutcome},
    form::{FormSlot, format_decimal},
    host::{AutoConsent, ConsentPrompt, LocalVolumeStore, LogProgress, LogViewer, TerminalConsent},
    schema::fetch_schema,
    transport::HttpTransport,
};

#[derive(Parser)]
#[command(name = "voxel-relay", version, about = "Send volumes to remote inference services")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the services advertised by a discovery server
    Discover {
        /// Discovery URL, overrides the configured one
        #[arg(long)]
        url: Option<String>,
    },
    /// Show the input fields a service expects
    Schema {
        #[arg(long, conflicts_with = "interface_url", required_unless_present = "interface_url")]
        service: Option<String>,
        #[arg(long)]
        interface_url: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Upload volumes and values to a service and fetch its results
    Submit {
        #[arg(long, conflicts_with = "prediction_url")]
        service: Option<String>,
        /// Prediction URL for a direct connection, defaults to `direct.url`
        #[arg(long)]
        prediction_url: Option<String>,
        /// Interface URL to build the form from when using --prediction-url
        #[arg(long, requires = "prediction_url")]
        interface_url: Option<String>,
        /// KEY=PATH binding for a volume field
        #[arg(long = "volume", value_parser = parse_assignment::<String>)]
        volumes: Vec<(String, String)>,
        /// KEY=NUMBER value for a slider field
        #[arg(long = "value", value_parser = parse_assignment::<f64>)]
        values: Vec<(String, f64)>,
        /// Skip the consent prompt
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        url: Option<String>,
    },
}

fn parse_assignment<T>(s: &str) -> std::result::Result<(String, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let value = value
        .parse()
        .map_err(|e| format!("invalid value for '{}': {}", key, e))?;
    Ok((key.to_string(), value))
}

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

/// `RUST_LOG` is taken as a full directive list; the configured level must be
/// a bare level.
fn log_filter(rust_log: Option<&str>, configured: &str) -> Result<EnvFilter> {
    match rust_log {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid RUST_LOG directives: '{}'", directives)),
        None => {
            validate_log_level(configured)?;
            EnvFilter::try_new(configured).context("Failed to build log filter")
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &config.logs.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.logs.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn build_session(config: &Config, consent: Arc<dyn ConsentPrompt>) -> Result<Session> {
    let transport = Arc::new(HttpTransport::new(&config.transport)?);
    let store = Arc::new(LocalVolumeStore::new(&config.storage.output_dir));
    let exchange = InferenceExchange::new(
        transport.clone(),
        store,
        Arc::new(LogViewer),
        consent,
        &config.storage,
    );
    Ok(Session::new(transport, exchange, config))
}

fn print_form(session: &Session) {
    if !session.description().is_empty() {
        println!("{}", session.description());
    }
    for slot in session.form().slots() {
        match slot {
            FormSlot::Volume(slot) => println!("{} Volume", slot.destination),
            FormSlot::Range(slot) => println!(
                "{} Slider [{}, {}] = {}",
                slot.destination,
                format_decimal(slot.minimum),
                format_decimal(slot.maximum),
                slot.value_text()
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Command::Discover { url } => {
            let mut session = build_session(&config, Arc::new(AutoConsent(false)))?;
            if let Some(url) = url {
                session.set_discovery_url(url);
            }
            let catalog = session.discover().await?;
            print!("{}", catalog.render());
        }
        Command::Schema {
            service,
            interface_url,
            url,
        } => {
            let mut session = build_session(&config, Arc::new(AutoConsent(false)))?;
            if let Some(interface_url) = interface_url {
                let transport = HttpTransport::new(&config.transport)?;
                let fields = fetch_schema(&transport, &interface_url).await?;
                for field in fields {
                    println!("{} {}", field.destination(), field.kind());
                }
            } else if let Some(sid) = service {
                if let Some(url) = url {
                    session.set_discovery_url(url);
                }
                session.discover().await?;
                session.select_service(&sid).await?;
                print_form(&session);
            }
        }
        Command::Submit {
            service,
            prediction_url,
            interface_url,
            volumes,
            values,
            yes,
            url,
        } => {
            let consent: Arc<dyn ConsentPrompt> = if yes {
                Arc::new(AutoConsent(true))
            } else {
                Arc::new(TerminalConsent)
            };
            let mut session = build_session(&config, consent)?;

            match (service, prediction_url, interface_url) {
                (Some(sid), _, _) => {
                    if let Some(url) = url {
                        session.set_discovery_url(url);
                    }
                    session.discover().await?;
                    session.select_service(&sid).await?;
                }
                (None, Some(prediction_url), Some(interface_url)) => {
                    session.select_endpoints(&prediction_url, &interface_url).await?;
                }
                (None, Some(prediction_url), None) => session.select_direct(prediction_url),
                (None, None, _) => session.select_direct(config.direct.url.clone()),
            }

            for (key, path) in volumes {
                session
                    .form_mut()
                    .bind_volume(&key, LocalVolumeStore::volume_at(&path))?;
            }
            for (key, value) in values {
                session.form_mut().set_value(&key, value)?;
            }

            match session.submit(Arc::new(LogProgress::default())).await? {
                SubmissionOutcome::Aborted(reason) => {
                    println!("Submission aborted: {:?}", reason);
                }
                SubmissionOutcome::Completed(report) => {
                    println!(
                        "Submission {} finished: {} artifacts, {} skipped parts, {} failed parts",
                        report.submission_id,
                        report.artifacts.len(),
                        report.skipped.len(),
                        report.failures.len()
                    );
                    for failure in &report.failures {
                        eprintln!(
                            "  part {} ({}): {}",
                            failure.index, failure.tag, failure.error
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_accepts_target_directives() {
        assert!(log_filter(Some("voxel_relay=debug,reqwest=warn"), "info").is_ok());
    }

    #[test]
    fn test_configured_level_must_be_a_level() {
        assert!(log_filter(None, "debug").is_ok());
        assert!(log_filter(None, "verbose").is_err());
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        assert!(log_filter(Some("trace"), "verbose").is_ok());
    }
}
