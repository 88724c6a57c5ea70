use anyhow::Context;
use clap::{Parser, Subcommand};

use folio_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Paginated book-search proxy
#[derive(Debug, Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the resolved settings as JSON
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load Folio settings")?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings).await
        }
        Command::Settings => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    folio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        upstream = %settings.upstream.base_url,
        "folio bootstrap starting"
    );

    let mut registry = ModuleRegistry::new();
    folio_app::register_all(&mut registry, &settings).context("failed to register modules")?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = folio_http::start_server(&registry, &settings).await;

    // Modules stop even if the server failed.
    let stopped = registry.stop_all().await;
    served?;
    stopped?;

    tracing::info!("folio shut down cleanly");
    Ok(())
}
