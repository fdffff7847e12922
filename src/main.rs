use clap::{Parser, Subcommand};
use dcf_valuation::api::{ValueArgs, run_http_server, value_from_args};
use dcf_valuation::config::{LogLevel, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "dcf-valuation",
    version,
    about = "Discounted cash flow equity valuation (WACC, FCFF projection, terminal value)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP valuation API
    Serve {
        #[arg(long, env = "DCF_HOST")]
        host: Option<String>,
        #[arg(short, long, env = "DCF_PORT")]
        port: Option<u16>,
        #[arg(long, value_enum, ignore_case = true, env = "DCF_LOG_LEVEL")]
        log_level: Option<LogLevel>,
        /// Origin allowed by CORS; repeat for several. Any origin when omitted.
        #[arg(long = "allowed-origin", env = "DCF_ALLOWED_ORIGINS", value_delimiter = ',')]
        allowed_origins: Vec<String>,
    },
    /// Value one company and print the result as JSON
    Value(ValueArgs),
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            host,
            port,
            log_level,
            allowed_origins,
        } => {
            let config =
                match ServerConfig::new(host, port, log_level, allowed_origins) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("Configuration error: {e}");
                        std::process::exit(2);
                    }
                };
            init_tracing(config.log_level.as_filter_str());
            tracing::info!(
                host = %config.host,
                port = config.port,
                log_level = config.log_level.as_filter_str(),
                allowed_origins = ?config.allowed_origins,
                "server configuration loaded"
            );

            if let Err(e) = run_http_server(config).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Value(args) => {
            init_tracing("warn");
            let result = match value_from_args(args) {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(kind = e.kind(), "valuation failed");
                    eprintln!("Valuation error: {e}");
                    std::process::exit(1);
                }
            };
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Failed to encode result: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
