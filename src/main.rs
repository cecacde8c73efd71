use clap::Parser;
use fincalc::api::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fincalc=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = fincalc::api::run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
