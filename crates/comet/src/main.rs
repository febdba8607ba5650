use std::process::ExitCode;

use comet::app::launch;
use comet::cli::Cli;
use comet::server::LISTEN_ADDR;
use comet::CometError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();
}

/// Resolves once the process is interrupted. If the signal handler cannot
/// be installed it never resolves, and the bridge runs until killed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for interrupt");
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, CometError> {
    let cli = match Cli::parse_known() {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    init_tracing(&cli);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "comet starting");

    let server = match launch(&cli.credential_source(), LISTEN_ADDR).await {
        Ok(server) => server,
        Err(CometError::Credentials(e)) => {
            tracing::error!(error = %e, "no usable credentials, see --help");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e),
    };

    server.run_until(interrupted()).await?;
    tracing::info!("interrupted, exiting");
    Ok(ExitCode::from(1))
}
