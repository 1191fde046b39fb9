//! Entry point for the `ts-catalog` command.

use std::io::Write;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use ts_catalog::cli::{
    Cli,
    run,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_from(std::env::args_os().skip(1).collect()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = writeln!(std::io::stderr().lock(), "{e}");
            return ExitCode::from(2);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_target(false).init();

    let mut stdout = std::io::stdout().lock();
    match run(cli, &mut stdout).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
