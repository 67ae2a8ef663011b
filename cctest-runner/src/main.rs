use std::process::ExitCode;

use clap::Parser;

use cctest_chains::RpcInvokerFactory;
use cctest_core::CctestConfig;
use cctest_runner::cases;
use cctest_runner::cli::RunnerCli;
use cctest_runner::error::RunnerError;
use cctest_runner::lifecycle::{Lifecycle, spawn_signal_listener};
use cctest_runner::{logging, metrics_server};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = RunnerCli::parse();

    if cli.list {
        for case in cases::builtin() {
            println!("{:<16} {}", case.name(), case.description());
        }
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            if code == 0 {
                tracing::info!(reason = %e, "cctest stopped before the run");
            } else {
                tracing::error!(error = %e, exit_code = code, "cctest failed");
                eprintln!("cctest: {e}");
            }
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: RunnerCli) -> Result<(), RunnerError> {
    // Init
    let mut config = CctestConfig::load(&cli.config).await?;
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    config.validate()?;

    logging::init_tracing(&config.general).map_err(|e| RunnerError::Setup(format!("{e:#}")))?;
    tracing::info!(
        config = %cli.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "cctest starting"
    );

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)
            .map_err(|e| RunnerError::Setup(format!("{e:#}")))?;
    }

    let mut lifecycle = Lifecycle::from_config(config, RpcInvokerFactory::new())?;
    let signals = spawn_signal_listener(lifecycle.shutdown_token())?;

    // Constructing
    let framework = lifecycle.construct(cases::builtin()).await?;

    // Running
    let report = lifecycle.run(&framework, &cli.run_request()).await;

    // WaitingForShutdown -> Terminated
    if cli.no_wait {
        lifecycle.terminate(&framework).await;
        signals.abort();
        if report.failed() > 0 {
            return Err(RunnerError::CasesFailed {
                failed: report.failed(),
                executed: report.records.len(),
            });
        }
        return Ok(());
    }

    lifecycle.wait_for_shutdown(&framework).await;
    Ok(())
}
