use hatyper::cli::run_cli;
use hatyper::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging_with_config(&LogConfig::from_env())?;
    run_cli()
}
